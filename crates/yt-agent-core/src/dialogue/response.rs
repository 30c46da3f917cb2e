use serde::{Deserialize, Serialize};
use yt_agent_client::types::ResultItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Text,
    Action,
    ToolResult,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub items: Vec<ResultItem>,
}

/// The only thing a message handler ever returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub reply: String,
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultPayload>,
}

impl ResponseEnvelope {
    fn new(kind: ReplyKind, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            kind,
            data: None,
        }
    }

    pub fn text(reply: impl Into<String>) -> Self {
        Self::new(ReplyKind::Text, reply)
    }

    pub fn action(reply: impl Into<String>) -> Self {
        Self::new(ReplyKind::Action, reply)
    }

    pub fn error(reply: impl Into<String>) -> Self {
        Self::new(ReplyKind::Error, reply)
    }

    pub fn results(reply: impl Into<String>, items: Vec<ResultItem>) -> Self {
        Self {
            data: Some(ResultPayload { items }),
            ..Self::new(ReplyKind::ToolResult, reply)
        }
    }

    pub fn items(&self) -> &[ResultItem] {
        self.data
            .as_ref()
            .map(|payload| payload.items.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yt_agent_client::types::ItemKind;

    #[test]
    fn text_envelope_omits_data() {
        insta::assert_json_snapshot!(
            ResponseEnvelope::text("❌ Specify a video ID"),
            @r###"
        {
          "reply": "❌ Specify a video ID",
          "type": "text"
        }
        "###
        );
    }

    #[test]
    fn result_envelope_carries_items() {
        let envelope = ResponseEnvelope::results(
            "🔥 Trending videos!",
            vec![ResultItem {
                id: "dQw4w9WgXcQ".to_string(),
                kind: ItemKind::Video,
                title: "Never Gonna Give You Up".to_string(),
                channel_title: Some("Rick Astley".to_string()),
                view_count: Some(1_500_000_000),
                thumbnail_url: None,
                published_at: None,
            }],
        );
        insta::assert_json_snapshot!(envelope, @r###"
        {
          "reply": "🔥 Trending videos!",
          "type": "tool_result",
          "data": {
            "items": [
              {
                "id": "dQw4w9WgXcQ",
                "kind": "video",
                "title": "Never Gonna Give You Up",
                "channel_title": "Rick Astley",
                "view_count": 1500000000
              }
            ]
          }
        }
        "###);
        assert_eq!(envelope.items().len(), 1);
    }
}
