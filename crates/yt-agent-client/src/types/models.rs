use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Length of a YouTube video identifier.
pub const VIDEO_ID_LEN: usize = 11;
/// Length of a YouTube channel identifier (`UC` + 22).
pub const CHANNEL_ID_LEN: usize = 24;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Named arguments of one tool call.
pub type Arguments = Map<String, Value>;

/// Caller identity forwarded to the backend exactly as it arrived.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

impl Credential {
    pub fn new(bearer_token: Option<String>, cookie: Option<String>) -> Self {
        Self {
            bearer_token: bearer_token.filter(|value| !value.is_empty()),
            cookie: cookie.filter(|value| !value.is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bearer_token.is_none() && self.cookie.is_none()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Remote operations understood by the tool backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SearchVideos,
    LikeVideo,
    UnlikeVideo,
    DislikeVideo,
    CommentOnVideo,
    SearchChannels,
    SubscribeChannel,
    MySubscriptions,
    UnsubscribeChannel,
    TrendingVideos,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchVideos => "search_videos",
            Self::LikeVideo => "like_video",
            Self::UnlikeVideo => "unlike_video",
            Self::DislikeVideo => "dislike_video",
            Self::CommentOnVideo => "comment_on_video",
            Self::SearchChannels => "search_channels",
            Self::SubscribeChannel => "subscribe_channel",
            Self::MySubscriptions => "my_subscriptions",
            Self::UnsubscribeChannel => "unsubscribe_channel",
            Self::TrendingVideos => "trending_videos",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against the backend.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub operation: Operation,
    pub arguments: Arguments,
    pub credential: Credential,
}

impl ToolCall {
    pub fn new(operation: Operation, arguments: Arguments, credential: Credential) -> Self {
        Self {
            operation,
            arguments,
            credential,
        }
    }

    /// Wire body; the credential travels in headers instead.
    pub fn body(&self) -> Value {
        serde_json::json!({
            "tool_name": self.operation.as_str(),
            "arguments": self.arguments,
        })
    }
}

/// Backend reply shape: `{success, data?, error?}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Raw `data.items`, empty when the payload carries none.
    pub fn raw_items(&self) -> &[Value] {
        self.data
            .as_ref()
            .and_then(|data| data.get("items"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_items(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|data| data.get("items"))
            .is_some_and(Value::is_array)
    }

    pub fn items(&self) -> Vec<ResultItem> {
        self.raw_items()
            .iter()
            .filter_map(ResultItem::from_value)
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.raw_items()
            .iter()
            .filter_map(Subscription::from_value)
            .collect()
    }

    pub fn next_page_token(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|data| data.get("nextPageToken"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    pub fn error_or_default(&self) -> &str {
        self.error
            .as_deref()
            .filter(|message| !message.is_empty())
            .unwrap_or(UNKNOWN_ERROR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Video,
    Channel,
}

impl ItemKind {
    pub fn of(id: &str) -> Self {
        if is_channel_id(id) {
            Self::Channel
        } else {
            Self::Video
        }
    }
}

/// Video or channel entry from a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl ResultItem {
    /// Parses a YouTube-shaped item. `id` is either a bare string (videos.list)
    /// or an object with `videoId`/`channelId` (search.list).
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = match value.get("id")? {
            Value::String(id) => id.clone(),
            Value::Object(map) => map
                .get("videoId")
                .or_else(|| map.get("channelId"))
                .and_then(Value::as_str)?
                .to_string(),
            _ => return None,
        };
        if id.is_empty() {
            return None;
        }

        let snippet = value.get("snippet");
        let text = |key: &str| {
            snippet
                .and_then(|snippet| snippet.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let thumbnail_url = snippet
            .and_then(|snippet| snippet.get("thumbnails"))
            .and_then(|thumbs| {
                ["high", "medium", "default"]
                    .iter()
                    .find_map(|size| thumbs.get(*size).and_then(|t| t.get("url")))
            })
            .and_then(Value::as_str)
            .map(str::to_string);
        let view_count = value
            .get("statistics")
            .and_then(|stats| stats.get("viewCount"))
            .and_then(|count| match count {
                Value::String(raw) => raw.parse::<u64>().ok(),
                Value::Number(number) => number.as_u64(),
                _ => None,
            });

        Some(Self {
            kind: ItemKind::of(&id),
            title: text("title").unwrap_or_default(),
            channel_title: text("channelTitle"),
            published_at: text("publishedAt"),
            view_count,
            thumbnail_url,
            id,
        })
    }

    pub fn watch_url(&self) -> String {
        match self.kind {
            ItemKind::Video => format!("https://www.youtube.com/watch?v={}", self.id),
            ItemKind::Channel => format!("https://www.youtube.com/channel/{}", self.id),
        }
    }
}

/// Entry of the caller's subscription list. `id` is the subscription
/// resource id, not the channel id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Subscription {
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(Value::as_str)?.to_string();
        let snippet = value.get("snippet")?;
        let channel_id = snippet
            .get("resourceId")
            .and_then(|resource| resource.get("channelId"))
            .and_then(Value::as_str)?
            .to_string();
        let title = snippet
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            id,
            channel_id,
            title,
        })
    }
}

/// Entry of the backend's tool catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "input_schema", alias = "inputSchema")]
    pub input_schema: Value,
}

pub fn is_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

pub fn is_channel_id(id: &str) -> bool {
    id.len() == CHANNEL_ID_LEN && id.starts_with("UC") && id.chars().all(is_id_char)
}
