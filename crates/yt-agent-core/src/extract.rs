//! Entity extraction from free text. Each function is pure and independent.

use once_cell::sync::Lazy;
use regex::Regex;
use yt_agent_client::types::VIDEO_ID_LEN;

static ID_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9_-]+").unwrap());
static CHANNEL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"UC[A-Za-z0-9_-]{22}").unwrap());
static HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[A-Za-z0-9_]+").unwrap());
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+?)"|'([^']+?)'"#).unwrap());
static COMMENT_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)comment|reply").unwrap());
static ON_VIDEO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon\s+[A-Za-z0-9_-]{11}\b").unwrap());

/// First run of id characters that is exactly eleven long.
pub fn video_id(text: &str) -> Option<String> {
    ID_RUN
        .find_iter(text)
        .find(|run| run.as_str().len() == VIDEO_ID_LEN)
        .map(|run| run.as_str().to_string())
}

pub fn channel_id(text: &str) -> Option<String> {
    CHANNEL_ID.find(text).map(|m| m.as_str().to_string())
}

/// `@handle` token, including the leading `@`.
pub fn handle(text: &str) -> Option<String> {
    HANDLE.find(text).map(|m| m.as_str().to_string())
}

/// Prefers the first quoted span; otherwise everything after the first
/// "comment"/"reply", minus an "on <video id>" fragment.
pub fn comment_text(text: &str) -> Option<String> {
    if let Some(captures) = QUOTED.captures(text) {
        let quoted = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if !quoted.is_empty() {
            return Some(quoted.to_string());
        }
    }

    let keyword = COMMENT_KEYWORD.find(text)?;
    let remainder = &text[keyword.end()..];
    let cleaned = ON_VIDEO.replace(remainder, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_video_id_in_sentence() {
        assert_eq!(
            video_id("check out dQw4w9WgXcQ please").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(video_id("no id here"), None);
    }

    #[test]
    fn video_id_ignores_longer_runs() {
        let channel = format!("UC{}", "x".repeat(22));
        assert_eq!(video_id(&channel), None);
        assert_eq!(
            video_id(&format!("{channel} then abc_DEF-123")).as_deref(),
            Some("abc_DEF-123")
        );
    }

    #[test]
    fn finds_channel_id() {
        let id = format!("UC{}", "x".repeat(22));
        assert_eq!(channel_id(&id).as_deref(), Some(id.as_str()));
        assert_eq!(
            channel_id(&format!("unsubscribe {id} now")).as_deref(),
            Some(id.as_str())
        );
        assert_eq!(channel_id(&format!("UC{}", "x".repeat(21))), None);
    }

    #[test]
    fn finds_handle() {
        assert_eq!(handle("subscribe to @Fireship_dev please").as_deref(), Some("@Fireship_dev"));
        assert_eq!(handle("subscribe to fireship"), None);
    }

    #[test]
    fn comment_prefers_quotes() {
        assert_eq!(
            comment_text("comment on dQw4w9WgXcQ \"great video!\"").as_deref(),
            Some("great video!")
        );
        assert_eq!(
            comment_text("reply 'thanks a lot' on it").as_deref(),
            Some("thanks a lot")
        );
    }

    #[test]
    fn comment_falls_back_to_remainder() {
        assert_eq!(
            comment_text("Comment nice explanation on dQw4w9WgXcQ").as_deref(),
            Some("nice explanation")
        );
        assert_eq!(
            comment_text("comment on dQw4w9WgXcQ loved it").as_deref(),
            Some("loved it")
        );
        assert_eq!(comment_text("it's a comment").as_deref(), None);
    }

    #[test]
    fn comment_missing_when_nothing_follows() {
        assert_eq!(comment_text("comment"), None);
        assert_eq!(comment_text("comment on dQw4w9WgXcQ"), None);
        assert_eq!(comment_text("hello there"), None);
    }
}
