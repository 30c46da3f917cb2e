use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use yt_agent_client::{arguments, types::Operation};

use super::{item_ids, DialogueError, Orchestrator, ResponseEnvelope, Turn};
use crate::ranking;

const TRENDING_MARKER: &str = "trending";
const DEFAULT_CHANNEL_TOPIC: &str = "technology";

static FILLER_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(videos?|show|find|search|me|about|on|please|can you)\b").unwrap()
});
static PYTHON_PROGRAMMING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)python\s+programming").unwrap());
static CHANNEL_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)best|top|recommend|channels?").unwrap());

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Search query for a free-text message: filler words removed, falling back
/// to the message itself when nothing is left.
pub fn clean_query(message: &str) -> String {
    let stripped = FILLER_WORDS.replace_all(message, " ");
    let normalized = PYTHON_PROGRAMMING.replace_all(&stripped, "python tutorial");
    let query = collapse_whitespace(&normalized);
    if query.is_empty() {
        message.trim().to_string()
    } else {
        query
    }
}

/// Topic for a channel listing, `technology` when the message has none.
pub fn channel_topic(message: &str) -> String {
    let topic = collapse_whitespace(&CHANNEL_WORDS.replace_all(message, " "));
    if topic.is_empty() {
        DEFAULT_CHANNEL_TOPIC.to_string()
    } else {
        topic
    }
}

impl Orchestrator {
    pub(super) async fn search(&self, turn: &mut Turn<'_>) -> ResponseEnvelope {
        let query = clean_query(turn.message);
        let result = self
            .executor
            .call(
                Operation::SearchVideos,
                arguments! {
                    "query" => query.as_str(),
                    "max_results" => self.context.settings.search_page_size,
                    "order" => "relevance",
                },
                turn.credential,
            )
            .await;
        if !result.success {
            return ResponseEnvelope::error(format!(
                "❌ Search failed: {}",
                result.error_or_default()
            ));
        }

        let items = ranking::rank(&result.items(), &query);
        if items.is_empty() {
            return ResponseEnvelope::text("⚠ No results found.");
        }

        let session = &mut *turn.session;
        session.last_query = Some(query.clone());
        session.known_ids = item_ids(&items);
        session.last_result_items = Some(items.clone());
        session.page_cursor = result.next_page_token();

        let hint = if session.page_cursor.is_some() {
            " Say 'more' for next page."
        } else {
            ""
        };
        ResponseEnvelope::results(
            format!("🎬 Found {} videos about \"{query}\"!{hint}", items.len()),
            items,
        )
    }

    pub(super) async fn more(&self, turn: &mut Turn<'_>) -> ResponseEnvelope {
        let Some(query) = turn.session.last_query.clone() else {
            return ResponseEnvelope::text("❌ No previous search found. Try searching first!");
        };

        let mut arguments = arguments! {
            "query" => query.as_str(),
            "max_results" => self.context.settings.search_page_size,
        };
        if let Some(cursor) = &turn.session.page_cursor {
            arguments.insert("page_token".into(), Value::from(cursor.clone()));
        }

        let result = self
            .executor
            .call(Operation::SearchVideos, arguments, turn.credential)
            .await;
        if !result.success {
            return ResponseEnvelope::error(format!(
                "❌ Could not load more videos: {}",
                result.error_or_default()
            ));
        }

        let items = ranking::rank(&result.items(), &query);
        if items.is_empty() {
            return ResponseEnvelope::text(format!("⚠ No more results for \"{query}\"."));
        }

        turn.session.page_cursor = result.next_page_token();
        turn.session.known_ids.extend(item_ids(&items));
        ResponseEnvelope::results(format!("🎬 Showing more videos for \"{query}\"!"), items)
    }

    pub(super) async fn trending(&self, turn: &mut Turn<'_>) -> ResponseEnvelope {
        let result = self
            .executor
            .call(
                Operation::TrendingVideos,
                arguments! { "max_results" => self.context.settings.trending_page_size },
                turn.credential,
            )
            .await;
        if !result.success {
            return ResponseEnvelope::error(format!(
                "❌ Could not load trending videos: {}",
                result.error_or_default()
            ));
        }

        let items = ranking::rank(&result.items(), TRENDING_MARKER);
        let session = &mut *turn.session;
        session.known_ids = item_ids(&items);
        session.last_query = Some(TRENDING_MARKER.to_string());
        session.last_result_items = Some(items.clone());
        // Trending has no continuation.
        session.page_cursor = None;

        ResponseEnvelope::results("🔥 Trending videos!", items)
    }

    pub(super) async fn top_channels(&self, turn: &mut Turn<'_>) -> ResponseEnvelope {
        let topic = channel_topic(turn.message);
        let result = self
            .executor
            .call(
                Operation::SearchChannels,
                arguments! {
                    "query" => topic.as_str(),
                    "max_results" => self.context.settings.channel_page_size,
                },
                turn.credential,
            )
            .await;
        if !result.success {
            return ResponseEnvelope::error(format!(
                "❌ Could not search channels: {}",
                result.error_or_default()
            ));
        }

        let channels = result.items();
        if channels.is_empty() {
            return ResponseEnvelope::text(format!("❌ No channels found for \"{topic}\"."));
        }
        ResponseEnvelope::results(format!("⭐ Top channels for \"{topic}\":"), channels)
    }

    pub(super) fn recommend(&self, turn: &mut Turn<'_>) -> Result<ResponseEnvelope, DialogueError> {
        let Some(items) = turn
            .session
            .last_result_items
            .as_ref()
            .filter(|items| !items.is_empty())
        else {
            return Ok(ResponseEnvelope::text("Search for videos first!"));
        };

        let query = turn.session.last_query.clone().unwrap_or_default();
        let best = ranking::best(items, &query).ok_or(DialogueError::EmptyRanking)?;
        turn.session.known_ids = vec![best.id.clone()];
        Ok(ResponseEnvelope::results(
            format!("⭐ Best video for \"{query}\"!"),
            vec![best],
        ))
    }
}
