use tracing::debug;
use yt_agent_client::{
    arguments,
    types::{ItemKind, Operation},
};

use super::{Orchestrator, ResponseEnvelope, Turn};
use crate::{extract, intent::Intent};

struct RatingCopy {
    operation: Operation,
    missing: &'static str,
    done: &'static str,
    verb: &'static str,
}

fn rating_copy(intent: Intent) -> RatingCopy {
    match intent {
        Intent::Unlike => RatingCopy {
            operation: Operation::UnlikeVideo,
            missing: "❌ Specify a video ID",
            done: "✅ Removed like from",
            verb: "unlike",
        },
        Intent::Dislike => RatingCopy {
            operation: Operation::DislikeVideo,
            missing: "❌ Provide a video ID like: 'dislike <video_id>'",
            done: "👎 Disliked video",
            verb: "dislike",
        },
        _ => RatingCopy {
            operation: Operation::LikeVideo,
            missing: "❌ Provide a video ID like: 'like <video_id>'",
            done: "✅ Liked video",
            verb: "like",
        },
    }
}

/// Explicit id in the text, else the most recently shown one.
fn resolve_video_id(turn: &Turn<'_>) -> Option<String> {
    extract::video_id(turn.message).or_else(|| turn.session.latest_id().map(str::to_string))
}

impl Orchestrator {
    pub(super) async fn rate_video(&self, intent: Intent, turn: &mut Turn<'_>) -> ResponseEnvelope {
        let copy = rating_copy(intent);
        let Some(video_id) = resolve_video_id(turn) else {
            return ResponseEnvelope::text(copy.missing);
        };

        let result = self
            .executor
            .call(
                copy.operation,
                arguments! { "video_id" => video_id.as_str() },
                turn.credential,
            )
            .await;
        if result.success {
            ResponseEnvelope::action(format!("{} {video_id}!", copy.done))
        } else {
            ResponseEnvelope::error(format!(
                "❌ Failed to {}: {}",
                copy.verb,
                result.error_or_default()
            ))
        }
    }

    pub(super) async fn comment(&self, turn: &mut Turn<'_>) -> ResponseEnvelope {
        let Some(video_id) = resolve_video_id(turn) else {
            return ResponseEnvelope::text(
                "❌ I couldn't find any video ID. Try: comment on <video_id> \"your comment\"",
            );
        };
        let Some(text) = extract::comment_text(turn.message) else {
            return ResponseEnvelope::text(
                "❌ Please include a comment text. Example: comment on <video_id> \"nice video\"",
            );
        };

        let result = self
            .executor
            .call(
                Operation::CommentOnVideo,
                arguments! { "video_id" => video_id.as_str(), "text" => text.as_str() },
                turn.credential,
            )
            .await;
        if result.success {
            ResponseEnvelope::action(format!("✅ Comment posted on {video_id}!"))
        } else {
            ResponseEnvelope::error(format!(
                "❌ Failed to comment: {}",
                result.error_or_default()
            ))
        }
    }

    pub(super) async fn subscribe(&self, turn: &mut Turn<'_>) -> ResponseEnvelope {
        let Some(channel_id) = self.resolve_channel(turn).await else {
            return ResponseEnvelope::text(
                "❌ Could not identify the channel. Try using @handle or channel ID.",
            );
        };

        let result = self
            .executor
            .call(
                Operation::SubscribeChannel,
                arguments! { "channel_id" => channel_id.as_str() },
                turn.credential,
            )
            .await;
        if result.success {
            ResponseEnvelope::action(format!("✅ Subscribed to {channel_id}!"))
        } else {
            ResponseEnvelope::error(format!(
                "❌ Failed to subscribe: {}",
                result.error_or_default()
            ))
        }
    }

    /// Channel id from the text, else an `@handle` lookup, else a channel-name
    /// lookup on the whole message. A handle that resolves to nothing does not
    /// fall through to the name lookup.
    async fn resolve_channel(&self, turn: &Turn<'_>) -> Option<String> {
        if let Some(channel_id) = extract::channel_id(turn.message) {
            return Some(channel_id);
        }
        let query = extract::handle(turn.message).unwrap_or_else(|| turn.message.to_string());
        let result = self
            .executor
            .call(
                Operation::SearchChannels,
                arguments! { "query" => query.as_str(), "max_results" => 1 },
                turn.credential,
            )
            .await;
        if !result.success {
            debug!(target: "yt_agent_core", query = %query, "channel lookup declined");
            return None;
        }
        result
            .items()
            .into_iter()
            .find(|item| item.kind == ItemKind::Channel)
            .map(|item| item.id)
    }

    pub(super) async fn unsubscribe(&self, turn: &mut Turn<'_>) -> ResponseEnvelope {
        let Some(channel_id) = extract::channel_id(turn.message) else {
            return ResponseEnvelope::text("❌ Provide a channel ID (starts with UC...)");
        };

        let subscriptions = self
            .executor
            .call(Operation::MySubscriptions, arguments! {}, turn.credential)
            .await;
        if !subscriptions.success || !subscriptions.has_items() {
            return ResponseEnvelope::error("❌ Could not fetch subscriptions.");
        }

        // The backend unsubscribes by subscription resource id, not channel id.
        let Some(subscription) = subscriptions
            .subscriptions()
            .into_iter()
            .find(|entry| entry.channel_id == channel_id)
        else {
            return ResponseEnvelope::text(format!("ℹ️ You are not subscribed to {channel_id}."));
        };

        let result = self
            .executor
            .call(
                Operation::UnsubscribeChannel,
                arguments! { "subscription_id" => subscription.id.as_str() },
                turn.credential,
            )
            .await;
        if result.success {
            ResponseEnvelope::action(format!("✅ Unsubscribed from {channel_id}!"))
        } else {
            ResponseEnvelope::error(format!(
                "❌ Failed to unsubscribe: {}",
                result.error_or_default()
            ))
        }
    }
}
