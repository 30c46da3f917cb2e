//! Rule-based intent classification.
//!
//! Rules are kept as an ordered table of `(intent, patterns)` pairs; the first
//! group with a matching pattern wins. Groups overlap on purpose ("dislike"
//! contains "like", "best tech channels" contains "best"), so the table order
//! is the priority order.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    More,
    Unlike,
    Dislike,
    Like,
    Comment,
    Unsubscribe,
    Subscribe,
    Trending,
    TopChannels,
    Recommend,
    Search,
}

impl Intent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::More => "more",
            Self::Unlike => "unlike",
            Self::Dislike => "dislike",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Unsubscribe => "unsubscribe",
            Self::Subscribe => "subscribe",
            Self::Trending => "trending",
            Self::TopChannels => "top_channels",
            Self::Recommend => "recommend",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct IntentRule {
    pub intent: Intent,
    patterns: Vec<Regex>,
}

impl IntentRule {
    fn new(intent: Intent, patterns: &[&str]) -> Self {
        Self {
            intent,
            patterns: patterns
                .iter()
                .map(|pattern| Regex::new(pattern).unwrap())
                .collect(),
        }
    }

    pub fn matches(&self, normalized: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(normalized))
    }
}

/// Evaluation order. `Search` has no rule; it is the fallback.
static RULES: Lazy<Vec<IntentRule>> = Lazy::new(|| {
    vec![
        IntentRule::new(
            Intent::More,
            &[r"^(more|some more|show more|load more|next|next page)$"],
        ),
        IntentRule::new(
            Intent::Unlike,
            &[r"^unlike\b", r"remove\s+like", r"take.*like\s*off"],
        ),
        IntentRule::new(
            Intent::Dislike,
            &[
                r"^dislike\b",
                r"thumbs\s*down",
                r"hate\s+(this|it)",
                r"give.*dislike",
            ],
        ),
        IntentRule::new(
            Intent::Like,
            &[
                r"^like\b",
                r"(^|\s)like\s+[a-z0-9_-]{11}",
                r"please\s+like",
                r"pls\s+like",
                r"can (u|you).*like",
                r"give.*like",
                r"hit.*like",
                r"thumbs\s*up",
                r"\blove (this|it)\b",
                r"^[a-z0-9_-]{11}\s+like$",
            ],
        ),
        IntentRule::new(
            Intent::Comment,
            &[
                r"^comment\b",
                r"leave (a )?comment",
                r"post (a )?comment",
                r"write.*comment",
                r"add.*comment",
                r"can (u|you).*comment",
                r"^[a-z0-9_-]{11}\s+comment",
            ],
        ),
        IntentRule::new(
            Intent::Unsubscribe,
            &[
                r"^unsub",
                r"unsubscribe",
                r"stop following",
                r"remove subscription",
            ],
        ),
        IntentRule::new(
            Intent::Subscribe,
            &[
                r"^subscribe\b",
                r"please\s+subscribe",
                r"can (u|you).*subscribe",
                r"follow this channel",
                r"sub to",
                r"^[a-z0-9_-]{24}\s+subscribe$",
            ],
        ),
        IntentRule::new(Intent::Trending, &[r"trending|popular|viral"]),
        IntentRule::new(
            Intent::TopChannels,
            &[
                r"best .*channels?",
                r"top .*channels?",
                r"recommend .*channels?",
            ],
        ),
        IntentRule::new(Intent::Recommend, &[r"best|top|recommend"]),
    ]
});

/// The ordered rule table, exposed for per-rule inspection.
pub fn rules() -> &'static [IntentRule] {
    &RULES
}

/// Maps a message to exactly one intent. Total: falls back to `Search`.
pub fn classify(text: &str) -> Intent {
    let normalized = text.trim().to_lowercase();
    rules()
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map_or(Intent::Search, |rule| rule.intent)
}
