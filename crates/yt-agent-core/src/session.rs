//! Per-conversation memory with bounded lifetime.
//!
//! Sessions are created lazily on first reference, expire after `ttl` of
//! inactivity, and the least-recently-used one is evicted once `capacity` is
//! exceeded. Each session sits behind its own async mutex; whoever holds it is
//! the only writer for that conversation.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dashmap::DashMap;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::debug;
use yt_agent_client::types::ResultItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub last_query: Option<String>,
    pub last_result_items: Option<Vec<ResultItem>>,
    /// Ids from the most recent listing; index 0 is the "it" referent.
    pub known_ids: Vec<String>,
    pub page_cursor: Option<String>,
}

impl Session {
    pub fn latest_id(&self) -> Option<&str> {
        self.known_ids.first().map(String::as_str)
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug)]
struct SessionSlot {
    session: SessionHandle,
    last_accessed: OffsetDateTime,
}

impl SessionSlot {
    fn fresh(now: OffsetDateTime) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::default())),
            last_accessed: now,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionStats {
    hits: AtomicUsize,
    misses: AtomicUsize,
    evictions: AtomicUsize,
    entry_count: AtomicUsize,
}

impl SessionStats {
    #[inline]
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_eviction(&self, count: usize) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    fn set_entry_count(&self, count: usize) {
        self.entry_count.store(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count: self.entry_count.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatsSnapshot {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
    pub entry_count: usize,
}

#[derive(Debug)]
pub struct SessionStore {
    entries: DashMap<String, SessionSlot>,
    ttl: Duration,
    capacity: usize,
    stats: SessionStats,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
            stats: SessionStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the session for `key`, creating it (or replacing an expired
    /// one) as needed, and marks it as just used.
    pub fn acquire(&self, key: &str) -> SessionHandle {
        let now = OffsetDateTime::now_utc();
        let mut created = false;
        let mut expired = false;

        let handle = {
            let mut slot = self
                .entries
                .entry(key.to_string())
                .or_insert_with(|| {
                    created = true;
                    SessionSlot::fresh(now)
                });
            if !created && now - slot.last_accessed > self.ttl {
                *slot = SessionSlot::fresh(now);
                expired = true;
            }
            slot.last_accessed = now;
            slot.session.clone()
        };

        if created || expired {
            self.stats.record_miss();
        } else {
            self.stats.record_hit();
        }
        if expired {
            debug!(target: "yt_agent_core", session = key, "session expired; starting fresh");
            self.stats.record_eviction(1);
        }
        if created {
            self.enforce_capacity(key);
        }
        self.stats.set_entry_count(self.entries.len());
        handle
    }

    /// Copy of the current state without touching its access time.
    pub async fn snapshot(&self, key: &str) -> Option<Session> {
        let handle = {
            let slot = self.entries.get(key)?;
            if OffsetDateTime::now_utc() - slot.last_accessed > self.ttl {
                return None;
            }
            slot.session.clone()
        };
        let session = handle.lock().await;
        Some(session.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_entry_count(self.entries.len());
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.stats.set_entry_count(0);
    }

    /// Drops every session idle for longer than the TTL.
    pub fn evict_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| now - slot.last_accessed <= self.ttl);
        let after = self.entries.len();
        let evicted = before.saturating_sub(after);
        if evicted > 0 {
            self.stats.record_eviction(evicted);
        }
        self.stats.set_entry_count(after);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> SessionStatsSnapshot {
        self.stats.snapshot()
    }

    fn enforce_capacity(&self, keep: &str) {
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().last_accessed)
                .map(|entry| entry.key().clone());
            let Some(key) = oldest else { break };
            self.entries.remove(&key);
            self.stats.record_eviction(1);
            debug!(target: "yt_agent_core", session = %key, "evicted least recently used session");
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::minutes(30), 1024)
    }
}
