use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use yt_agent_client::ToolInvoker;

use crate::session::SessionStore;

const MAX_TELEMETRY_ENTRIES: usize = 200;

/// Page sizes requested from the backend per listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueSettings {
    pub search_page_size: u32,
    pub trending_page_size: u32,
    pub channel_page_size: u32,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            search_page_size: 10,
            trending_page_size: 12,
            channel_page_size: 10,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub invoker: Arc<dyn ToolInvoker>,
    pub sessions: Arc<SessionStore>,
    pub settings: DialogueSettings,
    telemetry_log: Arc<Mutex<Vec<TelemetryEntry>>>,
}

impl AppContext {
    pub fn new(invoker: Arc<dyn ToolInvoker>, sessions: SessionStore) -> Self {
        Self::with_settings(invoker, sessions, DialogueSettings::default())
    }

    pub fn with_settings(
        invoker: Arc<dyn ToolInvoker>,
        sessions: SessionStore,
        settings: DialogueSettings,
    ) -> Self {
        Self {
            invoker,
            sessions: Arc::new(sessions),
            settings,
            telemetry_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn record_telemetry(&self, entry: TelemetryEntry) {
        let mut guard = self.telemetry_log.lock().await;
        guard.push(entry);
        if guard.len() > MAX_TELEMETRY_ENTRIES {
            let overflow = guard.len() - MAX_TELEMETRY_ENTRIES;
            guard.drain(0..overflow);
        }
    }

    pub async fn telemetry_snapshot(&self) -> Vec<TelemetryEntry> {
        self.telemetry_log.lock().await.clone()
    }
}

/// One remote call as seen by the executor.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEntry {
    pub tool: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub latency_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
