use std::sync::Arc;

use anyhow::{Context, Result};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use yt_agent_client::{ClientConfig, McpClient, ToolInvoker};

pub mod dialogue;
pub mod executor;
pub mod extract;
pub mod intent;
pub mod ranking;
pub mod session;
pub mod state;
pub mod transport;

use dialogue::Orchestrator;
use session::SessionStore;
use state::{AppContext, DialogueSettings};

/// Configuration inputs required to bootstrap the conversational core.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Where and how the tool backend is reached.
    pub client: ClientConfig,
    /// Idle time after which a conversation is forgotten.
    pub session_ttl: Duration,
    /// Upper bound on live conversations.
    pub session_capacity: usize,
    pub dialogue: DialogueSettings,
    /// Timestamp captured during process initialization for diagnostics.
    pub boot_timestamp: OffsetDateTime,
    /// How the server transports requests/responses.
    pub mode: ServerMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Stdio,
    Headless,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            session_ttl: Duration::minutes(30),
            session_capacity: 1024,
            dialogue: DialogueSettings::default(),
            boot_timestamp: OffsetDateTime::now_utc(),
            mode: ServerMode::Stdio,
        }
    }
}

#[derive(Clone)]
pub struct CoreRuntime {
    config: ServerConfig,
    orchestrator: Orchestrator,
}

impl CoreRuntime {
    pub fn orchestrator(&self) -> Orchestrator {
        self.orchestrator.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn serve(&self) -> Result<()> {
        match self.config.mode {
            ServerMode::Stdio => transport::serve_stdio(self.orchestrator.clone()).await?,
            ServerMode::Headless => {
                debug!(target: "yt_agent_core", "Headless mode: skipping transport loop");
            }
        }
        Ok(())
    }
}

pub async fn bootstrap(config: ServerConfig) -> Result<CoreRuntime> {
    let client = McpClient::with_config(config.client.clone())
        .context("failed to build backend client")?;
    debug!(
        target: "yt_agent_core",
        backend = client.base_url(),
        "McpClient initialized"
    );
    bootstrap_with_invoker(config, Arc::new(client)).await
}

/// Same as [`bootstrap`] but with a caller-supplied backend.
pub async fn bootstrap_with_invoker(
    config: ServerConfig,
    invoker: Arc<dyn ToolInvoker>,
) -> Result<CoreRuntime> {
    let sessions = SessionStore::new(config.session_ttl, config.session_capacity);
    let context = Arc::new(AppContext::with_settings(
        invoker,
        sessions,
        config.dialogue,
    ));

    info!(
        target: "yt_agent_core",
        backend = %config.client.base_url,
        session_ttl_secs = config.session_ttl.whole_seconds(),
        session_capacity = config.session_capacity,
        boot_timestamp = %config.boot_timestamp,
        mode = ?config.mode,
        "Core server starting"
    );

    let orchestrator = Orchestrator::new(context);
    Ok(CoreRuntime {
        config,
        orchestrator,
    })
}

pub async fn run(config: ServerConfig) -> Result<()> {
    bootstrap(config).await?.serve().await
}

pub use dialogue::{ReplyKind, ResponseEnvelope, DEFAULT_SESSION_ID};
pub use executor::{RemoteExecutor, RemoteExecutorBuilder};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn headless_runtime_serves_without_transport() {
        let config = ServerConfig {
            session_ttl: Duration::minutes(5),
            session_capacity: 8,
            mode: ServerMode::Headless,
            ..ServerConfig::default()
        };
        let runtime = bootstrap(config).await.expect("bootstrap succeeds");
        assert_eq!(runtime.orchestrator().context().sessions.capacity(), 8);
        assert!(runtime.serve().await.is_ok());
    }
}
