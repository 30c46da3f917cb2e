pub mod types;

#[doc(hidden)]
pub use serde_json;

/// Builds [`types::Arguments`] from `"key" => value` pairs.
#[macro_export]
macro_rules! arguments {
    ($($key:literal => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::types::Arguments::new();
        $(map.insert($key.to_string(), $crate::serde_json::Value::from($value));)*
        map
    }};
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{AUTHORIZATION, COOKIE},
    Client, StatusCode,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::types::{RemoteTool, ToolCall, ToolResult};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const CALL_PATH: &str = "mcp/call";
const TOOLS_PATH: &str = "mcp/tools";

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("unexpected status code: {0}")]
    Status(StatusCode),
    #[error("failed to decode backend response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
            user_agent: "YtAgent/1.0".to_string(),
        }
    }
}

/// Gateway to the remote tool backend.
///
/// `invoke` never fails by signature: transport and decoding problems are
/// folded into `ToolResult { success: false, .. }` so callers branch on a
/// single failure shape.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, call: ToolCall) -> ToolResult;

    async fn list_tools(&self) -> Result<Vec<RemoteTool>, ClientError>;
}

#[derive(Debug, Deserialize)]
struct ToolCatalogue {
    #[serde(default)]
    tools: Vec<RemoteTool>,
}

#[derive(Debug, Clone)]
pub struct McpClient {
    http: Client,
    config: ClientConfig,
}

impl McpClient {
    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|err| ClientError::Http(err.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn new() -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::default())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_call(&self, call: &ToolCall) -> Result<ToolResult, ClientError> {
        let url = self.endpoint(CALL_PATH);
        let mut request = self.http.post(&url).json(&call.body());
        if let Some(token) = &call.credential.bearer_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = &call.credential.cookie {
            request = request.header(COOKIE, cookie.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;

        // Declines arrive as non-2xx with a regular `{success: false}` body.
        match serde_json::from_slice::<ToolResult>(&bytes) {
            Ok(result) => Ok(result),
            Err(_) if !status.is_success() => Err(ClientError::Status(status)),
            Err(err) => Err(ClientError::Decode(err.to_string())),
        }
    }
}

#[async_trait]
impl ToolInvoker for McpClient {
    #[instrument(
        name = "yt_agent_client.invoke",
        skip(self, call),
        fields(tool = %call.operation, authenticated = !call.credential.is_empty())
    )]
    async fn invoke(&self, call: ToolCall) -> ToolResult {
        match self.send_call(&call).await {
            Ok(result) => {
                debug!(target: "yt_agent_client", success = result.success, "backend replied");
                result
            }
            Err(error) => {
                warn!(target: "yt_agent_client", error = %error, "backend call failed");
                ToolResult::failure(error.to_string())
            }
        }
    }

    #[instrument(name = "yt_agent_client.list_tools", skip(self))]
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, ClientError> {
        let url = self.endpoint(TOOLS_PATH);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;
        if !response.status().is_success() {
            warn!(target: "yt_agent_client", status = %response.status(), url, "tool catalogue request failed");
            return Err(ClientError::Status(response.status()));
        }
        let catalogue = response
            .json::<ToolCatalogue>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(catalogue.tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = McpClient::with_config(ClientConfig {
            base_url: "http://backend.local/".to_string(),
            ..ClientConfig::default()
        })
        .expect("client builds");
        assert_eq!(client.endpoint(CALL_PATH), "http://backend.local/mcp/call");
        assert_eq!(client.base_url(), "http://backend.local/");
    }
}
