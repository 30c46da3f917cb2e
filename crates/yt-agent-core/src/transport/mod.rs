use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use yt_agent_client::types::Credential;

use crate::dialogue::{Orchestrator, DEFAULT_SESSION_ID};

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const SERVER_ERROR: i32 = -32000;

/// Line-delimited JSON-RPC over stdin/stdout until stdin closes.
pub async fn serve_stdio(orchestrator: Orchestrator) -> Result<()> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut writer = io::stdout();

    let mut buffer = String::new();
    loop {
        buffer.clear();
        let bytes = reader.read_line(&mut buffer).await?;
        if bytes == 0 {
            info!(target: "yt_agent_transport", "STDIO closed; shutting down");
            break;
        }
        if buffer.trim().is_empty() {
            continue;
        }

        debug!(target: "yt_agent_transport", request = buffer.trim());
        let maybe_response = match serde_json::from_str::<RpcRequest>(&buffer) {
            Ok(request) => handle_request(&orchestrator, request).await,
            Err(error) => {
                warn!(target: "yt_agent_transport", error = %error, "Failed to parse request");
                Some(RpcResponse::error(None, PARSE_ERROR, "Parse error"))
            }
        };

        if let Some(response) = maybe_response {
            let payload = serde_json::to_string(&response)?;
            writer.write_all(payload.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    code: i32,
    message: String,
}

impl RpcResponse {
    fn result(id: Option<Value>, value: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(value),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatParams {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    credential: Credential,
}

#[derive(Debug, Deserialize)]
struct SessionParams {
    #[serde(default)]
    session_id: Option<String>,
}

fn session_key(session_id: Option<String>) -> String {
    session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

/// Answers one request; notifications (no `id`) produce no response.
pub async fn handle_request(orchestrator: &Orchestrator, request: RpcRequest) -> Option<RpcResponse> {
    let method = request.method.as_str();
    let Some(id) = request.id else {
        match method {
            "notifications/initialized" => {
                info!(target: "yt_agent_transport", "Client signaled initialized");
            }
            other => {
                debug!(
                    target: "yt_agent_transport",
                    method = other,
                    "Ignoring notification without handler"
                );
            }
        }
        return None;
    };
    let params = request.params.unwrap_or_else(|| json!({}));
    let context = orchestrator.context();

    let response = match method {
        "initialize" => RpcResponse::result(
            Some(id),
            json!({
                "protocolVersion": "0.1.0",
                "serverInfo": {
                    "name": "yt-agent",
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "capabilities": {
                    "chat": {},
                    "sessions": {}
                }
            }),
        ),
        "chat" => match serde_json::from_value::<ChatParams>(params) {
            Ok(chat) => {
                let key = session_key(chat.session_id);
                let envelope = orchestrator
                    .handle(&chat.message, &key, &chat.credential)
                    .await;
                match serde_json::to_value(envelope) {
                    Ok(value) => RpcResponse::result(Some(id), value),
                    Err(error) => RpcResponse::error(Some(id), SERVER_ERROR, error.to_string()),
                }
            }
            Err(error) => RpcResponse::error(
                Some(id),
                INVALID_PARAMS,
                format!("Invalid chat params: {error}"),
            ),
        },
        "session/clear" => match serde_json::from_value::<SessionParams>(params) {
            Ok(params) => {
                let key = session_key(params.session_id);
                let removed = context.sessions.remove(&key);
                RpcResponse::result(Some(id), json!({ "session_id": key, "removed": removed }))
            }
            Err(error) => RpcResponse::error(
                Some(id),
                INVALID_PARAMS,
                format!("Invalid session params: {error}"),
            ),
        },
        "sessions/evict" => {
            let evicted = context.sessions.evict_expired();
            RpcResponse::result(Some(id), json!({ "evicted": evicted }))
        }
        "sessions/stats" => RpcResponse::result(
            Some(id),
            json!({
                "stats": context.sessions.stats(),
                "ttl_secs": context.sessions.ttl().whole_seconds(),
                "capacity": context.sessions.capacity(),
            }),
        ),
        "tools/list" => match context.invoker.list_tools().await {
            Ok(tools) => {
                let total_count = tools.len();
                RpcResponse::result(Some(id), json!({ "tools": tools, "total_count": total_count }))
            }
            Err(error) => RpcResponse::error(Some(id), SERVER_ERROR, error.to_string()),
        },
        "telemetry" => {
            let entries = context.telemetry_snapshot().await;
            match serde_json::to_value(entries) {
                Ok(value) => RpcResponse::result(Some(id), json!({ "entries": value })),
                Err(error) => RpcResponse::error(Some(id), SERVER_ERROR, error.to_string()),
            }
        }
        other => RpcResponse::error(
            Some(id),
            METHOD_NOT_FOUND,
            format!("Unknown method: {other}"),
        ),
    };
    Some(response)
}
