use std::{sync::Arc, time::Instant};

use serde_json::json;
use time::OffsetDateTime;
use tracing::{info, warn};
use yt_agent_client::types::{Arguments, Credential, Operation, ToolCall, ToolResult};

use crate::state::{AppContext, TelemetryEntry};

/// Sends tool calls through the context's invoker, timing each one and
/// keeping a bounded telemetry trail.
#[derive(Clone)]
pub struct RemoteExecutor {
    context: Arc<AppContext>,
    options: ExecutorOptions,
}

#[derive(Clone)]
struct ExecutorOptions {
    record_telemetry: bool,
}

#[derive(Clone)]
pub struct RemoteExecutorBuilder {
    context: Arc<AppContext>,
    options: ExecutorOptions,
}

impl RemoteExecutorBuilder {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            options: ExecutorOptions {
                record_telemetry: true,
            },
        }
    }

    #[must_use]
    pub fn record_telemetry(mut self, enabled: bool) -> Self {
        self.options.record_telemetry = enabled;
        self
    }

    pub fn build(self) -> RemoteExecutor {
        RemoteExecutor {
            context: self.context,
            options: self.options,
        }
    }
}

impl RemoteExecutor {
    pub fn builder(context: Arc<AppContext>) -> RemoteExecutorBuilder {
        RemoteExecutorBuilder::new(context)
    }

    pub fn context(&self) -> Arc<AppContext> {
        self.context.clone()
    }

    pub async fn call(
        &self,
        operation: Operation,
        arguments: Arguments,
        credential: &Credential,
    ) -> ToolResult {
        let call = ToolCall::new(operation, arguments, credential.clone());
        let started = Instant::now();
        let result = self.context.invoker.invoke(call).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if result.success {
            self.record_success(operation, latency_ms, &result).await;
        } else {
            self.record_failure(operation, latency_ms, result.error_or_default())
                .await;
        }
        result
    }

    async fn record_success(&self, operation: Operation, latency_ms: u64, result: &ToolResult) {
        let metadata = result
            .has_items()
            .then(|| json!({ "items": result.raw_items().len() }));
        if self.options.record_telemetry {
            self.context
                .record_telemetry(TelemetryEntry {
                    tool: operation.to_string(),
                    timestamp: OffsetDateTime::now_utc(),
                    latency_ms,
                    success: true,
                    metadata: metadata.clone(),
                    error: None,
                })
                .await;
        }
        info!(
            target: "yt_agent_executor",
            tool = %operation,
            latency_ms,
            success = true,
            metadata = metadata
                .as_ref()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "null".to_string()),
            "tool completed"
        );
    }

    async fn record_failure(&self, operation: Operation, latency_ms: u64, message: &str) {
        if self.options.record_telemetry {
            self.context
                .record_telemetry(TelemetryEntry {
                    tool: operation.to_string(),
                    timestamp: OffsetDateTime::now_utc(),
                    latency_ms,
                    success: false,
                    metadata: None,
                    error: Some(message.to_string()),
                })
                .await;
        }
        warn!(
            target: "yt_agent_executor",
            tool = %operation,
            latency_ms,
            error = %message,
            "tool failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use async_trait::async_trait;
    use yt_agent_client::{arguments, types::RemoteTool, ClientError, ToolInvoker};

    struct Echo;

    #[async_trait]
    impl ToolInvoker for Echo {
        async fn invoke(&self, call: ToolCall) -> ToolResult {
            if call.operation == Operation::LikeVideo {
                ToolResult::ok(json!({ "items": [call.arguments] }))
            } else {
                ToolResult::failure("nope")
            }
        }

        async fn list_tools(&self) -> Result<Vec<RemoteTool>, ClientError> {
            Ok(Vec::new())
        }
    }

    fn context() -> Arc<AppContext> {
        Arc::new(AppContext::new(Arc::new(Echo), SessionStore::default()))
    }

    #[tokio::test]
    async fn records_success_and_failure() {
        let context = context();
        let executor = RemoteExecutor::builder(context.clone()).build();

        let ok = executor
            .call(
                Operation::LikeVideo,
                arguments! { "video_id" => "dQw4w9WgXcQ" },
                &Credential::anonymous(),
            )
            .await;
        assert!(ok.success);
        let failed = executor
            .call(Operation::DislikeVideo, arguments! {}, &Credential::anonymous())
            .await;
        assert!(!failed.success);

        let entries = context.telemetry_snapshot().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tool, "like_video");
        assert_eq!(entries[0].metadata, Some(json!({"items": 1})));
        assert!(!entries[1].success);
        assert_eq!(entries[1].error.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn telemetry_can_be_disabled() {
        let context = context();
        let executor = RemoteExecutor::builder(context.clone())
            .record_telemetry(false)
            .build();
        executor
            .call(Operation::LikeVideo, arguments! {}, &Credential::anonymous())
            .await;
        assert!(context.telemetry_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn telemetry_log_is_bounded() {
        let context = context();
        let executor = RemoteExecutor::builder(context.clone()).build();
        for _ in 0..205 {
            executor
                .call(Operation::TrendingVideos, arguments! {}, &Credential::anonymous())
                .await;
        }
        assert_eq!(context.telemetry_snapshot().await.len(), 200);
    }
}
