//! Per-message handling: classify, resolve entities, call the backend,
//! rank, and remember what was shown.

use std::{panic::AssertUnwindSafe, sync::Arc};

use anyhow::Result;
use futures::FutureExt;
use thiserror::Error;
use tracing::{error, info};
use yt_agent_client::types::{Credential, ResultItem};

use crate::{
    executor::RemoteExecutor,
    intent::{self, Intent},
    session::Session,
    state::AppContext,
};

mod actions;
mod listing;
pub mod response;

pub use response::{ReplyKind, ResponseEnvelope, ResultPayload};

pub const DEFAULT_SESSION_ID: &str = "default";
const GENERIC_ERROR: &str = "⚠ Error occurred";

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("ranking returned nothing for a non-empty result set")]
    EmptyRanking,
}

/// Everything a handler needs for one message. The session guard is held for
/// the whole turn, so a conversation never has two writers.
pub(crate) struct Turn<'a> {
    pub message: &'a str,
    pub credential: &'a Credential,
    pub session: &'a mut Session,
}

#[derive(Clone)]
pub struct Orchestrator {
    context: Arc<AppContext>,
    executor: RemoteExecutor,
}

impl Orchestrator {
    pub fn new(context: Arc<AppContext>) -> Self {
        let executor = RemoteExecutor::builder(context.clone()).build();
        Self { context, executor }
    }

    pub fn with_executor(executor: RemoteExecutor) -> Self {
        Self {
            context: executor.context(),
            executor,
        }
    }

    pub fn context(&self) -> Arc<AppContext> {
        self.context.clone()
    }

    /// Never fails: internal errors and panics become a generic error reply.
    pub async fn handle(
        &self,
        message: &str,
        session_key: &str,
        credential: &Credential,
    ) -> ResponseEnvelope {
        let outcome = AssertUnwindSafe(self.dispatch(message, session_key, credential))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(source)) => {
                error!(
                    target: "yt_agent_core",
                    session = session_key,
                    error = %source,
                    "message handling failed"
                );
                ResponseEnvelope::error(GENERIC_ERROR)
            }
            Err(_) => {
                error!(
                    target: "yt_agent_core",
                    session = session_key,
                    "message handler panicked"
                );
                ResponseEnvelope::error(GENERIC_ERROR)
            }
        }
    }

    async fn dispatch(
        &self,
        message: &str,
        session_key: &str,
        credential: &Credential,
    ) -> Result<ResponseEnvelope> {
        let intent = intent::classify(message);
        info!(
            target: "yt_agent_core",
            session = session_key,
            intent = %intent,
            "handling message"
        );

        let handle = self.context.sessions.acquire(session_key);
        let mut session = handle.lock().await;
        let mut turn = Turn {
            message,
            credential,
            session: &mut session,
        };

        let envelope = match intent {
            Intent::More => self.more(&mut turn).await,
            Intent::Like | Intent::Unlike | Intent::Dislike => {
                self.rate_video(intent, &mut turn).await
            }
            Intent::Comment => self.comment(&mut turn).await,
            Intent::Subscribe => self.subscribe(&mut turn).await,
            Intent::Unsubscribe => self.unsubscribe(&mut turn).await,
            Intent::Trending => self.trending(&mut turn).await,
            Intent::TopChannels => self.top_channels(&mut turn).await,
            Intent::Recommend => self.recommend(&mut turn)?,
            Intent::Search => self.search(&mut turn).await,
        };
        Ok(envelope)
    }
}

pub(crate) fn item_ids(items: &[ResultItem]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}
