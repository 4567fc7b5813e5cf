//! One-shot fetcher
//!
//! Issues a single request and emits the whole result set as one batch.
//! Identifier intents are served from the similarity snapshot endpoint.

use async_trait::async_trait;
use kensaku_core::{
    EventKind, EventSink, FetchKind, ResultFetcher, SearchIntent, SearchMode, SessionEmitter,
    SessionId,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::http::{HttpSearchClient, SearchPage};

/// Batch fetcher backed by the REST client
#[derive(Debug, Clone)]
pub struct OneShotFetcher {
    client: HttpSearchClient,
}

impl OneShotFetcher {
    /// Create a fetcher
    #[must_use]
    pub fn new(client: HttpSearchClient) -> Self {
        Self { client }
    }

    async fn fetch(&self, intent: &SearchIntent) -> Result<SearchPage> {
        match (intent.mode(), intent.identifier()) {
            (SearchMode::ByIdentifier, Some(identifier)) => {
                self.client
                    .similar(identifier, intent.limit, intent.threshold)
                    .await
            }
            _ => {
                self.client
                    .search(intent.query_text(), intent.limit, intent.threshold)
                    .await
            }
        }
    }
}

#[async_trait]
impl ResultFetcher for OneShotFetcher {
    async fn run(
        &self,
        session_id: SessionId,
        intent: SearchIntent,
        sink: EventSink,
        cancel: CancellationToken,
    ) {
        let emitter = SessionEmitter::new(session_id, sink, cancel);
        emitter.emit(EventKind::Start(FetchKind::OneShot {
            query: intent.query_text().to_string(),
        }));

        let result = tokio::select! {
            _ = emitter.cancelled() => {
                debug!(session_id = %session_id, "One-shot fetch cancelled");
                return;
            }
            result = self.fetch(&intent) => result,
        };

        match result {
            Ok(page) => {
                info!(
                    session_id = %session_id,
                    count = page.items.len(),
                    mode = %page.mode,
                    "Batch received"
                );
                emitter.emit(EventKind::Complete(page.into_completion()));
            }
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    code = err.code(),
                    recoverable = err.is_recoverable(),
                    error = %err,
                    "Batch fetch failed"
                );
                emitter.emit(EventKind::Error(err.to_failure()));
            }
        }
    }
}
