//! Streaming fetcher
//!
//! Opens the similarity WebSocket, sends the anchor configuration and
//! forwards each server message as a session event. Matches are emitted in
//! arrival order; the stream ends with `done`, `error`, or a lost
//! connection.

use std::ops::ControlFlow;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use kensaku_core::{
    ClientConfig, Completion, EventKind, EventSink, FetchKind, ResultFetcher, SearchIntent,
    SessionEmitter, SessionId, SourceMeta,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{item_from_value, StreamMessage, StreamRequest};

/// How a stream ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    Completed(usize),
    Cancelled,
}

/// WebSocket fetcher for deep-similarity intents
#[derive(Debug, Clone)]
pub struct StreamingFetcher {
    url: Url,
}

impl StreamingFetcher {
    /// Create a fetcher for a channel URL
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Create a fetcher from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let url = config
            .similar_ws_url()
            .map_err(|err| Error::InvalidUrl(err.to_string()))?;
        Ok(Self::new(url))
    }

    /// Channel URL
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn stream(&self, emitter: &SessionEmitter, request: StreamRequest) -> Result<StreamEnd> {
        let connected = tokio::select! {
            _ = emitter.cancelled() => return Ok(StreamEnd::Cancelled),
            connected = connect_async(self.url.as_str()) => connected,
        };
        let (socket, _) = connected?;
        debug!(session_id = %emitter.session_id(), url = %self.url, "Similarity channel open");

        let (mut write, mut read) = socket.split();
        write
            .send(Message::Text(serde_json::to_string(&request)?))
            .await?;

        loop {
            let next = tokio::select! {
                _ = emitter.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(StreamEnd::Cancelled);
                }
                next = read.next() => next,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    if let ControlFlow::Break(end) = handle_text(emitter, &text)? {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(end);
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed before completion".to_string());
                    return Err(Error::connection_lost(reason));
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(Error::connection_lost(err.to_string())),
                None => return Err(Error::connection_lost("stream ended before completion")),
            }
        }
    }
}

fn handle_text(emitter: &SessionEmitter, text: &str) -> Result<ControlFlow<StreamEnd>> {
    let message = match serde_json::from_str::<StreamMessage>(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(session_id = %emitter.session_id(), error = %err, "Ignoring unreadable message");
            return Ok(ControlFlow::Continue(()));
        }
    };

    match message {
        StreamMessage::Source { data } => {
            emitter.emit(EventKind::Source(SourceMeta::from(data)));
        }
        StreamMessage::Match { data } => match item_from_value(&data, None, false) {
            Ok(item) => {
                debug!(session_id = %emitter.session_id(), identifier = item.identifier(), "Match");
                emitter.emit(EventKind::Partial(item));
            }
            Err(err) => {
                warn!(session_id = %emitter.session_id(), error = %err, "Skipping undecodable match");
            }
        },
        StreamMessage::Done { count } => {
            emitter.emit(EventKind::Complete(Completion::Streamed { total_count: count }));
            return Ok(ControlFlow::Break(StreamEnd::Completed(count)));
        }
        StreamMessage::Error { message } => return Err(Error::Server(message)),
    }
    Ok(ControlFlow::Continue(()))
}

#[async_trait]
impl ResultFetcher for StreamingFetcher {
    async fn run(
        &self,
        session_id: SessionId,
        intent: SearchIntent,
        sink: EventSink,
        cancel: CancellationToken,
    ) {
        let emitter = SessionEmitter::new(session_id, sink, cancel);
        let identifier = intent
            .identifier()
            .unwrap_or_else(|| intent.query_text())
            .to_string();
        emitter.emit(EventKind::Start(FetchKind::Streaming {
            identifier: identifier.clone(),
        }));

        let request = StreamRequest {
            dvd_id: identifier,
            top_k: intent.limit,
            threshold: intent.threshold,
        };

        match self.stream(&emitter, request).await {
            Ok(StreamEnd::Completed(count)) => {
                info!(session_id = %session_id, count, "Similarity stream complete");
            }
            Ok(StreamEnd::Cancelled) => {
                debug!(session_id = %session_id, "Similarity stream cancelled");
            }
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    code = err.code(),
                    recoverable = err.is_recoverable(),
                    error = %err,
                    "Similarity stream failed"
                );
                emitter.emit(EventKind::Error(err.to_failure()));
            }
        }
    }
}
