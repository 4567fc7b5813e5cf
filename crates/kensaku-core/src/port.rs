//! Ports
//!
//! Seams between the state machine and the outside world: the view and
//! the address bar on the output side, result fetchers and the
//! recommendation lookup on the input side.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Result;
use crate::event::{EventKind, SessionEvent};
use crate::intent::SearchIntent;
use crate::panel::Recommendations;
use crate::projector::RenderInstruction;
use crate::session::SessionId;

/// Channel fetchers emit events into
pub type EventSink = mpsc::UnboundedSender<SessionEvent>;

/// Rendering surface
pub trait ViewPort {
    /// Apply one render instruction
    fn apply(&mut self, instruction: &RenderInstruction);

    /// Copy text to the clipboard; returns `false` if unsupported
    fn copy_to_clipboard(&mut self, _text: &str) -> bool {
        false
    }
}

/// Address bar and session history
pub trait HistoryPort {
    /// Push a URL without reloading
    fn push(&mut self, url: &Url);

    /// URL currently shown
    fn current(&self) -> Url;
}

/// In-memory history, for hosts without an address bar
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<Url>,
}

impl MemoryHistory {
    /// Create a history starting at `initial`
    #[must_use]
    pub fn new(initial: Url) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    /// Every URL shown, oldest first
    #[must_use]
    pub fn entries(&self) -> &[Url] {
        &self.entries
    }
}

impl HistoryPort for MemoryHistory {
    fn push(&mut self, url: &Url) {
        self.entries.push(url.clone());
    }

    fn current(&self) -> Url {
        // entries is never empty
        self.entries[self.entries.len() - 1].clone()
    }
}

/// Produces events for one session
///
/// Implementations emit `Start` first and exactly one terminal event,
/// unless `cancel` fires, after which they emit nothing. Failures are
/// reported as `Error` events, never returned.
#[async_trait]
pub trait ResultFetcher: Send + Sync {
    /// Fetch results for an intent
    async fn run(
        &self,
        session_id: SessionId,
        intent: SearchIntent,
        sink: EventSink,
        cancel: CancellationToken,
    );
}

/// Looks up a collaborator's top items
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    /// Top items credited to `name`
    async fn top_items(&self, name: &str) -> Result<Recommendations>;
}

/// Session-tagged emitter handed to fetcher implementations
///
/// Refuses to emit once the session's token has fired.
#[derive(Debug, Clone)]
pub struct SessionEmitter {
    session_id: SessionId,
    sink: EventSink,
    cancel: CancellationToken,
}

impl SessionEmitter {
    /// Create an emitter
    #[must_use]
    pub fn new(session_id: SessionId, sink: EventSink, cancel: CancellationToken) -> Self {
        Self {
            session_id,
            sink,
            cancel,
        }
    }

    /// Session being served
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Emit an event; returns `false` if cancelled or the loop is gone
    pub fn emit(&self, kind: EventKind) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.sink
            .send(SessionEvent::new(self.session_id, kind))
            .is_ok()
    }

    /// Check if the session was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for cancellation
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Completion, Failure};

    #[test]
    fn test_memory_history() {
        let mut history = MemoryHistory::new(Url::parse("http://localhost/").unwrap());
        history.push(&Url::parse("http://localhost/search?q=x").unwrap());
        assert_eq!(history.entries().len(), 2);
        assert_eq!(history.current().path(), "/search");
    }

    #[test]
    fn test_emitter_tags_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let emitter = SessionEmitter::new(SessionId::new(7), tx, CancellationToken::new());
        assert!(emitter.emit(EventKind::Error(Failure::transport("down"))));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.session_id, SessionId::new(7));
    }

    #[test]
    fn test_emitter_is_silent_after_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let emitter = SessionEmitter::new(SessionId::new(1), tx, token.clone());

        token.cancel();
        assert!(emitter.is_cancelled());
        assert!(!emitter.emit(EventKind::Complete(Completion::Streamed { total_count: 0 })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mock_recommendation_source() {
        let mut source = MockRecommendationSource::new();
        source
            .expect_top_items()
            .returning(|_| Err(crate::error::Error::recommendations("offline")));
        let result = source.top_items("Aoi").await;
        assert!(result.is_err());
    }
}
