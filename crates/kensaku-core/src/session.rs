//! Search Session Management
//!
//! The controller owns the identity of the one current session. Starting
//! a search supersedes the previous session: its status becomes
//! `Cancelled` and its cancellation token fires so the transport can
//! tear down. Events are still filtered by session id at the projector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::event::{EventKind, SessionEvent};
use crate::intent::SearchIntent;

/// Monotonic session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw id
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Issued, nothing received yet
    Pending,
    /// Results are arriving
    Streaming,
    /// Finished successfully
    Complete,
    /// Superseded or torn down
    Cancelled,
    /// Finished with an error
    Failed,
}

impl SessionStatus {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Streaming => "streaming",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    /// Check if the session may still produce events
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Streaming)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logical search attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier
    pub id: SessionId,
    /// What was searched for
    pub intent: SearchIntent,
    /// Current status
    pub status: SessionStatus,
    /// When the session started
    pub started_at: DateTime<Utc>,
}

impl Session {
    fn new(id: SessionId, intent: SearchIntent) -> Self {
        Self {
            id,
            intent,
            status: SessionStatus::Pending,
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct ActiveSession {
    session: Session,
    cancel: CancellationToken,
}

/// Owner of the current session
///
/// The only writer of session status.
#[derive(Debug, Default)]
pub struct SessionController {
    counter: u64,
    current: Option<ActiveSession>,
    previous: Option<Session>,
}

impl SessionController {
    /// Create a controller with no session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session, superseding the current one
    pub fn start_search(&mut self, intent: SearchIntent) -> SessionId {
        if let Some(previous) = self.cancel_current() {
            debug!(session_id = %previous, "Superseded previous session");
        }

        self.counter += 1;
        let id = SessionId(self.counter);
        info!(
            session_id = %id,
            mode = %intent.mode(),
            query = %intent.query_text(),
            limit = intent.limit,
            threshold = intent.threshold,
            "Search session started"
        );

        self.current = Some(ActiveSession {
            session: Session::new(id, intent),
            cancel: CancellationToken::new(),
        });
        id
    }

    /// Id of the current session
    #[must_use]
    pub fn current_session_id(&self) -> Option<SessionId> {
        self.current.as_ref().map(|active| active.session.id)
    }

    /// The current session
    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref().map(|active| &active.session)
    }

    /// The most recently torn down session
    #[must_use]
    pub fn previous(&self) -> Option<&Session> {
        self.previous.as_ref()
    }

    /// Cancellation token of the current session
    #[must_use]
    pub fn current_token(&self) -> Option<CancellationToken> {
        self.current.as_ref().map(|active| active.cancel.clone())
    }

    /// Check if `id` is the current session
    #[must_use]
    pub fn is_current(&self, id: SessionId) -> bool {
        self.current_session_id() == Some(id)
    }

    /// Tear down the current session
    pub fn cancel_current(&mut self) -> Option<SessionId> {
        let mut active = self.current.take()?;
        active.cancel.cancel();
        if active.session.status.is_active() {
            active.session.status = SessionStatus::Cancelled;
            info!(session_id = %active.session.id, "Search session cancelled");
        }
        let id = active.session.id;
        self.previous = Some(active.session);
        Some(id)
    }

    /// Advance the current session's status from one of its events
    pub fn observe(&mut self, event: &SessionEvent) {
        let Some(active) = self.current.as_mut() else {
            return;
        };
        if active.session.id != event.session_id || !active.session.status.is_active() {
            return;
        }

        let next = match &event.kind {
            EventKind::Source(_) | EventKind::Partial(_) => SessionStatus::Streaming,
            EventKind::Complete(_) => SessionStatus::Complete,
            EventKind::Error(_) => SessionStatus::Failed,
            EventKind::Start(_) | EventKind::Recommendations(_) => return,
        };
        if next != active.session.status {
            debug!(
                session_id = %active.session.id,
                from = %active.session.status,
                to = %next,
                "Session status changed"
            );
            active.session.status = next;
        }
    }
}
