//! Session events
//!
//! Fetchers report progress as events tagged with the session that
//! produced them. Every run ends in exactly one terminal event
//! (`Complete` or `Error`) unless it is cancelled first.

use serde::{Deserialize, Serialize};

use crate::item::ResultItem;
use crate::panel::Recommendations;
use crate::session::SessionId;

/// An event produced on behalf of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Session this event belongs to
    pub session_id: SessionId,
    /// Event payload
    pub kind: EventKind,
}

impl SessionEvent {
    /// Create a new event
    #[must_use]
    pub fn new(session_id: SessionId, kind: EventKind) -> Self {
        Self { session_id, kind }
    }

    /// Check if this event ends the session's fetch
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    /// The fetch has been issued
    Start(FetchKind),
    /// The item a similarity stream is anchored on
    Source(SourceMeta),
    /// One streamed result, in display order
    Partial(ResultItem),
    /// The fetch finished successfully
    Complete(Completion),
    /// The fetch failed
    Error(Failure),
    /// Follow-up lookup for a dominant collaborator finished
    ///
    /// `None` means the lookup failed; the sidebar is left as-is.
    Recommendations(Option<Recommendations>),
}

impl EventKind {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Source(_) => "source",
            Self::Partial(_) => "partial",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
            Self::Recommendations(_) => "recommendations",
        }
    }

    /// Check if this is a terminal event
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of fetch a `Start` announces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchKind {
    /// Single request, single response
    OneShot {
        /// Query text
        query: String,
    },
    /// Similarity stream
    Streaming {
        /// Identifier the stream is anchored on
        identifier: String,
    },
}

/// Metadata of the item a similarity search is anchored on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMeta {
    /// Catalogue identifier
    pub identifier: String,
    /// Title
    pub title: String,
    /// Cover image URL
    pub image: Option<String>,
    /// Title in the original language
    pub native_title: Option<String>,
}

impl SourceMeta {
    /// Create source metadata
    #[must_use]
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            image: None,
            native_title: None,
        }
    }

    /// Set the image
    #[must_use]
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }
}

/// Successful completion payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completion {
    /// All results in one batch
    Batch {
        /// Results in backend order
        items: Vec<ResultItem>,
        /// Response metadata
        meta: BatchMeta,
    },
    /// End of a stream
    Streamed {
        /// Total match count reported by the server
        total_count: usize,
    },
}

/// Metadata accompanying a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMeta {
    /// Search mode label reported by the backend
    pub mode_label: String,
    /// Anchor item, for similarity snapshots
    pub source: Option<SourceMeta>,
}

impl BatchMeta {
    /// Create metadata with a mode label
    #[must_use]
    pub fn new(mode_label: impl Into<String>) -> Self {
        Self {
            mode_label: mode_label.into(),
            source: None,
        }
    }
}

/// Failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Network unreachable, dropped, or unreadable response
    Transport,
    /// The backend refused the request
    Rejected {
        /// HTTP status, when one was received
        status: Option<u16>,
    },
    /// The stream closed without a terminal message
    ConnectionLost,
}

impl FailureKind {
    /// Get the failure code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Rejected { .. } => "rejected",
            Self::ConnectionLost => "connection-lost",
        }
    }
}

/// A fetch failure, shown to the user verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Category
    pub kind: FailureKind,
    /// User-facing message
    pub message: String,
}

impl Failure {
    /// Transport failure
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
        }
    }

    /// Rejection by the backend
    #[must_use]
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rejected { status },
            message: message.into(),
        }
    }

    /// Stream closed early
    #[must_use]
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ConnectionLost,
            message: message.into(),
        }
    }

    /// Get the failure code
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}
