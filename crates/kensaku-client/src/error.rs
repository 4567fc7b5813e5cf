//! Error types for kensaku-client
//!
//! Transport-level errors for the REST and WebSocket clients. Fetchers do
//! not return these; they convert them into terminal failure events with
//! [`Error::to_failure`].

use kensaku_core::Failure;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Client error type
#[derive(Debug, Error)]
pub enum Error {
    /// The backend answered with a non-success status
    #[error("API error: HTTP {status} ({message})")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Detail reported by the backend
        message: String,
    },

    /// The backend reported a failure inside the stream
    #[error("{0}")]
    Server(String),

    /// Network unreachable or request failed in flight
    #[error("transport error: {0}")]
    Transport(String),

    /// The stream closed without a terminal message
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// A message did not follow the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Response body could not be decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A URL could not be built
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Create a transport error
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a connection-lost error
    #[must_use]
    pub fn connection_lost(msg: impl Into<String>) -> Self {
        Self::ConnectionLost(msg.into())
    }

    /// Create a rejection
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Check if re-submitting the same search may succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::ConnectionLost(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::Server(_) | Self::Protocol(_) | Self::Serialization(_) | Self::InvalidUrl(_) => {
                false
            }
        }
    }

    /// Get error code for logs
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "rejected",
            Self::Server(_) => "server_error",
            Self::Transport(_) => "transport",
            Self::ConnectionLost(_) => "connection_lost",
            Self::Protocol(_) => "protocol_error",
            Self::Serialization(_) => "serialization_error",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }

    /// Convert into the failure event shown to the user
    #[must_use]
    pub fn to_failure(&self) -> Failure {
        match self {
            Self::Rejected { status, .. } => Failure::rejected(Some(*status), self.to_string()),
            Self::Server(message) => Failure::rejected(None, message.clone()),
            Self::ConnectionLost(_) => Failure::connection_lost(self.to_string()),
            Self::Transport(_) | Self::Protocol(_) | Self::Serialization(_) | Self::InvalidUrl(_) => {
                Failure::transport(self.to_string())
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::rejected(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return Self::Serialization(err.to_string());
        }
        Self::Transport(err.to_string())
    }
}

impl From<tungstenite::Error> for Error {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Http(response) => {
                let status = response.status();
                let message = status
                    .canonical_reason()
                    .unwrap_or("handshake rejected")
                    .to_string();
                Self::rejected(status.as_u16(), message)
            }
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::connection_lost("connection closed")
            }
            tungstenite::Error::Protocol(err) => Self::connection_lost(err.to_string()),
            tungstenite::Error::Url(err) => Self::InvalidUrl(err.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;
