//! Error types for kensaku-core
//!
//! Fetch and stream failures never surface here: fetchers turn them into
//! terminal [`crate::event::Failure`] events. This type covers intent
//! parsing, URL handling, configuration and follow-up lookups.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Query text was empty after trimming
    #[error("empty query")]
    EmptyQuery,

    /// Identifier query (`id:` prefix) without an identifier
    #[error("missing identifier after prefix")]
    MissingIdentifier,

    /// A URL could not be parsed or built
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A search parameter had an unusable value
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Offending value
        value: String,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Recommendation lookup failed
    #[error("recommendations unavailable: {0}")]
    Recommendations(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a recommendations error
    #[must_use]
    pub fn recommendations(msg: impl Into<String>) -> Self {
        Self::Recommendations(msg.into())
    }

    /// Create an invalid parameter error
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Get error code for logs and diagnostics
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "empty_query",
            Self::MissingIdentifier => "missing_identifier",
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::Configuration(_) => "configuration_error",
            Self::Recommendations(_) => "recommendations_unavailable",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
