//! Search intents
//!
//! A search intent is what the user asked for: query text plus the
//! limit and threshold in effect when the search was issued.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reserved query prefix selecting deep-similarity mode
pub const IDENTIFIER_PREFIX: &str = "id:";

/// How an intent is fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Free-text search over the REST endpoint
    Text,
    /// Nearest neighbours of an existing item, streamed
    ByIdentifier,
}

impl SearchMode {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::ByIdentifier => "by_identifier",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A search request
///
/// The mode is derived from the query text and cannot disagree with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIntent")]
pub struct SearchIntent {
    query_text: String,
    mode: SearchMode,
    /// Maximum number of results (`top_k`)
    pub limit: u32,
    /// Minimum score threshold
    pub threshold: f64,
}

/// Wire form of an intent; any serialized `mode` is re-derived
#[derive(Deserialize)]
struct RawIntent {
    query_text: String,
    limit: u32,
    threshold: f64,
}

impl TryFrom<RawIntent> for SearchIntent {
    type Error = Error;

    fn try_from(raw: RawIntent) -> Result<Self> {
        Self::new(raw.query_text, raw.limit, raw.threshold)
    }
}

impl SearchIntent {
    /// Build an intent from raw query text
    pub fn new(query_text: impl Into<String>, limit: u32, threshold: f64) -> Result<Self> {
        let query_text = query_text.into().trim().to_string();
        if query_text.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let mode = if has_identifier_prefix(&query_text) {
            SearchMode::ByIdentifier
        } else {
            SearchMode::Text
        };

        let intent = Self {
            query_text,
            mode,
            limit,
            threshold,
        };
        if mode == SearchMode::ByIdentifier && intent.identifier().is_none() {
            return Err(Error::MissingIdentifier);
        }
        Ok(intent)
    }

    /// Build a deep-similarity intent for an identifier
    pub fn by_identifier(identifier: &str, limit: u32, threshold: f64) -> Result<Self> {
        Self::new(format!("{IDENTIFIER_PREFIX}{}", identifier.trim()), limit, threshold)
    }

    /// Query text as typed (trimmed)
    #[must_use]
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// Search mode
    #[must_use]
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Identifier for deep-similarity intents
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        if self.mode != SearchMode::ByIdentifier {
            return None;
        }
        self.query_text
            .get(IDENTIFIER_PREFIX.len()..)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Check for the `id:` prefix, ASCII case-insensitively
#[must_use]
pub fn has_identifier_prefix(query: &str) -> bool {
    query
        .get(..IDENTIFIER_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(IDENTIFIER_PREFIX))
}
