//! Client configuration
//!
//! Deserialised from the `[client]` table of the host's configuration.
//! Every field has a default so partial tables are accepted.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the search backend (REST endpoints)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Path of the streaming similarity channel
    #[serde(default = "default_similar_ws_path")]
    pub similar_ws_path: String,
    /// Search parameter defaults and bounds
    #[serde(default)]
    pub search: SearchDefaults,
    /// Collaborator recommendation settings
    #[serde(default)]
    pub recommendations: RecommendationConfig,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_similar_ws_path() -> String {
    "/ws/similar".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            similar_ws_path: default_similar_ws_path(),
            search: SearchDefaults::default(),
            recommendations: RecommendationConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse the REST base URL
    pub fn api_base(&self) -> Result<Url> {
        Ok(Url::parse(&self.api_base_url)?)
    }

    /// WebSocket URL of the similarity channel, derived from the REST base
    pub fn similar_ws_url(&self) -> Result<Url> {
        let mut url = self.api_base()?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(Error::configuration(format!(
                    "unsupported scheme for similarity channel: {other}"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| Error::configuration("cannot switch base url to websocket scheme"))?;
        url.set_path(&self.similar_ws_path);
        url.set_query(None);
        Ok(url)
    }

    /// Check bounds and ratios
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        if self.recommendations.dominance_percent == 0 || self.recommendations.dominance_percent > 100
        {
            return Err(Error::configuration(
                "recommendations.dominance_percent must be within 1..=100",
            ));
        }
        self.api_base()?;
        Ok(())
    }
}

/// Default search parameters and their accepted bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchDefaults {
    /// Default result-count limit (`top_k`)
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Default score threshold
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Smallest accepted limit
    #[serde(default = "default_limit_min")]
    pub limit_min: u32,
    /// Largest accepted limit
    #[serde(default = "default_limit_max")]
    pub limit_max: u32,
}

fn default_limit() -> u32 {
    20
}
fn default_threshold() -> f64 {
    0.65
}
fn default_limit_min() -> u32 {
    10
}
fn default_limit_max() -> u32 {
    50
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            threshold: default_threshold(),
            limit_min: default_limit_min(),
            limit_max: default_limit_max(),
        }
    }
}

impl SearchDefaults {
    /// Clamp a limit into the configured bounds
    #[must_use]
    pub fn clamp_limit(&self, limit: u32) -> u32 {
        limit.clamp(self.limit_min, self.limit_max)
    }

    /// Clamp a threshold into `0.0..=1.0`
    #[must_use]
    pub fn clamp_threshold(&self, threshold: f64) -> f64 {
        if threshold.is_nan() {
            return self.threshold;
        }
        threshold.clamp(0.0, 1.0)
    }

    /// Whether a limit differs from the default
    #[must_use]
    pub fn is_default_limit(&self, limit: u32) -> bool {
        limit == self.limit
    }

    /// Whether a threshold differs from the default
    #[must_use]
    pub fn is_default_threshold(&self, threshold: f64) -> bool {
        (threshold - self.threshold).abs() < 1e-9
    }

    fn validate(&self) -> Result<()> {
        if self.limit_min == 0 || self.limit_min > self.limit_max {
            return Err(Error::configuration(
                "search.limit_min must be positive and not exceed search.limit_max",
            ));
        }
        if !(self.limit_min..=self.limit_max).contains(&self.limit) {
            return Err(Error::configuration(
                "search.limit must lie within search.limit_min..=search.limit_max",
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::configuration("search.threshold must lie within 0.0..=1.0"));
        }
        Ok(())
    }
}

/// Collaborator recommendation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Fetch recommendations for a dominant collaborator
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Share of non-bio results (percent) a name must reach
    #[serde(default = "default_dominance_percent")]
    pub dominance_percent: u32,
}

fn default_true() -> bool {
    true
}

fn default_dominance_percent() -> u32 {
    60
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dominance_percent: default_dominance_percent(),
        }
    }
}
