//! Host configuration types

use anyhow::{Context, Result};
use kensaku_core::ClientConfig;
use serde::{Deserialize, Serialize};
use url::Url;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Terminal host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Origin search URLs are built against
    #[serde(default = "default_origin")]
    pub origin: String,
}

fn default_origin() -> String {
    "http://localhost/".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

impl UiConfig {
    pub fn origin_url(&self) -> Result<Url> {
        Url::parse(&self.origin).with_context(|| format!("Invalid ui.origin: {}", self.origin))
    }
}
