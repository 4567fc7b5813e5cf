//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. Local overrides
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment, e.g. KENSAKU_CLIENT__API_BASE_URL
        .add_source(
            Environment::with_prefix("KENSAKU")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    config
        .client
        .validate()
        .context("Invalid client configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.client.similar_ws_path, "/ws/similar");
        assert_eq!(config.client.recommendations.dominance_percent, 60);
        assert!(config.client.validate().is_ok());
    }
}
