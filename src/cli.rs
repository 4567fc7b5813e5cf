//! CLI module for Kensaku
//!
//! Provides terminal commands:
//! - `search`: Text search
//! - `similar`: Deep-similarity stream (or REST snapshot) for an identifier
//! - `open`: Cold start from a shared search URL

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kensaku_client::{HttpSearchClient, OneShotFetcher, StreamingFetcher};
use kensaku_core::{
    url_for_intent, Fetchers, HistoryPort, MemoryHistory, ResultFetcher, SearchApp, SearchIntent,
};
use tracing::info;
use url::Url;

use crate::config::AppConfig;
use crate::console::ConsoleView;
use crate::loader;

/// Kensaku search client
#[derive(Parser, Debug)]
#[command(name = "kensaku")]
#[command(about = "Terminal client for the Kensaku search backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Maximum number of results
    #[arg(long, global = true)]
    pub limit: Option<u32>,

    /// Minimum score (0.0 to 1.0)
    #[arg(long, global = true)]
    pub threshold: Option<f64>,

    /// Backend base URL (overrides configuration)
    #[arg(long, global = true)]
    pub api: Option<String>,

    /// Print every render instruction
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Text search
    Search {
        /// Query text (`id:<ID>` switches to similarity)
        query: Vec<String>,
    },
    /// Items similar to an identifier
    Similar {
        /// Catalogue identifier
        id: String,
        /// Use the REST snapshot instead of the stream
        #[arg(long)]
        snapshot: bool,
    },
    /// Restore a search from a URL
    Open {
        /// Search URL (e.g. http://localhost/search?q=beach&top_k=30)
        url: String,
    },
}

/// Run the CLI command
pub async fn run(mut cli: Cli) -> Result<()> {
    let Some(command) = cli.command.take() else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let mut config = loader::load_config()?;
    if let Some(api) = &cli.api {
        config.client.api_base_url = api.clone();
        config.client.validate().context("Invalid --api")?;
    }

    let snapshot = matches!(command, Commands::Similar { snapshot: true, .. });
    let fetchers = build_fetchers(&config, snapshot)?;
    let start_url = start_url(&config, &cli, command)?;

    info!(url = %start_url, "Starting session");
    let history = MemoryHistory::new(start_url);
    let view = ConsoleView::stdout(cli.verbose);
    let mut app = SearchApp::new(&config.client, fetchers, view, history);

    app.boot();
    app.settle().await;

    info!(
        mode = app.state().mode.as_str(),
        url = %app.history().current(),
        "Session settled"
    );
    Ok(())
}

fn build_fetchers(config: &AppConfig, snapshot: bool) -> Result<Fetchers> {
    let client = HttpSearchClient::from_config(&config.client)?;
    let oneshot = Arc::new(OneShotFetcher::new(client.clone()));
    let similar: Arc<dyn ResultFetcher> = if snapshot {
        oneshot.clone()
    } else {
        Arc::new(StreamingFetcher::from_config(&config.client)?)
    };
    Ok(Fetchers {
        text: oneshot,
        similar,
        recommendations: Arc::new(client),
    })
}

fn start_url(config: &AppConfig, cli: &Cli, command: Commands) -> Result<Url> {
    let defaults = &config.client.search;
    let limit = defaults.clamp_limit(cli.limit.unwrap_or(defaults.limit));
    let threshold = defaults.clamp_threshold(cli.threshold.unwrap_or(defaults.threshold));
    let origin = config.ui.origin_url()?;

    let intent = match command {
        Commands::Search { query } => SearchIntent::new(query.join(" "), limit, threshold)?,
        Commands::Similar { id, .. } => SearchIntent::by_identifier(&id, limit, threshold)?,
        Commands::Open { url } => {
            return Url::parse(&url).with_context(|| format!("Invalid url: {url}"));
        }
    };
    Ok(url_for_intent(&origin, &intent, defaults))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("kensaku").chain(args.iter().copied()))
    }

    #[test]
    fn test_search_url() {
        let cli = cli(&["search", "office", "romance", "--limit", "30"]);
        let config = AppConfig::default();
        let command = match &cli.command {
            Some(Commands::Search { query }) => Commands::Search {
                query: query.clone(),
            },
            other => panic!("unexpected command: {other:?}"),
        };
        let url = start_url(&config, &cli, command).unwrap();
        assert_eq!(url.as_str(), "http://localhost/search?q=office+romance&top_k=30");
    }

    #[test]
    fn test_similar_url_clamps_limit() {
        let cli = cli(&["similar", "ABC-123", "--limit", "500"]);
        let config = AppConfig::default();
        let command = Commands::Similar {
            id: "ABC-123".to_string(),
            snapshot: false,
        };
        let url = start_url(&config, &cli, command).unwrap();
        assert_eq!(url.as_str(), "http://localhost/search?q=id%3AABC-123&top_k=50");
    }

    #[test]
    fn test_empty_search_is_rejected() {
        let cli = cli(&["search"]);
        let config = AppConfig::default();
        let command = Commands::Search { query: Vec::new() };
        assert!(start_url(&config, &cli, command).is_err());
    }
}
