//! View-State Store
//!
//! Tracks the UI mode, the auxiliary toggles and the last-used search
//! parameters, and mirrors searches into the address bar. A URL alone is
//! enough to rebuild a search intent; history navigation relies on it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::SearchDefaults;
use crate::error::{Error, Result};
use crate::intent::SearchIntent;

/// Path used for result pages
pub const SEARCH_PATH: &str = "/search";

/// Top-level UI mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    /// Landing page
    #[default]
    Home,
    /// Results page
    Results,
}

/// View state that outlives individual sessions
#[derive(Debug, Clone)]
pub struct ViewStateStore {
    defaults: SearchDefaults,
    base: Url,
    ui_mode: UiMode,
    options_expanded: bool,
    similar_header_visible: bool,
    limit: u32,
    threshold: f64,
    query_text: String,
}

impl ViewStateStore {
    /// Create a store at Home with default parameters
    #[must_use]
    pub fn new(defaults: SearchDefaults, base: Url) -> Self {
        Self {
            limit: defaults.limit,
            threshold: defaults.threshold,
            defaults,
            base,
            ui_mode: UiMode::Home,
            options_expanded: false,
            similar_header_visible: false,
            query_text: String::new(),
        }
    }

    /// Current UI mode
    #[must_use]
    pub fn ui_mode(&self) -> UiMode {
        self.ui_mode
    }

    /// Whether the options panel is expanded
    #[must_use]
    pub fn options_expanded(&self) -> bool {
        self.options_expanded
    }

    /// Whether the "similar to" header is shown
    #[must_use]
    pub fn similar_header_visible(&self) -> bool {
        self.similar_header_visible
    }

    /// Last-used limit
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Last-used threshold
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Search box text
    #[must_use]
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// Configured defaults
    #[must_use]
    pub fn defaults(&self) -> &SearchDefaults {
        &self.defaults
    }

    /// Set the limit, clamped to the configured bounds
    pub fn set_limit(&mut self, limit: u32) -> u32 {
        self.limit = self.defaults.clamp_limit(limit);
        self.limit
    }

    /// Set the threshold, clamped to `0.0..=1.0`
    pub fn set_threshold(&mut self, threshold: f64) -> f64 {
        self.threshold = self.defaults.clamp_threshold(threshold);
        self.threshold
    }

    /// Set the search box text
    pub fn set_query_text(&mut self, text: impl Into<String>) {
        self.query_text = text.into();
    }

    /// Flip the options panel
    pub fn toggle_options(&mut self) -> bool {
        self.options_expanded = !self.options_expanded;
        self.options_expanded
    }

    /// Track the "similar to" header
    pub fn set_similar_header_visible(&mut self, visible: bool) {
        self.similar_header_visible = visible;
    }

    /// Build an intent from query text and the last-used parameters
    pub fn intent_for(&self, query: &str) -> Result<SearchIntent> {
        SearchIntent::new(query, self.limit, self.threshold)
    }

    /// Note a search in the view state without touching history
    pub fn note_search(&mut self, intent: &SearchIntent) {
        self.ui_mode = UiMode::Results;
        self.query_text = intent.query_text().to_string();
    }

    /// Record a user-initiated search and return the URL to push
    pub fn record_search(&mut self, intent: &SearchIntent) -> Url {
        self.note_search(intent);
        url_for_intent(&self.base, intent, &self.defaults)
    }

    /// Rebuild state from a URL after history navigation
    ///
    /// Treated as a cold start: absent parameters fall back to defaults,
    /// never to in-memory values. Returns `None` when the URL carries no
    /// usable query.
    pub fn restore_from_url(&mut self, url: &Url) -> Option<SearchIntent> {
        let (limit, threshold) = parameters_from_url(url, &self.defaults);
        self.limit = limit;
        self.threshold = threshold;
        self.similar_header_visible = false;

        let intent = intent_from_url(url, &self.defaults)?;
        self.note_search(&intent);
        debug!(query = %intent.query_text(), limit, threshold, "Restored search from url");
        Some(intent)
    }

    /// Rebuild state from the URL the page was opened with
    ///
    /// Expands the options panel when the URL carries non-default
    /// parameters.
    pub fn initial_load(&mut self, url: &Url) -> Option<SearchIntent> {
        let intent = self.restore_from_url(url);
        if !self.defaults.is_default_limit(self.limit)
            || !self.defaults.is_default_threshold(self.threshold)
        {
            self.options_expanded = true;
        }
        intent
    }

    /// Return to Home and give the bare URL to push
    pub fn reset(&mut self) -> Url {
        self.ui_mode = UiMode::Home;
        self.query_text.clear();
        self.options_expanded = false;
        self.similar_header_visible = false;

        let mut url = self.base.clone();
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

/// Build the result-page URL for an intent
///
/// `top_k` and `threshold` are written only when they differ from the
/// defaults.
#[must_use]
pub fn url_for_intent(base: &Url, intent: &SearchIntent, defaults: &SearchDefaults) -> Url {
    let mut url = base.clone();
    url.set_path(SEARCH_PATH);
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("q", intent.query_text());
        if !defaults.is_default_limit(intent.limit) {
            query.append_pair("top_k", &intent.limit.to_string());
        }
        if !defaults.is_default_threshold(intent.threshold) {
            query.append_pair("threshold", &intent.threshold.to_string());
        }
    }
    url
}

/// Rebuild an intent purely from a URL's query parameters
#[must_use]
pub fn intent_from_url(url: &Url, defaults: &SearchDefaults) -> Option<SearchIntent> {
    let query = url
        .query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())?;
    let (limit, threshold) = parameters_from_url(url, defaults);
    match SearchIntent::new(query, limit, threshold) {
        Ok(intent) => Some(intent),
        Err(err) => {
            debug!(code = err.code(), "Ignoring unusable query in url");
            None
        }
    }
}

fn parameters_from_url(url: &Url, defaults: &SearchDefaults) -> (u32, f64) {
    let mut limit = defaults.limit;
    let mut threshold = defaults.threshold;

    for (key, value) in url.query_pairs() {
        let parsed = match key.as_ref() {
            "top_k" => parse_parameter::<u32>(&key, &value)
                .map(|parsed| limit = defaults.clamp_limit(parsed)),
            "threshold" => parse_parameter::<f64>(&key, &value)
                .map(|parsed| threshold = defaults.clamp_threshold(parsed)),
            _ => Ok(()),
        };
        if let Err(err) = parsed {
            warn!(code = err.code(), error = %err, "Ignoring url parameter");
        }
    }
    (limit, threshold)
}

fn parse_parameter<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_parameter(name, value))
}
