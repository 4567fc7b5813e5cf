//! REST client for the search backend
//!
//! Wraps the three JSON endpoints the UI reads: text search, similarity
//! snapshots and collaborator top videos.

use async_trait::async_trait;
use kensaku_core::{
    BatchMeta, ClientConfig, Completion, Recommendations, RecommendationSource, ResultItem,
    SourceMeta,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{ErrorBody, SearchResponse, TopVideosResponse};

/// Decoded search response
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Search mode label
    pub mode: String,
    /// Items in backend order
    pub items: Vec<ResultItem>,
    /// Anchor item for similarity snapshots
    pub source: Option<SourceMeta>,
}

impl SearchPage {
    fn from_response(response: SearchResponse) -> Self {
        let items = response
            .results
            .into_iter()
            .filter_map(|hit| match hit.into_item() {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!(error = %err, "Skipping undecodable result row");
                    None
                }
            })
            .collect();
        Self {
            mode: response.mode,
            items,
            source: response.source.map(SourceMeta::from),
        }
    }

    /// Convert into a batch completion
    #[must_use]
    pub fn into_completion(self) -> Completion {
        Completion::Batch {
            items: self.items,
            meta: BatchMeta {
                mode_label: self.mode,
                source: self.source,
            },
        }
    }
}

/// HTTP client for the search backend
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: Client,
    base_url: Url,
}

impl HttpSearchClient {
    /// Create a client against a base URL
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Create a client from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let base_url = config
            .api_base()
            .map_err(|err| Error::InvalidUrl(err.to_string()))?;
        Ok(Self::new(base_url))
    }

    /// Base URL
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Text search
    pub async fn search(&self, query: &str, top_k: u32, threshold: f64) -> Result<SearchPage> {
        let response: SearchResponse = self
            .get_json(
                "/api/search",
                &[
                    ("q", query.to_string()),
                    ("top_k", top_k.to_string()),
                    ("threshold", threshold.to_string()),
                ],
            )
            .await?;
        Ok(SearchPage::from_response(response))
    }

    /// Similarity snapshot for an identifier
    pub async fn similar(&self, identifier: &str, top_k: u32, threshold: f64) -> Result<SearchPage> {
        let response: SearchResponse = self
            .get_json(
                "/api/similar",
                &[
                    ("dvd_id", identifier.to_string()),
                    ("top_k", top_k.to_string()),
                    ("threshold", threshold.to_string()),
                ],
            )
            .await?;
        Ok(SearchPage::from_response(response))
    }

    /// Top videos credited to a performer
    pub async fn actress_top_videos(&self, name: &str) -> Result<Recommendations> {
        let response: TopVideosResponse = self
            .get_json("/api/actress_top_videos", &[("name", name.to_string())])
            .await?;
        Ok(response.into_recommendations(name))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));

        debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|body| body.message())
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(Error::rejected(status.as_u16(), message));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RecommendationSource for HttpSearchClient {
    async fn top_items(&self, name: &str) -> kensaku_core::Result<Recommendations> {
        self.actress_top_videos(name)
            .await
            .map_err(|err| kensaku_core::Error::recommendations(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Hit;
    use serde_json::json;

    #[test]
    fn test_page_skips_bad_rows() {
        let response = SearchResponse {
            mode: "Hybrid".to_string(),
            results: vec![
                serde_json::from_value::<Hit>(json!({"data": {"dvdid": "A-1", "title": "a"}}))
                    .unwrap(),
                serde_json::from_value::<Hit>(json!({"data": "not a row"})).unwrap(),
            ],
            source: None,
        };
        let page = SearchPage::from_response(response);
        assert_eq!(page.items.len(), 1);

        match page.into_completion() {
            Completion::Batch { items, meta } => {
                assert_eq!(items[0].identifier(), "A-1");
                assert_eq!(meta.mode_label, "Hybrid");
            }
            other => panic!("unexpected completion: {other:?}"),
        }
    }

    #[test]
    fn test_from_config() {
        let client = HttpSearchClient::from_config(&ClientConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/");

        let config = ClientConfig {
            api_base_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            HttpSearchClient::from_config(&config),
            Err(Error::InvalidUrl(_))
        ));
    }
}
