//! Web search client and keyword relevance filter.
//!
//! A search is a single GET against a Custom Search style endpoint
//! (`q`, `key`, `cx` query parameters). Hits are then narrowed with a
//! case-insensitive keyword filter before they are shown to the user.

mod relevance;

use std::time::Duration;

use coursecraft_shared::{AppConfig, CourseCraftError, Result, SearchResult, validate_search_keys};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use relevance::{KeywordSet, RESEARCH_KEYWORDS, filter_relevant, is_relevant};

/// Default timeout in seconds for search requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("CourseCraft/", env!("CARGO_PKG_VERSION"));

/// Message carried by every non-200 search failure.
pub const SEARCH_FAILED_MESSAGE: &str = "error fetching data from the search endpoint";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Endpoint and credentials for the search client.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Endpoint URL (query parameters are appended).
    pub base_url: String,
    /// API key, sent as `key`.
    pub api_key: String,
    /// Search engine id, sent as `cx`.
    pub engine_id: String,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl SearchOptions {
    /// Resolve options from config and the environment variables it names.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let (api_key, engine_id) = validate_search_keys(config)?;
        Ok(Self {
            base_url: config.search.base_url.clone(),
            api_key,
            engine_id,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Thin wrapper over the search endpoint.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    engine_id: String,
}

impl SearchClient {
    pub fn new(opts: &SearchOptions) -> Result<Self> {
        let endpoint = Url::parse(&opts.base_url).map_err(|e| {
            CourseCraftError::config(format!("invalid search base_url '{}': {e}", opts.base_url))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| {
                CourseCraftError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: opts.api_key.clone(),
            engine_id: opts.engine_id.clone(),
        })
    }

    /// Run one search. A response without an `items` field is an empty
    /// result list, not an error.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", query),
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "search request failed");
                CourseCraftError::Search(SEARCH_FAILED_MESSAGE.into())
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(%status, "search endpoint returned non-200");
            return Err(CourseCraftError::Search(SEARCH_FAILED_MESSAGE.into()));
        }

        let payload: SearchResponse = response.json().await.map_err(|e| {
            CourseCraftError::Search(format!("invalid search response: {e}"))
        })?;

        debug!(hits = payload.items.len(), "search response parsed");
        Ok(payload.items)
    }

    /// Search and keep only hits that mention one of `keywords`.
    #[instrument(skip(self, keywords))]
    pub async fn search_relevant(
        &self,
        query: &str,
        keywords: &KeywordSet,
    ) -> Result<Vec<SearchResult>> {
        let results = self.search(query).await?;
        let total = results.len();
        let relevant = filter_relevant(results, keywords);
        info!(total, relevant = relevant.len(), "search results filtered");
        Ok(relevant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn opts_for(server: &MockServer) -> SearchOptions {
        SearchOptions {
            base_url: format!("{}/customsearch/v1", server.uri()),
            api_key: "test-key".into(),
            engine_id: "test-cx".into(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn search_parses_items() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "kind": "customsearch#search",
            "items": [
                {"title": "Stent trial results", "link": "https://example.org/a", "snippet": "A randomized control trial of drug-eluting stents."},
                {"title": "Cafe menu", "link": "https://example.org/b"}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("q", "stent trials"))
            .and(query_param("key", "test-key"))
            .and(query_param("cx", "test-cx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server)).unwrap();
        let results = client.search("stent trials").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Stent trial results");
        assert_eq!(results[1].link, "https://example.org/b");
        assert!(results[1].snippet.is_empty());
    }

    #[tokio::test]
    async fn search_without_items_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"kind": "customsearch#search"})),
            )
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server)).unwrap();
        let results = client.search("nothing here").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn non_200_is_search_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server)).unwrap();
        let err = client.search("anything").await.unwrap_err();

        match err {
            CourseCraftError::Search(message) => assert_eq!(message, SEARCH_FAILED_MESSAGE),
            other => panic!("expected Search error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_search_error() {
        let opts = SearchOptions {
            base_url: "http://127.0.0.1:9/customsearch/v1".into(),
            api_key: "k".into(),
            engine_id: "cx".into(),
            timeout_secs: 2,
        };
        let client = SearchClient::new(&opts).unwrap();

        match client.search("stent trials").await {
            Err(CourseCraftError::Search(message)) => assert_eq!(message, SEARCH_FAILED_MESSAGE),
            other => panic!("expected Search error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_relevant_drops_unrelated_hits() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "items": [
                {"title": "Cafe menu", "link": "https://example.org/menu", "snippet": "Coffee and cake"},
                {"title": "Meta-analysis of statins", "link": "https://example.org/statins", "snippet": "Pooled results"},
                {"title": "Weather", "link": "https://example.org/weather", "snippet": "Sunny"}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = SearchClient::new(&opts_for(&server)).unwrap();
        let results = client
            .search_relevant("statins", &KeywordSet::research_default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].link, "https://example.org/statins");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let opts = SearchOptions {
            base_url: "not a url".into(),
            api_key: "k".into(),
            engine_id: "cx".into(),
            timeout_secs: 5,
        };
        assert!(matches!(
            SearchClient::new(&opts),
            Err(CourseCraftError::Config { .. })
        ));
    }
}
