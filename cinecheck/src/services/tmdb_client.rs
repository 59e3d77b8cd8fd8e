//! TMDB API client
//!
//! Thin request/response boundary to the external movie-metadata service.
//! Two operations: title search and fetch-by-identifier. Each call carries a
//! per-request timeout and retries transient failures with exponential
//! backoff before giving up; the caller decides what an exhausted lookup
//! means (for the pipeline: an unresolved row, never a fatal run).

use crate::types::{Candidate, SearchQuery};
use cinecheck_common::config::Config;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("cinecheck/", env!("CARGO_PKG_VERSION"));

/// Initial backoff delay; doubles per attempt
const RETRY_BACKOFF_MS: u64 = 100;

/// Metadata-service client errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("malformed response: {0}")]
    Parse(String),
}

impl MetadataError {
    /// Retryable failures: connectivity, timeouts, rate limiting, 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            MetadataError::Network(_) | MetadataError::Timeout => true,
            MetadataError::Api(status, _) => *status == 429 || *status >= 500,
            MetadataError::Parse(_) => false,
        }
    }
}

/// Request/response boundary to the metadata service
///
/// The matcher, verifier, and pipeline only depend on this seam, so tests
/// drive them with scripted implementations.
pub trait MetadataClient {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<Candidate>, MetadataError>> + Send;

    fn fetch_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Candidate>, MetadataError>> + Send;
}

impl<T: MetadataClient + Send + Sync> MetadataClient for std::sync::Arc<T> {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, MetadataError> {
        (**self).search(query).await
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Candidate>, MetadataError> {
        (**self).fetch_by_id(id).await
    }
}

/// TMDB search response envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<MovieRecord>,
}

/// TMDB movie record (search result or detail lookup)
#[derive(Debug, Deserialize)]
struct MovieRecord {
    id: u64,
    title: String,
    release_date: Option<String>,
}

impl From<MovieRecord> for Candidate {
    fn from(record: MovieRecord) -> Self {
        // release_date is YYYY-MM-DD; the year prefix is all we carry.
        // get() keeps malformed dates (too short, or a non-char-boundary at
        // byte 4) as "no year" instead of panicking.
        let release_year = record
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .map(str::to_string);
        Candidate {
            identifier: record.id.to_string(),
            title: record.title,
            release_year,
        }
    }
}

/// reqwest-backed TMDB client
pub struct TmdbClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry_attempts: u32,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Result<Self, MetadataError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_attempts: config.retry_attempts,
        })
    }

    /// Issue one GET and decode the JSON body
    ///
    /// `Ok(None)` only for a 404 when `not_found_ok` is set (detail lookups
    /// for unknown identifiers); every other non-2xx maps to `Api`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        not_found_ok: bool,
    ) -> Result<Option<T>, MetadataError> {
        let response = self
            .http_client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MetadataError::Timeout
                } else {
                    MetadataError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND && not_found_ok {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api(status.as_u16(), body));
        }

        let decoded = response
            .json::<T>()
            .await
            .map_err(|e| MetadataError::Parse(e.to_string()))?;
        Ok(Some(decoded))
    }

    /// Retry a call on transient failure with exponential backoff
    async fn with_retries<T, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, MetadataError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MetadataError>>,
    {
        let mut backoff = Duration::from_millis(RETRY_BACKOFF_MS);

        for attempt in 1..=self.retry_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Transient metadata call failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::warn!(
                            operation = operation_name,
                            attempts = self.retry_attempts,
                            error = %e,
                            "Metadata call failed after retries"
                        );
                    }
                    return Err(e);
                }
            }
        }

        // retry_attempts is clamped to >= 1 during config resolution
        Err(MetadataError::Network("no attempts made".to_string()))
    }
}

impl MetadataClient for TmdbClient {
    /// Search movies by title with optional year/language filters
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Candidate>, MetadataError> {
        let url = format!("{}/search/movie", self.base_url);

        let mut params: Vec<(&str, &str)> =
            vec![("api_key", self.api_key.as_str()), ("query", query.title.as_str())];
        if let Some(year) = &query.year {
            params.push(("primary_release_year", year.as_str()));
        }
        if let Some(language) = &query.language {
            params.push(("language", language.as_str()));
        }

        tracing::debug!(title = %query.title, year = ?query.year, "Querying metadata search");

        let response: SearchResponse = self
            .with_retries("search", || self.get_json(&url, &params, false))
            .await?
            .ok_or_else(|| MetadataError::Parse("empty search response".to_string()))?;

        tracing::debug!(
            title = %query.title,
            candidates = response.results.len(),
            "Metadata search completed"
        );

        Ok(response.results.into_iter().map(Candidate::from).collect())
    }

    /// Fetch the canonical record for a known identifier
    ///
    /// Returns `Ok(None)` when the service has no record for the identifier.
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Candidate>, MetadataError> {
        let url = format!("{}/movie/{}", self.base_url, id);
        let params: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];

        tracing::debug!(identifier = %id, "Fetching canonical record");

        let record: Option<MovieRecord> = self
            .with_retries("fetch_by_id", || self.get_json(&url, &params, true))
            .await?;

        Ok(record.map(Candidate::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinecheck_common::config::{Config, ConfigOverrides, TomlConfig};

    fn test_config() -> Config {
        let overrides = ConfigOverrides {
            api_key: Some("test-key".to_string()),
            base_url: Some("http://localhost:9/".to_string()),
            ..Default::default()
        };
        Config::resolve(overrides, &TomlConfig::default()).unwrap()
    }

    #[test]
    fn test_client_creation_strips_trailing_slash() {
        let client = TmdbClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url, "http://localhost:9");
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "page": 1,
            "results": [
                {"id": 27205, "title": "Inception", "release_date": "2010-07-15"},
                {"id": 64956, "title": "Inception: The Cobol Job", "release_date": ""}
            ],
            "total_results": 2
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let candidates: Vec<Candidate> =
            response.results.into_iter().map(Candidate::from).collect();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].identifier, "27205");
        assert_eq!(candidates[0].title, "Inception");
        assert_eq!(candidates[0].release_year.as_deref(), Some("2010"));
        // Empty release_date yields no year
        assert!(candidates[1].release_year.is_none());
    }

    #[test]
    fn test_release_date_with_multibyte_prefix_yields_no_year() {
        // Byte 4 falls inside a multibyte char; must degrade to "no year",
        // never panic
        let json = r#"{"id": 1, "title": "X", "release_date": "201é"}"#;
        let record: MovieRecord = serde_json::from_str(json).unwrap();
        let candidate = Candidate::from(record);
        assert!(candidate.release_year.is_none());

        let record = MovieRecord {
            id: 2,
            title: "Y".to_string(),
            release_date: Some("été".to_string()),
        };
        assert!(Candidate::from(record).release_year.is_none());
    }

    #[test]
    fn test_movie_record_missing_release_date() {
        let json = r#"{"id": 603, "title": "The Matrix"}"#;
        let record: MovieRecord = serde_json::from_str(json).unwrap();
        let candidate = Candidate::from(record);
        assert_eq!(candidate.identifier, "603");
        assert!(candidate.release_year.is_none());
    }

    #[test]
    fn test_transient_classification() {
        assert!(MetadataError::Network("reset".to_string()).is_transient());
        assert!(MetadataError::Timeout.is_transient());
        assert!(MetadataError::Api(503, String::new()).is_transient());
        assert!(MetadataError::Api(429, String::new()).is_transient());
        assert!(!MetadataError::Api(401, String::new()).is_transient());
        assert!(!MetadataError::Api(404, String::new()).is_transient());
        assert!(!MetadataError::Parse("bad json".to_string()).is_transient());
    }

    #[tokio::test]
    async fn test_with_retries_gives_up_on_permanent_error() {
        let client = TmdbClient::new(&test_config()).unwrap();
        let mut calls = 0u32;

        let result: Result<(), MetadataError> = client
            .with_retries("test", || {
                calls += 1;
                async { Err(MetadataError::Api(401, "unauthorized".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(MetadataError::Api(401, _))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_with_retries_retries_transient_until_cap() {
        let client = TmdbClient::new(&test_config()).unwrap();
        let mut calls = 0u32;

        let result: Result<(), MetadataError> = client
            .with_retries("test", || {
                calls += 1;
                async { Err(MetadataError::Timeout) }
            })
            .await;

        assert!(matches!(result, Err(MetadataError::Timeout)));
        assert_eq!(calls, client.retry_attempts);
    }

    #[tokio::test]
    async fn test_with_retries_recovers_after_transient_failure() {
        let client = TmdbClient::new(&test_config()).unwrap();
        let mut calls = 0u32;

        let result = client
            .with_retries("test", || {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt < 2 {
                        Err(MetadataError::Api(500, String::new()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls, 2);
    }
}
