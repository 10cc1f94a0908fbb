//! Web-search collaborator seam.
//!
//! The pipeline treats search as a black box returning ranked title/snippet
//! pairs. [`SerperClient`] is the production implementation against the
//! Serper Google-search API the original deployment used.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use leadcall_core::config::{AppConfig, SearchConfig};
use leadcall_core::PipelineError;

/// Search transport or provider failure, carrying the upstream reason. An
/// empty result set is NOT an error here; the price extractor distinguishes
/// empty from failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SearchError(pub String);

/// One ranked organic search result.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

pub struct SerperClient {
    http: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    timeout: Duration,
}

impl SerperClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let api_key = config.require_search_key()?.clone();
        Ok(Self::new(&config.search, api_key))
    }

    pub fn new(search: &SearchConfig, api_key: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: search.endpoint.clone(),
            timeout: Duration::from_secs(search.timeout_secs),
        }
    }
}

#[async_trait]
impl SearchClient for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", self.api_key.expose_secret())
            .timeout(self.timeout)
            .json(&json!({ "q": query }))
            .send()
            .await
            .map_err(|error| SearchError(format!("request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError(format!("search provider returned {status}: {}", body.trim())));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|error| SearchError(format!("malformed search response: {error}")))?;

        Ok(parsed.organic)
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}
