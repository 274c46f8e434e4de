//! SerpApi web search.
//!
//! Search feeds research, and research is best-effort by contract, so every
//! failure path here degrades to an empty result list instead of an error.

use crate::providers::http_client::search_client;
use crate::providers::traits::{SearchProvider, SearchResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const API_BASE: &str = "https://serpapi.com/search.json";
const DEFAULT_LOCATION: &str = "United States";
const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

pub struct SerpClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl SerpClient {
    pub fn new(api_key: Option<&str>) -> Self {
        let resolved = api_key
            .map(String::from)
            .or_else(|| std::env::var("SERPAPI_API_KEY").ok());

        Self {
            api_key: resolved,
            base_url: API_BASE.to_string(),
            client: search_client(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, query: &str, num_results: u32) -> Option<Vec<SearchResult>> {
        let api_key = self.api_key.as_deref()?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", api_key),
                ("q", query),
                ("num", &num_results.to_string()),
                ("location", DEFAULT_LOCATION),
                ("hl", DEFAULT_LANGUAGE),
                ("engine", "google"),
            ])
            .send()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "search request failed"))
            .ok()?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "search returned error status");
            return None;
        }

        let parsed: SerpResponse = response
            .json()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "search response decode failed"))
            .ok()?;

        let results = parsed
            .organic_results
            .into_iter()
            .take(num_results as usize)
            .map(|result| SearchResult {
                title: result.title,
                url: result.link,
                snippet: result.snippet,
            })
            .collect();
        Some(results)
    }
}

#[async_trait]
impl SearchProvider for SerpClient {
    async fn search(&self, query: &str, num_results: u32) -> Vec<SearchResult> {
        if self.api_key.is_none() {
            tracing::warn!("no search API key configured, returning empty results");
            return Vec::new();
        }

        self.fetch(query, num_results).await.unwrap_or_default()
    }

    fn name(&self) -> &str {
        "serpapi"
    }
}
