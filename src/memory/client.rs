//! HTTP client for the external memory search service

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;

use super::MemoryHit;
use super::MemoryQuery;
use super::MemorySearch;
use super::RetrievalError;
use crate::cli::output::truncate_str;
use crate::config::AppConfig;
use crate::errors::ReplyRagError;
use crate::errors::Result;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    limit: usize,
    threshold: f32,
    #[serde(rename = "containerTag")]
    container_tag: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
struct SearchResultItem {
    #[serde(alias = "text", alias = "memory")]
    content: String,
    #[serde(alias = "score")]
    similarity: f32,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

/// Memory search over HTTP; reports `NotConfigured` when endpoint or key is missing
pub struct MemorySearchClient {
    client: Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl MemorySearchClient {
    /// Create a new memory search client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(endpoint: Option<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ReplyRagError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint
                .filter(|e| !e.trim().is_empty())
                .map(|e| e.trim_end_matches('/').to_string()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.retrieval.endpoint.clone(),
            config.retrieval.api_key.clone(),
            Duration::from_secs(config.retrieval.timeout_secs),
        )
    }

    fn search_url(&self) -> std::result::Result<(String, &str), RetrievalError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| RetrievalError::NotConfigured("retrieval.endpoint is not set".to_string()))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RetrievalError::NotConfigured("retrieval.api_key is not set".to_string()))?;
        Ok((format!("{endpoint}/search"), api_key))
    }
}

#[async_trait]
impl MemorySearch for MemorySearchClient {
    async fn search(&self, query: &MemoryQuery) -> std::result::Result<Vec<MemoryHit>, RetrievalError> {
        let (url, api_key) = self.search_url()?;

        let body = SearchRequest {
            q: &query.text,
            limit: query.limit,
            threshold: query.threshold,
            container_tag: &query.scope_tag,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body: truncate_str(&text, 200),
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;

        Ok(parsed.results.into_iter().map(into_hit).collect())
    }
}

fn into_hit(item: SearchResultItem) -> MemoryHit {
    let metadata = item
        .metadata
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect();

    MemoryHit {
        text: item.content,
        similarity_score: item.similarity,
        metadata,
    }
}
