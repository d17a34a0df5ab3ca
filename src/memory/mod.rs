//! Memory retrieval: previously-sent creator replies similar to a new fan message
//!
//! [`MemoryRetriever`] wraps a [`MemorySearch`] backend and never fails. Misconfiguration,
//! unreachable backends and bad responses all collapse into an empty match list; the cause
//! survives only in the [`RetrievalTrace`] so tiering treats "errored" and "found nothing"
//! the same way.

mod client;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub use client::MemorySearchClient;

use crate::cli::output::truncate_str;
use crate::config::AppConfig;
use crate::models::RetrievedMemory;

/// Query sent to the memory search backend
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryQuery {
    pub text: String,
    pub limit: usize,
    pub threshold: f32,
    pub scope_tag: String,
}

/// Raw ranked hit as returned by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryHit {
    pub text: String,
    pub similarity_score: f32,
    pub metadata: HashMap<String, String>,
}

impl MemoryHit {
    pub fn new(text: impl Into<String>, similarity_score: f32) -> Self {
        Self {
            text: text.into(),
            similarity_score,
            metadata: HashMap::new(),
        }
    }
}

/// Why a search produced nothing usable
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    #[error("memory search is not configured: {0}")]
    NotConfigured(String),

    #[error("memory search unreachable: {0}")]
    Unreachable(String),

    #[error("memory search returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid memory search response: {0}")]
    InvalidResponse(String),
}

/// Ranked similarity search over stored replies
#[async_trait]
pub trait MemorySearch: Send + Sync {
    async fn search(&self, query: &MemoryQuery) -> Result<Vec<MemoryHit>, RetrievalError>;
}

/// Outcome class of one retrieval, kept for observability only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    Ok,
    NotConfigured,
    Unreachable,
    BackendError,
    InvalidResponse,
}

impl From<&RetrievalError> for RetrievalStatus {
    fn from(err: &RetrievalError) -> Self {
        match err {
            RetrievalError::NotConfigured(_) => Self::NotConfigured,
            RetrievalError::Unreachable(_) => Self::Unreachable,
            RetrievalError::Status { .. } => Self::BackendError,
            RetrievalError::InvalidResponse(_) => Self::InvalidResponse,
        }
    }
}

/// Structured diagnostic for one retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalTrace {
    pub status: RetrievalStatus,
    /// Hits the backend returned before filtering
    pub hits_returned: usize,
    /// Hits kept after floor and limit
    pub hits_kept: usize,
    pub best_score: Option<f32>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Matches plus the trace of how they were obtained
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// Sorted by descending similarity
    pub memories: Vec<RetrievedMemory>,
    pub trace: RetrievalTrace,
}

/// Retrieval knobs taken from `[retrieval]`
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    pub limit: usize,
    pub threshold: f32,
    pub query_max_chars: usize,
    pub scope_tag: Option<String>,
}

impl RetrievalSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            limit: config.retrieval.limit,
            threshold: config.retrieval.threshold,
            query_max_chars: config.retrieval.query_max_chars,
            scope_tag: config.retrieval.scope_tag.clone(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// Retriever for previously-sent replies
pub struct MemoryRetriever {
    search: Arc<dyn MemorySearch>,
    settings: RetrievalSettings,
}

impl MemoryRetriever {
    /// Create a new retriever
    pub fn new(search: Arc<dyn MemorySearch>, settings: RetrievalSettings) -> Self {
        Self { search, settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Top matches for a fan message; never fails
    pub async fn retrieve(&self, message_text: &str, persona_key: &str) -> Retrieval {
        let started = Instant::now();
        let query = MemoryQuery {
            text: excerpt(message_text, self.settings.query_max_chars),
            limit: self.settings.limit,
            threshold: self.settings.threshold,
            scope_tag: self
                .settings
                .scope_tag
                .clone()
                .unwrap_or_else(|| persona_key.to_string()),
        };

        debug!(
            "Searching memories (scope={}, limit={}, threshold={})",
            query.scope_tag, query.limit, query.threshold
        );

        match self.search.search(&query).await {
            Ok(hits) => {
                let hits_returned = hits.len();
                let memories = rank(hits, self.settings.threshold, self.settings.limit);
                let trace = RetrievalTrace {
                    status: RetrievalStatus::Ok,
                    hits_returned,
                    hits_kept: memories.len(),
                    best_score: memories.first().map(|m| m.similarity_score),
                    elapsed_ms: elapsed_ms(started),
                    detail: None,
                };
                info!(
                    "Memory search kept {}/{} hits (best={:?}) in {}ms",
                    trace.hits_kept, trace.hits_returned, trace.best_score, trace.elapsed_ms
                );
                Retrieval { memories, trace }
            }
            Err(err) => {
                let status = RetrievalStatus::from(&err);
                match &err {
                    RetrievalError::NotConfigured(reason) => {
                        debug!("Memory search skipped: {}", reason);
                    }
                    RetrievalError::Status { status, body } => {
                        warn!(
                            "Memory search failed with status {}: {}",
                            status,
                            truncate_str(body, 200)
                        );
                    }
                    other => warn!("Memory search failed: {}", other),
                }
                Retrieval {
                    memories: Vec::new(),
                    trace: RetrievalTrace {
                        status,
                        hits_returned: 0,
                        hits_kept: 0,
                        best_score: None,
                        elapsed_ms: elapsed_ms(started),
                        detail: Some(truncate_str(&err.to_string(), 200)),
                    },
                }
            }
        }
    }
}

/// Clamp scores, drop hits under the floor, sort descending and cap
fn rank(hits: Vec<MemoryHit>, threshold: f32, limit: usize) -> Vec<RetrievedMemory> {
    let mut memories: Vec<RetrievedMemory> = hits
        .into_iter()
        .filter(|hit| !hit.text.trim().is_empty())
        .map(|hit| RetrievedMemory::new(hit.text, hit.similarity_score).with_metadata(hit.metadata))
        .filter(|memory| memory.similarity_score >= threshold)
        .collect();

    memories.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    memories.truncate(limit);
    memories
}

/// First `max_chars` characters of the message, trimmed
fn excerpt(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FixedSearch {
        result: Result<Vec<MemoryHit>, RetrievalError>,
        queries: Mutex<Vec<MemoryQuery>>,
    }

    impl FixedSearch {
        fn new(result: Result<Vec<MemoryHit>, RetrievalError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MemorySearch for FixedSearch {
        async fn search(&self, query: &MemoryQuery) -> Result<Vec<MemoryHit>, RetrievalError> {
            self.queries.lock().unwrap().push(query.clone());
            self.result.clone()
        }
    }

    fn retriever(search: Arc<FixedSearch>) -> MemoryRetriever {
        MemoryRetriever::new(search, RetrievalSettings::default())
    }

    #[tokio::test]
    async fn test_hits_are_filtered_sorted_and_capped() {
        let search = FixedSearch::new(Ok(vec![
            MemoryHit::new("low", 0.3),
            MemoryHit::new("mid", 0.7),
            MemoryHit::new("top", 0.97),
            MemoryHit::new("second", 0.8),
            MemoryHit::new("third", 0.55),
        ]));
        let retrieval = retriever(search).retrieve("hello", "creator").await;

        let contents: Vec<_> = retrieval.memories.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["top", "second", "mid"]);
        assert_eq!(retrieval.trace.status, RetrievalStatus::Ok);
        assert_eq!(retrieval.trace.hits_returned, 5);
        assert_eq!(retrieval.trace.hits_kept, 3);
        assert_eq!(retrieval.trace.best_score, Some(0.97));
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_clamped() {
        let search = FixedSearch::new(Ok(vec![MemoryHit::new("over", 1.4)]));
        let retrieval = retriever(search).retrieve("hello", "creator").await;
        assert_eq!(retrieval.memories[0].similarity_score, 1.0);
    }

    #[tokio::test]
    async fn test_backend_error_becomes_empty_result() {
        let search = FixedSearch::new(Err(RetrievalError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }));
        let retrieval = retriever(search).retrieve("hello", "creator").await;

        assert!(retrieval.memories.is_empty());
        assert_eq!(retrieval.trace.status, RetrievalStatus::BackendError);
        assert!(retrieval.trace.detail.unwrap().contains("502"));
    }

    #[tokio::test]
    async fn test_not_configured_becomes_empty_result() {
        let search = FixedSearch::new(Err(RetrievalError::NotConfigured(
            "no api key".to_string(),
        )));
        let retrieval = retriever(search).retrieve("hello", "creator").await;
        assert!(retrieval.memories.is_empty());
        assert_eq!(retrieval.trace.status, RetrievalStatus::NotConfigured);
    }

    #[tokio::test]
    async fn test_query_is_bounded_and_scoped_to_persona() {
        let search = FixedSearch::new(Ok(vec![]));
        let long_message = "é".repeat(2_000);
        retriever(search.clone())
            .retrieve(&long_message, "creator-42")
            .await;

        let queries = search.queries.lock().unwrap();
        assert_eq!(queries[0].text.chars().count(), 500);
        assert_eq!(queries[0].scope_tag, "creator-42");
        assert_eq!(queries[0].limit, 3);
    }

    #[tokio::test]
    async fn test_configured_scope_tag_wins() {
        let search = FixedSearch::new(Ok(vec![]));
        let settings = RetrievalSettings {
            scope_tag: Some("faq".to_string()),
            ..RetrievalSettings::default()
        };
        MemoryRetriever::new(search.clone(), settings)
            .retrieve("hi", "creator-42")
            .await;
        assert_eq!(search.queries.lock().unwrap()[0].scope_tag, "faq");
    }
}
