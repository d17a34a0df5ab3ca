//! Similarity-threshold tiering: which reply strategy a set of matches earns

use serde::Serialize;

use crate::config::TieringConfig;
use crate::models::RetrievedMemory;

/// Strategy chosen for one request, carrying the memories it needs
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyStrategy {
    /// Send the memory verbatim
    ExactReuse(RetrievedMemory),
    /// Minimally rewrite the memory for the new message
    Adapt(RetrievedMemory),
    /// Generate fresh drafts grounded on these memories
    Supplemental(Vec<RetrievedMemory>),
    /// Generate from persona and history only
    FullGeneration,
}

impl ReplyStrategy {
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::ExactReuse(_) => StrategyKind::ExactReuse,
            Self::Adapt(_) => StrategyKind::Adaptation,
            Self::Supplemental(_) => StrategyKind::SupplementalGeneration,
            Self::FullGeneration => StrategyKind::FullGeneration,
        }
    }
}

/// Strategy label without payload, for traces and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ExactReuse,
    Adaptation,
    SupplementalGeneration,
    FullGeneration,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ExactReuse => "exact_reuse",
            Self::Adaptation => "adaptation",
            Self::SupplementalGeneration => "supplemental_generation",
            Self::FullGeneration => "full_generation",
        };
        f.write_str(label)
    }
}

/// Threshold policy; thresholds satisfy `supplemental <= adaptation <= exact_reuse`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TieringPolicy {
    pub exact_reuse: f32,
    pub adaptation: f32,
    pub supplemental: f32,
}

impl TieringPolicy {
    #[must_use]
    pub const fn from_config(config: &TieringConfig) -> Self {
        Self {
            exact_reuse: config.exact_reuse,
            adaptation: config.adaptation,
            supplemental: config.supplemental,
        }
    }

    /// Tier for a best-match score; `None` means nothing was retrieved
    #[must_use]
    pub fn kind_for_score(&self, best_score: Option<f32>) -> StrategyKind {
        match best_score {
            Some(score) if score >= self.exact_reuse => StrategyKind::ExactReuse,
            Some(score) if score >= self.adaptation => StrategyKind::Adaptation,
            Some(score) if score >= self.supplemental => StrategyKind::SupplementalGeneration,
            _ => StrategyKind::FullGeneration,
        }
    }

    /// Classify against the single highest-similarity match
    #[must_use]
    pub fn classify(&self, memories: &[RetrievedMemory]) -> ReplyStrategy {
        let best = memories
            .iter()
            .max_by(|a, b| a.similarity_score.total_cmp(&b.similarity_score));

        let Some(best) = best else {
            return ReplyStrategy::FullGeneration;
        };

        match self.kind_for_score(Some(best.similarity_score)) {
            StrategyKind::ExactReuse => ReplyStrategy::ExactReuse(best.clone()),
            StrategyKind::Adaptation => ReplyStrategy::Adapt(best.clone()),
            StrategyKind::SupplementalGeneration => {
                let mut grounding: Vec<RetrievedMemory> = memories
                    .iter()
                    .filter(|m| m.similarity_score >= self.supplemental)
                    .cloned()
                    .collect();
                grounding.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
                ReplyStrategy::Supplemental(grounding)
            }
            StrategyKind::FullGeneration => ReplyStrategy::FullGeneration,
        }
    }
}

impl Default for TieringPolicy {
    fn default() -> Self {
        Self::from_config(&TieringConfig::default())
    }
}
