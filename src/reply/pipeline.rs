//! Reply pipeline: Retrieve -> Tier -> Reuse | Adapt | Generate -> Cache

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing::Instrument;
use uuid::Uuid;

use super::adaptation::MemoryAdapter;
use super::cache_writer::CacheStatus;
use super::cache_writer::DraftCacheWriter;
use super::generator::DraftGenerator;
use super::generator::GenerationInput;
use super::generator::GenerationSettings;
use super::service_factory::create_stores;
use super::tiering::ReplyStrategy;
use super::tiering::StrategyKind;
use super::tiering::TieringPolicy;
use crate::config::AppConfig;
use crate::errors::ReplyRagError;
use crate::errors::Result;
use crate::llm::CompletionBackend;
use crate::llm::LlmService;
use crate::memory::MemoryRetriever;
use crate::memory::MemorySearch;
use crate::memory::MemorySearchClient;
use crate::memory::RetrievalSettings;
use crate::memory::RetrievalTrace;
use crate::models::ConversationTurn;
use crate::models::PersonaProfile;
use crate::models::ReplyDraftSet;
use crate::models::ReplyRequest;
use crate::stores::DraftCacheStore;
use crate::stores::HistoryStore;
use crate::stores::PersonaStore;

/// States a request moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Retrieving,
    ExactReuse,
    Adapting,
    Generating,
    Caching,
    Completed,
    Errored,
}

/// Drafts plus how they were produced
#[derive(Debug, Clone, Serialize)]
pub struct ReplyOutcome {
    pub request_id: Uuid,
    pub drafts: ReplyDraftSet,
    pub strategy: StrategyKind,
    pub retrieval: RetrievalTrace,
    pub cache: CacheStatus,
    pub stages: Vec<PipelineStage>,
}

/// External collaborators the pipeline is wired from
pub struct Collaborators {
    pub memory_search: Arc<dyn MemorySearch>,
    pub llm: Arc<dyn CompletionBackend>,
    pub personas: Arc<dyn PersonaStore>,
    pub history: Arc<dyn HistoryStore>,
    pub cache: Arc<dyn DraftCacheStore>,
}

/// Request-level knobs from `[pipeline]` and `[generation]`
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub deadline: Duration,
    pub default_persona_key: String,
    pub history_window: usize,
}

impl PipelineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            deadline: config.pipeline_deadline(),
            default_persona_key: config.pipeline.default_persona_key.clone(),
            history_window: config.generation.history_window,
        }
    }
}

/// Complete reply suggestion service
pub struct ReplyService {
    retriever: MemoryRetriever,
    tiering: TieringPolicy,
    adapter: MemoryAdapter,
    generator: DraftGenerator,
    cache_writer: DraftCacheWriter,
    personas: Arc<dyn PersonaStore>,
    history: Arc<dyn HistoryStore>,
    settings: PipelineSettings,
}

impl ReplyService {
    /// Create a new reply service from configuration
    ///
    /// # Errors
    /// - HTTP client build errors for the LLM or memory search clients
    /// - Database connection errors, seed file errors
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let llm: Arc<dyn CompletionBackend> = Arc::new(LlmService::new(config)?);
        let memory_search: Arc<dyn MemorySearch> =
            Arc::new(MemorySearchClient::from_app_config(config)?);
        if !config.retrieval_configured() {
            warn!("Memory search is not configured; every request will use full generation");
        }

        let stores = create_stores(config).await?;
        info!(
            "Reply service ready (llm={}, model={}, stores={})",
            config.llm_endpoint(),
            config.llm_model(),
            stores.backend_info
        );

        Ok(Self::from_collaborators(
            Collaborators {
                memory_search,
                llm,
                personas: stores.personas,
                history: stores.history,
                cache: stores.cache,
            },
            config,
        ))
    }

    /// Create from existing collaborators
    #[must_use]
    pub fn from_collaborators(collaborators: Collaborators, config: &AppConfig) -> Self {
        Self {
            retriever: MemoryRetriever::new(
                collaborators.memory_search,
                RetrievalSettings::from_app_config(config),
            ),
            tiering: TieringPolicy::from_config(&config.tiering),
            adapter: MemoryAdapter::from_app_config(collaborators.llm.clone(), config),
            generator: DraftGenerator::new(
                collaborators.llm,
                GenerationSettings::from_app_config(config),
            ),
            cache_writer: DraftCacheWriter::new(collaborators.cache),
            personas: collaborators.personas,
            history: collaborators.history,
            settings: PipelineSettings::from_app_config(config),
        }
    }

    /// Draft cache this service writes to
    #[must_use]
    pub fn draft_cache(&self) -> Arc<dyn DraftCacheStore> {
        self.cache_writer.store()
    }

    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Produce reply drafts for one fan message
    ///
    /// # Errors
    /// - `InvalidRequest` for blank fields (nothing downstream is called)
    /// - `PersonaNotFound` / `Store` when the persona cannot be loaded
    /// - `LlmError` / `MalformedOutput` from adaptation or generation
    /// - `DeadlineExceeded` when retrieval and drafting outlive the deadline
    ///
    /// A cache write that fails or runs past the deadline is reported in
    /// [`ReplyOutcome::cache`] and never fails the request.
    pub async fn suggest(&self, request: ReplyRequest) -> Result<ReplyOutcome> {
        request.validate()?;

        let request_id = Uuid::new_v4();
        let persona_key = request
            .persona_key
            .clone()
            .unwrap_or_else(|| self.settings.default_persona_key.clone());
        let span = tracing::info_span!(
            "reply",
            %request_id,
            conversation_id = %request.conversation_id,
            persona = %persona_key,
        );

        let started = Instant::now();
        let mut stages = vec![PipelineStage::Received];
        let produced = tokio::time::timeout(
            self.settings.deadline,
            self.run(&request, &persona_key, &mut stages)
                .instrument(span.clone()),
        )
        .await;

        let (drafts, strategy, retrieval) = match produced {
            Ok(Ok(produced)) => produced,
            Ok(Err(e)) => {
                stages.push(PipelineStage::Errored);
                error!(%request_id, "Reply failed after {:?}: {}", stages, e);
                return Err(e);
            }
            Err(_) => {
                stages.push(PipelineStage::Errored);
                error!(
                    %request_id,
                    "Reply exceeded deadline of {:?} after {:?}",
                    self.settings.deadline, stages
                );
                return Err(ReplyRagError::DeadlineExceeded(self.settings.deadline));
            }
        };

        // Step 4: Cache onto the latest message, within what is left of the deadline
        stages.push(PipelineStage::Caching);
        let budget = self.settings.deadline.saturating_sub(started.elapsed());
        let cache = self
            .cache_writer
            .write_within(&request.conversation_id, &drafts, budget)
            .instrument(span)
            .await;

        stages.push(PipelineStage::Completed);
        info!(
            %request_id,
            "Reply complete: strategy={}, drafts={}, cache_written={}",
            strategy,
            drafts.populated().len(),
            cache.is_written()
        );
        Ok(ReplyOutcome {
            request_id,
            drafts,
            strategy,
            retrieval,
            cache,
            stages,
        })
    }

    /// [`Self::suggest`] without the trace
    ///
    /// # Errors
    /// Same as [`Self::suggest`].
    pub async fn suggest_drafts(&self, request: ReplyRequest) -> Result<ReplyDraftSet> {
        Ok(self.suggest(request).await?.drafts)
    }

    async fn run(
        &self,
        request: &ReplyRequest,
        persona_key: &str,
        stages: &mut Vec<PipelineStage>,
    ) -> Result<(ReplyDraftSet, StrategyKind, RetrievalTrace)> {
        // Step 1: Retrieve similar past replies
        stages.push(PipelineStage::Retrieving);
        let retrieval = self
            .retriever
            .retrieve(&request.message_text, persona_key)
            .await;

        // Step 2: Pick a strategy from the best match
        let strategy = self.tiering.classify(&retrieval.memories);
        let kind = strategy.kind();
        debug!("Step 2: strategy={} (best={:?})", kind, retrieval.trace.best_score);

        // Step 3: Produce drafts
        let drafts = match strategy {
            ReplyStrategy::ExactReuse(memory) => {
                stages.push(PipelineStage::ExactReuse);
                ReplyDraftSet::for_request(request.reply_type, memory.content)
            }
            ReplyStrategy::Adapt(memory) => {
                stages.push(PipelineStage::Adapting);
                let persona = self.load_persona(persona_key).await?;
                let adapted = self
                    .adapter
                    .adapt(&memory, &request.message_text, &persona)
                    .await?;
                ReplyDraftSet::for_request(request.reply_type, adapted)
            }
            ReplyStrategy::Supplemental(grounding) => {
                stages.push(PipelineStage::Generating);
                self.generate(request, persona_key, &grounding).await?
            }
            ReplyStrategy::FullGeneration => {
                stages.push(PipelineStage::Generating);
                self.generate(request, persona_key, &[]).await?
            }
        };

        Ok((drafts, kind, retrieval.trace))
    }

    async fn generate(
        &self,
        request: &ReplyRequest,
        persona_key: &str,
        grounding: &[crate::models::RetrievedMemory],
    ) -> Result<ReplyDraftSet> {
        let persona = self.load_persona(persona_key).await?;
        let history = self.load_history(&request.conversation_id).await;
        let input = GenerationInput {
            persona: &persona,
            history: &history,
            message: &request.message_text,
            grounding,
        };
        self.generator.generate(&input, request.reply_type).await
    }

    async fn load_persona(&self, persona_key: &str) -> Result<PersonaProfile> {
        match self.personas.load_persona(persona_key).await {
            Ok(Some(persona)) => Ok(persona),
            Ok(None) => Err(ReplyRagError::PersonaNotFound(persona_key.to_string())),
            Err(e) => Err(ReplyRagError::Store(format!(
                "failed to load persona '{persona_key}': {e}"
            ))),
        }
    }

    /// History failures degrade to an empty history
    async fn load_history(&self, conversation_id: &str) -> Vec<ConversationTurn> {
        match self
            .history
            .recent_turns(conversation_id, self.settings.history_window)
            .await
        {
            Ok(turns) => turns,
            Err(e) => {
                warn!("Failed to load history for {}: {}, continuing without it", conversation_id, e);
                Vec::new()
            }
        }
    }
}
