//! Shared fakes for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use replyrag::config::AppConfig;
use replyrag::llm::CompletionBackend;
use replyrag::llm::CompletionRequest;
use replyrag::memory::MemoryHit;
use replyrag::memory::MemoryQuery;
use replyrag::memory::MemorySearch;
use replyrag::memory::RetrievalError;
use replyrag::models::CacheRecord;
use replyrag::models::ConversationTurn;
use replyrag::models::MessageHandle;
use replyrag::models::PersonaProfile;
use replyrag::reply::Collaborators;
use replyrag::stores::DraftCacheStore;
use replyrag::stores::InMemoryStore;
use replyrag::stores::PersonaStore;
use replyrag::ReplyRagError;
use replyrag::ReplyService;
use replyrag::Result;

pub const CONVERSATION: &str = "conv-1";
pub const PERSONA: &str = "default";

/// Completion backend returning queued responses in order
#[derive(Default)]
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(responses: &[&str]) -> Self {
        let scripted = Self::new();
        for response in responses {
            scripted.push_ok(response);
        }
        scripted
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_ok(&self, response: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(response.to_string()));
    }

    pub fn push_err(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ReplyRagError::LlmError(message)),
            None => Err(ReplyRagError::LlmError("no scripted response left".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Memory search returning a fixed outcome and recording queries
pub struct ScriptedSearch {
    outcome: std::result::Result<Vec<MemoryHit>, RetrievalError>,
    queries: Mutex<Vec<MemoryQuery>>,
}

impl ScriptedSearch {
    pub fn hits(hits: Vec<MemoryHit>) -> Self {
        Self {
            outcome: Ok(hits),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::hits(Vec::new())
    }

    pub fn failing(err: RetrievalError) -> Self {
        Self {
            outcome: Err(err),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<MemoryQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemorySearch for ScriptedSearch {
    async fn search(
        &self,
        query: &MemoryQuery,
    ) -> std::result::Result<Vec<MemoryHit>, RetrievalError> {
        self.queries.lock().unwrap().push(query.clone());
        self.outcome.clone()
    }
}

/// Persona store whose backend is always down
pub struct FailingPersonaStore;

#[async_trait]
impl PersonaStore for FailingPersonaStore {
    async fn load_persona(&self, _persona_key: &str) -> Result<Option<PersonaProfile>> {
        Err(ReplyRagError::Store("connection refused".to_string()))
    }
}

/// Draft cache counting writes before delegating to an in-memory store
/// How a [`CountingCache`] misbehaves
#[derive(Debug, Clone)]
pub enum CacheFault {
    LookupError(String),
    WriteError(String),
    WriteDelay(Duration),
}

pub struct CountingCache {
    inner: Arc<InMemoryStore>,
    writes: AtomicUsize,
    fault: Option<CacheFault>,
}

impl CountingCache {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            fault: None,
        }
    }

    pub fn with_fault(mut self, fault: CacheFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DraftCacheStore for CountingCache {
    async fn latest_message(&self, conversation_id: &str) -> Result<Option<MessageHandle>> {
        if let Some(CacheFault::LookupError(msg)) = &self.fault {
            return Err(ReplyRagError::Store(msg.clone()));
        }
        self.inner.latest_message(conversation_id).await
    }

    async fn write_drafts(&self, record: &CacheRecord) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match &self.fault {
            Some(CacheFault::WriteError(msg)) => return Err(ReplyRagError::Store(msg.clone())),
            Some(CacheFault::WriteDelay(delay)) => tokio::time::sleep(*delay).await,
            _ => {}
        }
        self.inner.write_drafts(record).await
    }

    async fn cached_drafts(&self, conversation_id: &str) -> Result<Option<CacheRecord>> {
        self.inner.cached_drafts(conversation_id).await
    }
}

pub fn persona() -> PersonaProfile {
    PersonaProfile {
        personality: "Upbeat indie game streamer".to_string(),
        tone: "casual, warm, a few emoji".to_string(),
        voice_examples: vec![
            "omg thank you!! 💖".to_string(),
            "see you at 7 tonight 🎮".to_string(),
        ],
        avoid_list: vec!["sharing my address".to_string()],
        signature: None,
    }
}

pub fn turn(sender: &str, text: &str, timestamp_millis: i64) -> ConversationTurn {
    ConversationTurn {
        sender_label: sender.to_string(),
        text: text.to_string(),
        timestamp_millis,
    }
}

/// Store with the default persona and a two-message conversation
pub fn seeded_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    store.put_persona(PERSONA, persona());
    store.push_turn(CONVERSATION, turn("creator", "hey! thanks for the follow", 1_000));
    store.push_turn(CONVERSATION, turn("fan", "What time do you stream?", 2_000));
    Arc::new(store)
}

/// Fully wired service plus handles on every fake
pub struct Harness {
    pub service: Arc<ReplyService>,
    pub llm: Arc<ScriptedCompletion>,
    pub search: Arc<ScriptedSearch>,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<CountingCache>,
}

pub fn harness(search: ScriptedSearch, llm: ScriptedCompletion) -> Harness {
    harness_with(search, llm, seeded_store(), &AppConfig::default())
}

pub fn harness_with(
    search: ScriptedSearch,
    llm: ScriptedCompletion,
    store: Arc<InMemoryStore>,
    config: &AppConfig,
) -> Harness {
    let cache = CountingCache::new(store.clone());
    harness_with_cache(search, llm, store, cache, config)
}

pub fn harness_with_cache(
    search: ScriptedSearch,
    llm: ScriptedCompletion,
    store: Arc<InMemoryStore>,
    cache: CountingCache,
    config: &AppConfig,
) -> Harness {
    let llm = Arc::new(llm);
    let search = Arc::new(search);
    let cache = Arc::new(cache);
    let service = Arc::new(ReplyService::from_collaborators(
        Collaborators {
            memory_search: search.clone(),
            llm: llm.clone(),
            personas: store.clone(),
            history: store.clone(),
            cache: cache.clone(),
        },
        config,
    ));
    Harness {
        service,
        llm,
        search,
        store,
        cache,
    }
}

pub fn three_drafts_json(short: &str, medium: &str, detailed: &str) -> String {
    serde_json::json!({"short": short, "medium": medium, "detailed": detailed}).to_string()
}
