//! End-to-end reply pipeline tests over in-process fakes

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use replyrag::config::AppConfig;
use replyrag::memory::MemoryHit;
use replyrag::memory::RetrievalError;
use replyrag::memory::RetrievalStatus;
use replyrag::models::ReplyRequest;
use replyrag::models::ReplyType;
use replyrag::reply::CacheStatus;
use replyrag::reply::Collaborators;
use replyrag::reply::PipelineStage;
use replyrag::reply::StrategyKind;
use replyrag::stores::DraftCacheStore;
use replyrag::stores::InMemoryStore;
use replyrag::ErrorCategory;
use replyrag::ReplyRagError;
use replyrag::ReplyService;

const STREAM_REPLY: &str = "I stream Mon–Fri at 7pm EST!";

fn request(message: &str) -> ReplyRequest {
    ReplyRequest::new(CONVERSATION, message)
}

// ====== Exact Reuse ======

#[tokio::test]
async fn test_exact_reuse_fills_every_slot_without_llm() {
    let h = harness(
        ScriptedSearch::hits(vec![MemoryHit::new(STREAM_REPLY, 0.95)]),
        ScriptedCompletion::new(),
    );

    let outcome = h
        .service
        .suggest(request("What time do you stream?"))
        .await
        .unwrap();

    assert_eq!(outcome.drafts.short, STREAM_REPLY);
    assert_eq!(outcome.drafts.medium, STREAM_REPLY);
    assert_eq!(outcome.drafts.detailed, STREAM_REPLY);
    assert_eq!(outcome.strategy, StrategyKind::ExactReuse);
    assert_eq!(h.llm.call_count(), 0);
    assert!(outcome.cache.is_written());
    assert_eq!(
        outcome.stages,
        vec![
            PipelineStage::Received,
            PipelineStage::Retrieving,
            PipelineStage::ExactReuse,
            PipelineStage::Caching,
            PipelineStage::Completed,
        ]
    );
}

#[tokio::test]
async fn test_exact_reuse_with_reply_type_fills_one_slot() {
    let h = harness(
        ScriptedSearch::hits(vec![MemoryHit::new(STREAM_REPLY, 0.91)]),
        ScriptedCompletion::new(),
    );

    let drafts = h
        .service
        .suggest_drafts(request("stream time?").with_reply_type(ReplyType::Professional))
        .await
        .unwrap();

    assert_eq!(drafts.detailed, STREAM_REPLY);
    assert!(drafts.short.is_empty());
    assert!(drafts.medium.is_empty());
}

#[tokio::test]
async fn test_exact_reuse_does_not_need_a_persona() {
    let h = harness_with(
        ScriptedSearch::hits(vec![MemoryHit::new(STREAM_REPLY, 0.97)]),
        ScriptedCompletion::new(),
        Arc::new(InMemoryStore::new()),
        &AppConfig::default(),
    );

    let outcome = h.service.suggest(request("when live?")).await.unwrap();
    assert_eq!(outcome.drafts.short, STREAM_REPLY);
    assert_eq!(outcome.cache, CacheStatus::SkippedNoMessage);
}

// ====== Adaptation ======

#[tokio::test]
async fn test_adaptation_rewrites_memory_at_low_temperature() {
    let h = harness(
        ScriptedSearch::hits(vec![MemoryHit::new("I stream Mon–Fri at 7pm EST, Jo!", 0.80)]),
        ScriptedCompletion::replying(&["I stream Mon–Fri at 7pm EST, Sam!"]),
    );

    let outcome = h
        .service
        .suggest(request("hey it's Sam, when do you stream?"))
        .await
        .unwrap();

    assert_eq!(outcome.strategy, StrategyKind::Adaptation);
    assert_eq!(outcome.drafts.short, "I stream Mon–Fri at 7pm EST, Sam!");
    assert_eq!(outcome.drafts.short, outcome.drafts.detailed);

    let requests = h.llm.requests();
    assert_eq!(requests.len(), 1);
    assert!((requests[0].temperature - 0.2).abs() < f32::EPSILON);
    assert!(requests[0].prompt.contains("I stream Mon–Fri at 7pm EST, Jo!"));
    assert!(requests[0].prompt.contains("hey it's Sam"));
}

#[tokio::test]
async fn test_empty_adaptation_falls_back_to_memory_text() {
    let h = harness(
        ScriptedSearch::hits(vec![MemoryHit::new(STREAM_REPLY, 0.78)]),
        ScriptedCompletion::replying(&["   "]),
    );

    let outcome = h.service.suggest(request("stream?")).await.unwrap();
    assert_eq!(outcome.drafts.medium, STREAM_REPLY);
}

#[tokio::test]
async fn test_adaptation_failure_is_an_error() {
    let llm = ScriptedCompletion::new();
    llm.push_err("503 upstream");
    let h = harness(
        ScriptedSearch::hits(vec![MemoryHit::new(STREAM_REPLY, 0.8)]),
        llm,
    );

    let err = h.service.suggest(request("stream?")).await.unwrap_err();
    assert!(err.is_generation_failure());
    assert_eq!(h.cache.writes(), 0);
}

// ====== Generation ======

#[tokio::test]
async fn test_full_generation_three_drafts_of_increasing_length() {
    let h = harness(
        ScriptedSearch::empty(),
        ScriptedCompletion::replying(&[&three_drafts_json(
            "Yes, send it over!",
            "I'd love to hear it! Send me the link and I'll listen this week.",
            "Absolutely, I'd love to! Send me the link in DMs. I try to listen to every demo I get, \
             so give me a few days. I'll send you some honest notes once I've had a proper listen.",
        )]),
    );

    let outcome = h
        .service
        .suggest(request("Can you review my demo?"))
        .await
        .unwrap();

    let drafts = &outcome.drafts;
    assert_eq!(outcome.strategy, StrategyKind::FullGeneration);
    assert!(!drafts.short.is_empty());
    assert!(drafts.short.len() < drafts.medium.len());
    assert!(drafts.medium.len() < drafts.detailed.len());
    assert_ne!(drafts.short, drafts.medium);

    let requests = h.llm.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].structured);
    assert!(requests[0].system.contains("Upbeat indie game streamer"));
    assert!(requests[0].system.contains("fan: What time do you stream?"));
    assert!(!requests[0].system.contains("Past reply"));
}

#[tokio::test]
async fn test_single_draft_only_populates_mapped_slot() {
    let h = harness(
        ScriptedSearch::empty(),
        ScriptedCompletion::replying(&["Sure thing!"]),
    );

    let drafts = h
        .service
        .suggest_drafts(request("Can you review my demo?").with_reply_type(ReplyType::Short))
        .await
        .unwrap();

    assert_eq!(drafts.short, "Sure thing!");
    assert_eq!(drafts.medium, "");
    assert_eq!(drafts.detailed, "");
    assert_eq!(h.llm.requests()[0].max_tokens, Some(80));
}

#[tokio::test]
async fn test_supplemental_context_only_includes_matches_above_floor() {
    let h = harness(
        ScriptedSearch::hits(vec![
            MemoryHit::new("I use a Shure SM7B mic", 0.70),
            MemoryHit::new("My camera is a Sony a6400", 0.62),
            MemoryHit::new("I love pineapple pizza", 0.55),
        ]),
        ScriptedCompletion::replying(&[&three_drafts_json("a", "bb", "ccc")]),
    );

    let outcome = h
        .service
        .suggest(request("what's your streaming setup?"))
        .await
        .unwrap();

    assert_eq!(outcome.strategy, StrategyKind::SupplementalGeneration);
    let system = &h.llm.requests()[0].system;
    assert!(system.contains("I use a Shure SM7B mic"));
    assert!(system.contains("My camera is a Sony a6400"));
    assert!(!system.contains("pineapple"));
}

#[tokio::test]
async fn test_weak_matches_are_not_sent_to_the_llm() {
    let h = harness(
        ScriptedSearch::hits(vec![MemoryHit::new("unrelated past reply", 0.58)]),
        ScriptedCompletion::replying(&[&three_drafts_json("a", "bb", "ccc")]),
    );

    let outcome = h.service.suggest(request("favorite snack?")).await.unwrap();

    assert_eq!(outcome.strategy, StrategyKind::FullGeneration);
    let sent = &h.llm.requests()[0];
    assert!(!sent.system.contains("unrelated past reply"));
    assert!(!sent.prompt.contains("unrelated past reply"));
}

#[tokio::test]
async fn test_malformed_generation_output_is_an_error() {
    let h = harness(
        ScriptedSearch::empty(),
        ScriptedCompletion::replying(&[r#"{"short": "hi", "medium": "hello"}"#]),
    );

    let err = h.service.suggest(request("hey")).await.unwrap_err();
    assert!(matches!(err, ReplyRagError::MalformedOutput(_)));
    assert_eq!(h.cache.writes(), 0);
}

// ====== Retrieval Degradation ======

#[tokio::test]
async fn test_retrieval_failure_falls_back_to_full_generation() {
    let h = harness(
        ScriptedSearch::failing(RetrievalError::Unreachable("connect timeout".to_string())),
        ScriptedCompletion::replying(&[&three_drafts_json("a", "bb", "ccc")]),
    );

    let outcome = h.service.suggest(request("hello!")).await.unwrap();

    assert_eq!(outcome.strategy, StrategyKind::FullGeneration);
    assert_eq!(outcome.retrieval.status, RetrievalStatus::Unreachable);
    assert_eq!(outcome.retrieval.hits_kept, 0);
    assert_eq!(h.llm.call_count(), 1);
}

#[tokio::test]
async fn test_retrieval_query_is_scoped_and_truncated() {
    let h = harness(
        ScriptedSearch::empty(),
        ScriptedCompletion::replying(&[&three_drafts_json("a", "bb", "ccc")]),
    );
    let long_message = "x".repeat(900);

    h.service.suggest(request(&long_message)).await.unwrap();

    let queries = h.search.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].text.chars().count(), 500);
    assert_eq!(queries[0].scope_tag, PERSONA);
    assert_eq!(queries[0].limit, 3);
}

// ====== Failures ======

#[tokio::test]
async fn test_blank_fields_are_rejected_before_any_call() {
    let h = harness(ScriptedSearch::empty(), ScriptedCompletion::new());

    for bad in [ReplyRequest::new("", "hello"), ReplyRequest::new(CONVERSATION, "   ")] {
        let err = h.service.suggest(bad).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Client);
    }

    assert!(h.search.queries().is_empty());
    assert_eq!(h.llm.call_count(), 0);
    assert_eq!(h.cache.writes(), 0);
}

#[tokio::test]
async fn test_missing_persona_fails_without_cache_write() {
    let h = harness(
        ScriptedSearch::empty(),
        ScriptedCompletion::replying(&[&three_drafts_json("a", "bb", "ccc")]),
    );

    let err = h
        .service
        .suggest(request("hi").with_persona_key("someone-else"))
        .await
        .unwrap_err();

    assert!(matches!(err, ReplyRagError::PersonaNotFound(ref key) if key == "someone-else"));
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert_eq!(h.llm.call_count(), 0);
    assert_eq!(h.cache.writes(), 0);
}

#[tokio::test]
async fn test_persona_store_failure_is_a_store_error() {
    let store = seeded_store();
    let llm = Arc::new(ScriptedCompletion::new());
    let service = ReplyService::from_collaborators(
        Collaborators {
            memory_search: Arc::new(ScriptedSearch::empty()),
            llm: llm.clone(),
            personas: Arc::new(FailingPersonaStore),
            history: store.clone(),
            cache: store,
        },
        &AppConfig::default(),
    );

    let err = service.suggest(request("hi")).await.unwrap_err();
    assert!(matches!(err, ReplyRagError::Store(_)));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_deadline_exceeded_returns_no_drafts() {
    let mut config = AppConfig::default();
    config.pipeline.deadline_secs = 1;
    let h = harness_with(
        ScriptedSearch::empty(),
        ScriptedCompletion::replying(&[&three_drafts_json("a", "bb", "ccc")])
            .with_delay(Duration::from_secs(5)),
        seeded_store(),
        &config,
    );

    let err = h.service.suggest(request("hello?")).await.unwrap_err();
    assert!(matches!(err, ReplyRagError::DeadlineExceeded(_)));
    assert_eq!(err.category(), ErrorCategory::Timeout);
    assert_eq!(h.cache.writes(), 0);
}

// ====== Caching ======

#[tokio::test]
async fn test_repeated_request_overwrites_cached_drafts() {
    let h = harness(
        ScriptedSearch::empty(),
        ScriptedCompletion::replying(&[
            &three_drafts_json("first", "first!!", "first!!!"),
            &three_drafts_json("second", "second!!", "second!!!"),
        ]),
    );

    let first = h.service.suggest(request("hi")).await.unwrap();
    let second = h.service.suggest(request("hi")).await.unwrap();

    let CacheStatus::Written { message_id } = second.cache else {
        panic!("expected cache write, got {:?}", second.cache);
    };
    assert_eq!(first.cache, second.cache);
    let record = h.store.drafts_for_message(message_id).unwrap();
    assert_eq!(record.drafts, second.drafts);
    assert_ne!(record.drafts, first.drafts);
    assert_eq!(record.conversation_id, CONVERSATION);
    assert_eq!(h.cache.writes(), 2);

    let cached = h.cache.cached_drafts(CONVERSATION).await.unwrap().unwrap();
    assert_eq!(cached.drafts, second.drafts);
}

#[tokio::test]
async fn test_cache_write_error_still_returns_drafts() {
    let store = seeded_store();
    let cache = CountingCache::new(store.clone())
        .with_fault(CacheFault::WriteError("disk full".to_string()));
    let h = harness_with_cache(
        ScriptedSearch::hits(vec![MemoryHit::new(STREAM_REPLY, 0.95)]),
        ScriptedCompletion::new(),
        store,
        cache,
        &AppConfig::default(),
    );

    let outcome = h.service.suggest(request("What time do you stream?")).await.unwrap();

    assert_eq!(outcome.drafts.short, STREAM_REPLY);
    assert_eq!(
        outcome.cache,
        CacheStatus::Failed {
            reason: "Store error: disk full".to_string()
        }
    );
    assert_eq!(outcome.stages.last(), Some(&PipelineStage::Completed));
    assert!(h.store.cached_drafts(CONVERSATION).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_lookup_error_still_returns_drafts() {
    let store = seeded_store();
    let cache = CountingCache::new(store.clone())
        .with_fault(CacheFault::LookupError("connection reset".to_string()));
    let h = harness_with_cache(
        ScriptedSearch::empty(),
        ScriptedCompletion::replying(&[&three_drafts_json("a", "bb", "ccc")]),
        store,
        cache,
        &AppConfig::default(),
    );

    let outcome = h.service.suggest(request("hello?")).await.unwrap();

    assert_eq!(outcome.drafts.detailed, "ccc");
    assert!(matches!(outcome.cache, CacheStatus::Failed { .. }));
    assert_eq!(h.cache.writes(), 0);
}

#[tokio::test]
async fn test_slow_cache_write_is_reported_not_a_deadline_error() {
    let mut config = AppConfig::default();
    config.pipeline.deadline_secs = 1;
    let store = seeded_store();
    let cache = CountingCache::new(store.clone())
        .with_fault(CacheFault::WriteDelay(Duration::from_secs(5)));
    let h = harness_with_cache(
        ScriptedSearch::hits(vec![MemoryHit::new(STREAM_REPLY, 0.95)]),
        ScriptedCompletion::new(),
        store,
        cache,
        &config,
    );

    let started = std::time::Instant::now();
    let outcome = h.service.suggest(request("What time do you stream?")).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(outcome.strategy, StrategyKind::ExactReuse);
    assert_eq!(outcome.drafts.medium, STREAM_REPLY);
    assert!(matches!(&outcome.cache, CacheStatus::Failed { reason } if reason.starts_with("timed out")));
    assert_eq!(
        outcome.stages,
        vec![
            PipelineStage::Received,
            PipelineStage::Retrieving,
            PipelineStage::ExactReuse,
            PipelineStage::Caching,
            PipelineStage::Completed,
        ]
    );
}

#[tokio::test]
async fn test_concurrent_requests_share_one_service() {
    let h = harness(
        ScriptedSearch::hits(vec![MemoryHit::new(STREAM_REPLY, 0.99)]),
        ScriptedCompletion::new(),
    );
    let service = h.service.clone();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .suggest_drafts(request(&format!("stream time? #{i}")))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let drafts = handle.await.unwrap().unwrap();
        assert_eq!(drafts.short, STREAM_REPLY);
    }
    assert_eq!(h.cache.writes(), 8);
}
