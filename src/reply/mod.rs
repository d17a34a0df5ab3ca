//! Reply suggestion pipeline
//!
//! Retrieval finds past creator replies similar to the fan's message, tiering picks
//! a strategy from the best match, and the chosen strategy yields a draft set that is
//! cached onto the conversation's latest message.

pub mod adaptation;
pub mod cache_writer;
pub mod context;
pub mod generator;
pub mod pipeline;
pub mod service_factory;
pub mod tiering;

pub use adaptation::MemoryAdapter;
pub use cache_writer::CacheStatus;
pub use cache_writer::DraftCacheWriter;
pub use context::ContextAssembler;
pub use generator::DraftGenerator;
pub use generator::GenerationInput;
pub use generator::GenerationSettings;
pub use pipeline::Collaborators;
pub use pipeline::PipelineStage;
pub use pipeline::ReplyOutcome;
pub use pipeline::ReplyService;
pub use tiering::ReplyStrategy;
pub use tiering::StrategyKind;
pub use tiering::TieringPolicy;
