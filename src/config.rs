use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::ReplyRagError;

/// Environment variable prefix, e.g. `REPLYRAG__RETRIEVAL__API_KEY`
pub const ENV_PREFIX: &str = "REPLYRAG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_connection_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            enable_cors: false,
        }
    }
}

/// Memory search backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Base URL of the memory search service; retrieval is skipped when unset
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Maximum matches returned
    pub limit: usize,
    /// Relevance floor; matches below are dropped
    pub threshold: f32,
    /// Characters of the fan message sent as the query
    pub query_max_chars: usize,
    pub timeout_secs: u64,
    /// Search scope; defaults to the persona key
    pub scope_tag: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            limit: 3,
            threshold: 0.5,
            query_max_chars: 500,
            timeout_secs: 10,
            scope_tag: None,
        }
    }
}

/// Similarity cut-offs for choosing a reply strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TieringConfig {
    pub exact_reuse: f32,
    pub adaptation: f32,
    pub supplemental: f32,
}

impl Default for TieringConfig {
    fn default() -> Self {
        Self {
            exact_reuse: 0.90,
            adaptation: 0.75,
            supplemental: 0.60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Most recent conversation turns included in prompts
    pub history_window: usize,
    pub draft_temperature: f32,
    pub adaptation_temperature: f32,
    pub three_draft_max_tokens: usize,
    pub short_max_tokens: usize,
    pub funny_max_tokens: usize,
    pub professional_max_tokens: usize,
    pub adaptation_max_tokens: usize,
    /// Byte budget for supplemental retrieved context
    pub max_context_length: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            history_window: 100,
            draft_temperature: 0.7,
            adaptation_temperature: 0.2,
            three_draft_max_tokens: 800,
            short_max_tokens: 80,
            funny_max_tokens: 160,
            professional_max_tokens: 400,
            adaptation_max_tokens: 300,
            max_context_length: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub llm_endpoint: String,
    pub llm_key: String,
    pub llm_model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: "http://localhost:11434".to_string(),
            llm_key: "ollama".to_string(),
            llm_model: "gemma3:27b".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Overall deadline for one reply request
    pub deadline_secs: u64,
    pub default_persona_key: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline_secs: 60,
            default_persona_key: "default".to_string(),
        }
    }
}

/// In-memory store settings, used when no database is configured
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoresConfig {
    /// JSON file with personas and conversations to preload
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub retrieval: RetrievalConfig,
    pub tiering: TieringConfig,
    pub generation: GenerationConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub stores: StoresConfig,
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        Self::load_from(Some(path.as_ref()))
    }

    /// Layer an optional TOML file and `REPLYRAG__*` environment variables over the defaults
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(ReplyRagError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Config file not found: {}", path.display()),
                )));
            }
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            eprintln!(
                "Warning: Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Self::load_from(None)
        }
    }

    /// Check ranges and ordering that serde cannot express
    pub fn validate(&self) -> crate::Result<()> {
        let t = &self.tiering;
        for (name, value) in [
            ("tiering.exact_reuse", t.exact_reuse),
            ("tiering.adaptation", t.adaptation),
            ("tiering.supplemental", t.supplemental),
            ("retrieval.threshold", self.retrieval.threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReplyRagError::ConfigError(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if !(t.supplemental <= t.adaptation && t.adaptation <= t.exact_reuse) {
            return Err(ReplyRagError::ConfigError(format!(
                "tiering thresholds must satisfy supplemental <= adaptation <= exact_reuse, got {} / {} / {}",
                t.supplemental, t.adaptation, t.exact_reuse
            )));
        }

        if self.retrieval.limit == 0 {
            return Err(ReplyRagError::ConfigError(
                "retrieval.limit must be at least 1".to_string(),
            ));
        }
        if self.retrieval.query_max_chars == 0 {
            return Err(ReplyRagError::ConfigError(
                "retrieval.query_max_chars must be at least 1".to_string(),
            ));
        }
        if self.generation.history_window == 0 {
            return Err(ReplyRagError::ConfigError(
                "generation.history_window must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("generation.draft_temperature", self.generation.draft_temperature),
            (
                "generation.adaptation_temperature",
                self.generation.adaptation_temperature,
            ),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ReplyRagError::ConfigError(format!(
                    "{name} must be within [0, 2], got {value}"
                )));
            }
        }
        if self.pipeline.deadline_secs == 0 {
            return Err(ReplyRagError::ConfigError(
                "pipeline.deadline_secs must be at least 1".to_string(),
            ));
        }
        if self.pipeline.default_persona_key.trim().is_empty() {
            return Err(ReplyRagError::ConfigError(
                "pipeline.default_persona_key must not be empty".to_string(),
            ));
        }

        if let Some(endpoint) = &self.retrieval.endpoint {
            parse_endpoint("retrieval.endpoint", endpoint)?;
        }
        parse_endpoint("llm.llm_endpoint", &self.llm.llm_endpoint)?;

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// True when both retrieval endpoint and credentials are present
    pub fn retrieval_configured(&self) -> bool {
        self.retrieval.endpoint.is_some() && self.retrieval.api_key.is_some()
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM key
    pub fn llm_key(&self) -> &str {
        &self.llm.llm_key
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Get the whole-pipeline deadline
    pub fn pipeline_deadline(&self) -> Duration {
        Duration::from_secs(self.pipeline.deadline_secs)
    }
}

fn parse_endpoint(name: &str, value: &str) -> crate::Result<url::Url> {
    url::Url::parse(value)
        .map_err(|e| ReplyRagError::ConfigError(format!("{name} is not a valid URL ({value}): {e}")))
}
