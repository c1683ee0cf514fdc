//! Pipeline configuration, spec §6 and Design Note "Global process-wide
//! configuration access": a value constructed once at startup and passed
//! explicitly into every component's constructor. Nothing in this workspace
//! reads a global.

use crate::message::IdentityLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub persona_default: String,

    pub vector_store_host: String,
    pub vector_store_port: u16,

    pub relational_host: Option<String>,
    pub relational_port: Option<u16>,
    pub relational_db: String,
    pub relational_user: Option<String>,
    pub relational_password: Option<String>,

    pub timeseries_url: Option<String>,
    pub timeseries_token: Option<String>,
    pub timeseries_org: Option<String>,
    pub timeseries_bucket: Option<String>,

    pub cache_mode: CacheMode,
    pub cache_host: Option<String>,
    pub cache_port: Option<u16>,
    pub conversation_cache_timeout_minutes: i64,
    pub conversation_cache_bootstrap_limit: usize,
    pub conversation_cache_max_local: usize,

    pub session_inactivity_minutes: i64,
    pub summarization_threshold: usize,

    pub max_context_tokens: usize,
    pub strict_immersive_mode: bool,

    pub identity_level: IdentityLevel,

    pub llm_url: Option<String>,
    pub llm_key: Option<String>,
    pub llm_model: String,

    pub embedding_dim: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheMode {
    InMemory,
    External,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            persona_default: "default".to_string(),
            vector_store_host: "localhost".to_string(),
            vector_store_port: 6333,
            relational_host: None,
            relational_port: None,
            relational_db: "personaforge.db".to_string(),
            relational_user: None,
            relational_password: None,
            timeseries_url: None,
            timeseries_token: None,
            timeseries_org: None,
            timeseries_bucket: None,
            cache_mode: CacheMode::InMemory,
            cache_host: None,
            cache_port: None,
            conversation_cache_timeout_minutes: 15,
            conversation_cache_bootstrap_limit: 20,
            conversation_cache_max_local: 50,
            session_inactivity_minutes: 30,
            summarization_threshold: 8,
            max_context_tokens: 8000,
            strict_immersive_mode: true,
            identity_level: IdentityLevel::Contextualized,
            llm_url: None,
            llm_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            embedding_dim: 384,
        }
    }
}

impl PipelineConfig {
    /// Load overrides from environment variables, falling back to
    /// `Default::default()` for anything unset. Plain `std::env::var`
    /// reads rather than pulling in a config-file crate.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        macro_rules! env_str {
            ($key:literal, $field:expr) => {
                if let Ok(v) = std::env::var($key) {
                    $field = v;
                }
            };
        }
        macro_rules! env_opt {
            ($key:literal, $field:expr) => {
                if let Ok(v) = std::env::var($key) {
                    $field = Some(v);
                }
            };
        }
        macro_rules! env_parse {
            ($key:literal, $field:expr) => {
                if let Ok(v) = std::env::var($key) {
                    if let Ok(parsed) = v.parse() {
                        $field = parsed;
                    }
                }
            };
        }

        env_str!("PERSONA_DEFAULT", cfg.persona_default);
        env_str!("VECTOR_STORE_HOST", cfg.vector_store_host);
        env_parse!("VECTOR_STORE_PORT", cfg.vector_store_port);
        env_opt!("RELATIONAL_HOST", cfg.relational_host);
        env_parse!("RELATIONAL_PORT", cfg.relational_port);
        env_str!("RELATIONAL_DB", cfg.relational_db);
        env_opt!("RELATIONAL_USER", cfg.relational_user);
        env_opt!("RELATIONAL_PASSWORD", cfg.relational_password);
        env_opt!("TIMESERIES_URL", cfg.timeseries_url);
        env_opt!("TIMESERIES_TOKEN", cfg.timeseries_token);
        env_opt!("TIMESERIES_ORG", cfg.timeseries_org);
        env_opt!("TIMESERIES_BUCKET", cfg.timeseries_bucket);
        env_parse!("CONVERSATION_CACHE_TIMEOUT_MINUTES", cfg.conversation_cache_timeout_minutes);
        env_parse!("CONVERSATION_CACHE_BOOTSTRAP_LIMIT", cfg.conversation_cache_bootstrap_limit);
        env_parse!("CONVERSATION_CACHE_MAX_LOCAL", cfg.conversation_cache_max_local);
        env_parse!("SESSION_INACTIVITY_MINUTES", cfg.session_inactivity_minutes);
        env_parse!("SUMMARIZATION_THRESHOLD", cfg.summarization_threshold);
        env_parse!("MAX_CONTEXT_TOKENS", cfg.max_context_tokens);
        env_parse!("STRICT_IMMERSIVE_MODE", cfg.strict_immersive_mode);
        env_opt!("LLM_URL", cfg.llm_url);
        env_opt!("LLM_KEY", cfg.llm_key);
        env_str!("LLM_MODEL", cfg.llm_model);
        env_parse!("EMBEDDING_DIM", cfg.embedding_dim);

        if let Ok(v) = std::env::var("IDENTITY_LEVEL") {
            cfg.identity_level = match v.to_ascii_lowercase().as_str() {
                "identified" => IdentityLevel::Identified,
                "anonymous" => IdentityLevel::Anonymous,
                _ => IdentityLevel::Contextualized,
            };
        }
        if let Ok(v) = std::env::var("CACHE_MODE") {
            cfg.cache_mode = match v.to_ascii_lowercase().as_str() {
                "external" => CacheMode::External,
                _ => CacheMode::InMemory,
            };
        }

        cfg
    }
}
