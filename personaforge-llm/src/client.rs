//! LLM collaborator trait, spec §4.12 step 8. Takes a chat-style message
//! list rather than a bare prompt string: C10 (the Prompt Composer) already
//! outputs `[{role, content}]`, so collapsing it back to one string here
//! would throw away role boundaries the provider needs.

use async_trait::async_trait;
use personaforge_types::{LlmMessage, PipelineError};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[LlmMessage]) -> Result<String, PipelineError>;
}

/// Deterministic, network-free client for tests and as a default when no
/// provider is configured. Echoes a canned in-character reply.
pub struct MockLlm {
    pub reply: String,
}

impl MockLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new("That's interesting, tell me more.")
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, _messages: &[LlmMessage]) -> Result<String, PipelineError> {
        Ok(self.reply.clone())
    }
}

/// Always fails; used to exercise retry/fallback behavior in tests.
pub struct AlwaysErrLlm;

#[async_trait]
impl LlmClient for AlwaysErrLlm {
    async fn complete(&self, _messages: &[LlmMessage]) -> Result<String, PipelineError> {
        Err(PipelineError::Unavailable {
            component: "llm",
            source: "AlwaysErrLlm: simulated failure".to_string(),
        })
    }
}
