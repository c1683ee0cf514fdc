//! Error taxonomy shared by every component, per spec §7.
//!
//! Any single branch failure in the Orchestrator collapses to `None` in the
//! fused signals; it is never propagated to the user except as the total
//! pipeline fallback (`PipelineError::Unavailable` on the LLM branch, or a
//! global timeout).

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PipelineError {
    #[error("{component} unavailable: {source}")]
    Unavailable { component: &'static str, source: String },

    #[error("{component} overloaded, retry after {retry_after_ms}ms")]
    Overloaded {
        component: &'static str,
        retry_after_ms: u64,
    },

    #[error("invalid input or record: {reason}")]
    Invalid { reason: String },

    #[error("{component} timed out after {soft_timeout_ms}ms")]
    Timeout {
        component: &'static str,
        soft_timeout_ms: u64,
    },

    #[error("identity spoofing detected for user {user_id} in context {context_id}")]
    Spoofing { context_id: String, user_id: String },

    #[error("suspicious content pattern matched: {pattern}")]
    SuspiciousContent { pattern: String },

    #[error("prompt budget exceeded by {tokens_over} tokens after truncation")]
    BudgetExceeded { tokens_over: usize },

    #[error("{store} failed to persist turn: {source}")]
    PersistenceFailure { store: &'static str, source: String },
}

impl PipelineError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Overloaded { .. } | PipelineError::Unavailable { .. })
    }

    /// A message safe to show a user: never leaks store/model internals.
    pub fn user_safe_message(&self) -> &'static str {
        match self {
            PipelineError::Unavailable { .. } => "I'm having trouble reaching part of my mind right now.",
            PipelineError::Overloaded { .. } => "Give me just a moment, I'm a little overwhelmed.",
            PipelineError::Invalid { .. } => "I couldn't quite make sense of that.",
            PipelineError::Timeout { .. } => "That took longer than expected on my end.",
            PipelineError::Spoofing { .. } => "Something about that message looked off to me.",
            PipelineError::SuspiciousContent { .. } => "Let's keep this conversation on track.",
            PipelineError::BudgetExceeded { .. } => "There's a lot of history here — let me focus.",
            PipelineError::PersistenceFailure { .. } => "I might not remember this perfectly later, sorry.",
        }
    }
}

pub type PResult<T> = Result<T, PipelineError>;
