/*!
# personaforge-llm

LLM collaborator seam used by the Pipeline Orchestrator (C12, spec §4.12
step 8): a small async trait plus the retry/timeout/fallback policy that
wraps it so a down or slow provider degrades to an in-character apology
instead of an error.

An optional HTTP-backed implementation lives behind the `http` feature,
mirroring `personaforge-embeddings::http`'s shape.
*/

mod client;
mod fallback;
mod http;
mod resilience;
mod retry;

pub use client::{AlwaysErrLlm, LlmClient, MockLlm};
pub use fallback::fallback_reply;
#[cfg(feature = "http")]
pub use http::HttpLlmClient;
pub use resilience::ResilientLlm;
pub use retry::RetryConfig;
