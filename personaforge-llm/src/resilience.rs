//! Soft-timeout + single-retry wrapper around [`LlmClient::complete`], spec
//! §4.12 step 8: "Invoke LLM collaborator; on failure, return a graceful
//! in-character apology fallback. No retry more than once."
//!
//! This never returns an error — the Orchestrator always gets a `String` it
//! can hand to the transport, even when the collaborator is down.

use std::sync::Arc;
use std::time::Duration;

use personaforge_types::LlmMessage;

use crate::client::LlmClient;
use crate::fallback::fallback_reply;
use crate::retry::RetryConfig;

/// Holds an `Arc<dyn LlmClient>` rather than borrowing so it can live
/// inside the Orchestrator alongside its other `Arc`-held collaborators.
pub struct ResilientLlm {
    pub client: Arc<dyn LlmClient>,
    pub retry: RetryConfig,
    pub soft_timeout: Duration,
}

impl ResilientLlm {
    pub fn new(client: Arc<dyn LlmClient>, retry: RetryConfig, soft_timeout: Duration) -> Self {
        Self { client, retry, soft_timeout }
    }

    /// `fallback_seed` only picks which canned apology to use on failure; it
    /// carries no meaning beyond varying the reply text.
    pub async fn complete_or_fallback(&self, messages: &[LlmMessage], fallback_seed: usize) -> String {
        let mut attempt = 0;
        loop {
            match tokio::time::timeout(self.soft_timeout, self.client.complete(messages)).await {
                Ok(Ok(reply)) => return reply,
                Ok(Err(err)) => {
                    if err.is_retryable() && attempt + 1 < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff_for_attempt(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    tracing::warn!(error = %err, "llm collaborator failed, using fallback reply");
                    return fallback_reply(fallback_seed).to_string();
                }
                Err(_elapsed) => {
                    tracing::warn!(timeout_ms = self.soft_timeout.as_millis() as u64, "llm collaborator timed out, using fallback reply");
                    return fallback_reply(fallback_seed).to_string();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AlwaysErrLlm, MockLlm};
    use personaforge_types::LlmRole;

    fn messages() -> Vec<LlmMessage> {
        vec![LlmMessage { role: LlmRole::User, content: "hi".to_string() }]
    }

    #[tokio::test]
    async fn successful_call_returns_reply_untouched() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::new("hello there"));
        let resilient = ResilientLlm::new(llm, RetryConfig::disabled(), Duration::from_secs(1));
        let reply = resilient.complete_or_fallback(&messages(), 0).await;
        assert_eq!(reply, "hello there");
    }

    #[tokio::test]
    async fn persistent_failure_falls_back_without_erroring() {
        let llm: Arc<dyn LlmClient> = Arc::new(AlwaysErrLlm);
        let resilient = ResilientLlm::new(llm, RetryConfig::production(), Duration::from_secs(1));
        let reply = resilient.complete_or_fallback(&messages(), 1).await;
        assert!(!reply.is_empty());
    }
}
