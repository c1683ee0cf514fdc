/*!
# personaforge-emotion

Emotion Analyzer (C2): a rule-ordered lexicon classifier (condition →
contribution, evaluated in sequence, with an always-true fallback)
targeting the closed emotion set of §6.

`analyze` never raises: on any internal failure it returns
[`EmotionSignal::neutral_fallback`], matching the "never raises to the
Orchestrator" contract.
*/

mod lexicon;

use async_trait::async_trait;
use personaforge_types::{Emotion, EmotionSignal, UserId};

/// Implemented by anything that can turn text into an emotion read. Both the
/// heuristic classifier and the LLM-backed decorator satisfy this; the
/// Orchestrator only ever holds a `dyn EmotionAnalyzer`.
#[async_trait]
pub trait EmotionAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str, user_id: &UserId, recent_context: &[String]) -> EmotionSignal;
}

/// Default, network-free analyzer: lexicon cue matching plus punctuation and
/// intensifier cues for `intensity`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicEmotionAnalyzer;

#[async_trait]
impl EmotionAnalyzer for HeuristicEmotionAnalyzer {
    async fn analyze(&self, text: &str, _user_id: &UserId, _recent_context: &[String]) -> EmotionSignal {
        lexicon::classify(text)
    }
}

/// Delegates to an LLM for higher accuracy, falling back to the heuristic
/// analyzer on any error — so a flaky backend never surfaces past C2.
pub struct LlmBackedEmotionAnalyzer<B> {
    backend: B,
    fallback: HeuristicEmotionAnalyzer,
}

/// Minimal seam an LLM collaborator must satisfy to back C2. Kept local
/// (rather than depending on `personaforge-llm`) so the emotion analyzer has
/// no knowledge of prompt assembly or provider wiring.
#[async_trait]
pub trait EmotionLlmBackend: Send + Sync {
    async fn classify(&self, text: &str) -> anyhow::Result<EmotionSignal>;
}

impl<B: EmotionLlmBackend> LlmBackedEmotionAnalyzer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            fallback: HeuristicEmotionAnalyzer,
        }
    }
}

#[async_trait]
impl<B: EmotionLlmBackend + Send + Sync> EmotionAnalyzer for LlmBackedEmotionAnalyzer<B> {
    async fn analyze(&self, text: &str, user_id: &UserId, recent_context: &[String]) -> EmotionSignal {
        match self.backend.classify(text).await {
            Ok(signal) => signal,
            Err(err) => {
                tracing::warn!(error = %err, "emotion LLM backend failed, falling back to heuristic");
                self.fallback.analyze(text, user_id, recent_context).await
            }
        }
    }
}

pub use lexicon::classify;
pub use personaforge_types::Emotion as EmotionKind;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn heuristic_never_errors_on_empty_text() {
        let analyzer = HeuristicEmotionAnalyzer;
        let signal = analyzer.analyze("", &UserId::from("u1"), &[]).await;
        assert_eq!(signal.primary_emotion, Emotion::Neutral);
    }

    struct AlwaysFails;
    #[async_trait]
    impl EmotionLlmBackend for AlwaysFails {
        async fn classify(&self, _text: &str) -> anyhow::Result<EmotionSignal> {
            anyhow::bail!("upstream down")
        }
    }

    #[tokio::test]
    async fn llm_backend_failure_falls_back_to_heuristic() {
        let analyzer = LlmBackedEmotionAnalyzer::new(AlwaysFails);
        let signal = analyzer
            .analyze("I am so thrilled and excited today!", &UserId::from("u1"), &[])
            .await;
        assert_eq!(signal.primary_emotion, Emotion::Excitement);
    }
}
