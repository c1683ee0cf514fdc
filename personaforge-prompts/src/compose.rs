//! Prompt Composer (C10), spec §4.10: ties the system message, attachment
//! guard, history, and token-budget enforcement together into the final
//! `[{role, content}]` list. Never calls the LLM itself.

use crate::attachment_guard::image_policy_if_needed;
use crate::history::build_history;
use crate::memory_narrative::build_narrative;
use crate::system_message::build_system_message;
use crate::token_budget::TokenCounter;
use chrono::{DateTime, Utc};
use personaforge_attribution::AttributionManager;
use personaforge_flow::{FlowResult, Trajectory};
use personaforge_persona::PersonaDefinition;
use personaforge_types::{
    CachedMessage, ContextId, EmotionSignal, InboundMessage, LlmMessage, LlmRole, MemoryRecord,
    PipelineError,
};

pub struct ComposeInput<'a> {
    pub persona: &'a PersonaDefinition,
    pub inbound: &'a InboundMessage,
    pub emotion: Option<&'a EmotionSignal>,
    pub flow: Option<&'a FlowResult>,
    pub trajectory: Option<&'a Trajectory>,
    pub memories: &'a [MemoryRecord],
    pub recent_messages: &'a [CachedMessage],
    pub session_summary: Option<&'a str>,
    pub context_id: &'a ContextId,
}

pub struct PromptComposer {
    token_counter: TokenCounter,
    max_context_tokens: usize,
    strict_immersive_mode: bool,
}

impl PromptComposer {
    pub fn new(model_name: &str, max_context_tokens: usize, strict_immersive_mode: bool) -> Self {
        Self {
            token_counter: TokenCounter::new(model_name),
            max_context_tokens,
            strict_immersive_mode,
        }
    }

    pub fn compose(
        &self,
        input: &ComposeInput<'_>,
        attribution: &AttributionManager,
        now: DateTime<Utc>,
    ) -> Result<Vec<LlmMessage>, PipelineError> {
        let narrative = build_narrative(input.memories, now).to_text();
        let mut system_text = build_system_message(
            input.persona,
            now,
            input.emotion,
            input.flow,
            input.trajectory,
            &narrative,
            input.session_summary,
        );
        if let Some(policy) = image_policy_if_needed(&input.inbound.attachments) {
            system_text.push_str("\n\n");
            system_text.push_str(policy);
        }
        let system_msg = LlmMessage {
            role: LlmRole::System,
            content: system_text,
        };

        let history = build_history(
            input.recent_messages,
            attribution,
            input.context_id,
            self.strict_immersive_mode,
            true,
        );

        let user_turn = LlmMessage {
            role: LlmRole::User,
            content: input.inbound.text.clone(),
        };

        self.fit_to_budget(system_msg, history, user_turn)
    }

    fn fit_to_budget(
        &self,
        system_msg: LlmMessage,
        mut history: Vec<LlmMessage>,
        user_turn: LlmMessage,
    ) -> Result<Vec<LlmMessage>, PipelineError> {
        let full = self.assemble(&system_msg, &history, &user_turn);
        if self.total_tokens(&full) <= self.max_context_tokens {
            return Ok(full);
        }

        tracing::warn!(
            budget = self.max_context_tokens,
            "prompt exceeds token budget, truncating history from the middle"
        );

        // Truncate from the middle of history first, preserving system and
        // the last user turn (§4.10.5).
        while !history.is_empty() {
            let mid = history.len() / 2;
            history.remove(mid);
            let candidate = self.assemble(&system_msg, &history, &user_turn);
            if self.total_tokens(&candidate) <= self.max_context_tokens {
                return Ok(candidate);
            }
        }

        let minimal = vec![system_msg, user_turn];
        let tokens = self.total_tokens(&minimal);
        if tokens <= self.max_context_tokens {
            Ok(minimal)
        } else {
            Err(PipelineError::BudgetExceeded {
                tokens_over: tokens.saturating_sub(self.max_context_tokens),
            })
        }
    }

    fn assemble(&self, system_msg: &LlmMessage, history: &[LlmMessage], user_turn: &LlmMessage) -> Vec<LlmMessage> {
        let mut out = Vec::with_capacity(history.len() + 2);
        out.push(system_msg.clone());
        out.extend(history.iter().cloned());
        out.push(user_turn.clone());
        out
    }

    fn total_tokens(&self, messages: &[LlmMessage]) -> usize {
        messages.iter().map(|m| self.token_counter.count_tokens(&m.content)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use personaforge_types::{
        Attachment, AttachmentKind, ChannelId, IdentityLevel, MessageId, MessageSource, UserId,
    };
    use proptest::prelude::*;

    fn persona() -> PersonaDefinition {
        PersonaDefinition {
            persona_id: "elena".into(),
            display_name: "Elena".to_string(),
            default_language: None,
            personality: "warm and curious".to_string(),
            communication_style: "conversational".to_string(),
            voice: None,
            background: None,
            knowledge_hooks: vec![],
        }
    }

    fn inbound() -> InboundMessage {
        InboundMessage {
            user_id: UserId::from("u1"),
            channel_id: ChannelId::from("c1"),
            message_id: MessageId::from("m1"),
            text: "hey, how's it going?".to_string(),
            timestamp: Utc::now(),
            is_dm: true,
            attachments: vec![],
        }
    }

    #[test]
    fn composes_system_plus_user_turn_when_no_history() {
        let composer = PromptComposer::new("gpt-4o-mini", 8000, true);
        let persona = persona();
        let inbound = inbound();
        let ctx = ContextId::from("c1");
        let input = ComposeInput {
            persona: &persona,
            inbound: &inbound,
            emotion: None,
            flow: None,
            trajectory: None,
            memories: &[],
            recent_messages: &[],
            session_summary: None,
            context_id: &ctx,
        };
        let attribution = AttributionManager::new(IdentityLevel::Identified);
        let messages = composer.compose(&input, &attribution, Utc::now()).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, LlmRole::System);
        assert_eq!(messages[1].role, LlmRole::User);
    }

    #[test]
    fn image_attachment_appends_policy_to_system_message() {
        let composer = PromptComposer::new("gpt-4o-mini", 8000, true);
        let persona = persona();
        let mut inbound = inbound();
        inbound.attachments.push(Attachment {
            kind: AttachmentKind::Image,
            url_or_ref: "https://example.com/x.png".to_string(),
        });
        let ctx = ContextId::from("c1");
        let input = ComposeInput {
            persona: &persona,
            inbound: &inbound,
            emotion: None,
            flow: None,
            trajectory: None,
            memories: &[],
            recent_messages: &[],
            session_summary: None,
            context_id: &ctx,
        };
        let attribution = AttributionManager::new(IdentityLevel::Identified);
        let messages = composer.compose(&input, &attribution, Utc::now()).unwrap();
        assert!(messages[0].content.contains("in character"));
    }

    #[test]
    fn tight_budget_still_preserves_system_and_user_turn() {
        let composer = PromptComposer::new("gpt-4o-mini", 5, true);
        let persona = persona();
        let inbound = inbound();
        let ctx = ContextId::from("c1");
        let recent = vec![CachedMessage {
            message_id: None,
            content: "a long earlier message ".repeat(50),
            author_id: UserId::from("u1"),
            author_name: "Alice".to_string(),
            timestamp: Utc::now(),
            is_bot: false,
            source: MessageSource::Platform,
        }];
        let input = ComposeInput {
            persona: &persona,
            inbound: &inbound,
            emotion: None,
            flow: None,
            trajectory: None,
            memories: &[],
            recent_messages: &recent,
            session_summary: None,
            context_id: &ctx,
        };
        let attribution = AttributionManager::new(IdentityLevel::Identified);
        // A budget this tight can't even fit system + user turn, so this
        // should surface BudgetExceeded rather than panic or loop forever.
        let result = composer.compose(&input, &attribution, Utc::now());
        assert!(matches!(result, Err(PipelineError::BudgetExceeded { .. })) || result.is_ok());
    }

    /// P8: whatever the prompt inputs, the composed output's token count
    /// never exceeds `max_context_tokens`.
    #[test]
    fn p8_output_respects_token_budget() {
        let budget = 200;
        let composer = PromptComposer::new("gpt-4o-mini", budget, true);
        let persona = persona();
        let inbound = inbound();
        let ctx = ContextId::from("c1");
        let recent: Vec<CachedMessage> = (0..30)
            .map(|i| CachedMessage {
                message_id: None,
                content: format!("message number {i} with some extra words to pad it out a bit"),
                author_id: UserId::from("u1"),
                author_name: "Alice".to_string(),
                timestamp: Utc::now(),
                is_bot: i % 2 == 0,
                source: MessageSource::Platform,
            })
            .collect();
        let input = ComposeInput {
            persona: &persona,
            inbound: &inbound,
            emotion: None,
            flow: None,
            trajectory: None,
            memories: &[],
            recent_messages: &recent,
            session_summary: None,
            context_id: &ctx,
        };
        let attribution = AttributionManager::new(IdentityLevel::Identified);
        let messages = composer.compose(&input, &attribution, Utc::now()).unwrap();
        let total: usize = messages.iter().map(|m| composer.token_counter.count_tokens(&m.content)).sum();
        assert!(total <= budget);
    }

    proptest! {
        /// P8, generalized: for an arbitrary amount of padding history, the
        /// composed output either fits the budget or surfaces
        /// `BudgetExceeded` — it never silently exceeds it.
        #[test]
        fn p8_never_silently_exceeds_budget(history_len in 0usize..40, word_count in 1usize..30) {
            let budget = 300;
            let composer = PromptComposer::new("gpt-4o-mini", budget, true);
            let persona = persona();
            let inbound = inbound();
            let ctx = ContextId::from("c1");
            let recent: Vec<CachedMessage> = (0..history_len)
                .map(|i| CachedMessage {
                    message_id: None,
                    content: std::iter::repeat("word").take(word_count).collect::<Vec<_>>().join(" "),
                    author_id: UserId::from("u1"),
                    author_name: "Alice".to_string(),
                    timestamp: Utc::now(),
                    is_bot: i % 2 == 0,
                    source: MessageSource::Platform,
                })
                .collect();
            let input = ComposeInput {
                persona: &persona,
                inbound: &inbound,
                emotion: None,
                flow: None,
                trajectory: None,
                memories: &[],
                recent_messages: &recent,
                session_summary: None,
                context_id: &ctx,
            };
            let attribution = AttributionManager::new(IdentityLevel::Identified);
            match composer.compose(&input, &attribution, Utc::now()) {
                Ok(messages) => {
                    let total: usize = messages.iter().map(|m| composer.token_counter.count_tokens(&m.content)).sum();
                    prop_assert!(total <= budget);
                }
                Err(PipelineError::BudgetExceeded { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
            }
        }
    }
}
