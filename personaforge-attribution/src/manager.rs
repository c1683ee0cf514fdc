//! Role-Attribution Manager (C11), spec §4.11.

use crate::pseudonym::PseudonymRegistry;
use crate::validate::{validate, ValidationOutcome};
use personaforge_types::{
    AttributionId, AttributionRecord, CachedMessage, ContextId, IdentityLevel, LlmMessage, LlmRole,
    RoleMessage,
};
use std::collections::HashSet;

pub struct AttributionManager {
    registry: PseudonymRegistry,
    level: IdentityLevel,
}

impl AttributionManager {
    pub fn new(level: IdentityLevel) -> Self {
        Self {
            registry: PseudonymRegistry::new(),
            level,
        }
    }

    pub fn attribution_id(&self, user_id: &personaforge_types::UserId, context_id: &ContextId) -> AttributionId {
        self.registry.attribution_id(self.level, user_id, context_id)
    }

    /// Maps one cached platform message to a `RoleMessage` with its
    /// attribution resolved under this manager's identity level. The bot's
    /// own messages (`is_bot == true`) always carry the fixed `assistant`
    /// attribution id and are never run through the pseudonym registry.
    pub fn to_role_message(&self, platform_msg: &CachedMessage, context_id: &ContextId) -> RoleMessage {
        if platform_msg.is_bot {
            return RoleMessage {
                role: LlmRole::Assistant,
                content: platform_msg.content.clone(),
                attribution: AttributionRecord {
                    context_id: context_id.as_str().to_string(),
                    user_id: platform_msg.author_id.clone(),
                    attribution_id: AttributionId::from("assistant"),
                    display_name: platform_msg.author_name.clone(),
                    is_bot: true,
                    created_at: platform_msg.timestamp,
                },
            };
        }

        let attribution_id = self.attribution_id(&platform_msg.author_id, context_id);
        let display_name = match self.level {
            IdentityLevel::Identified => platform_msg.author_name.clone(),
            IdentityLevel::Contextualized | IdentityLevel::Anonymous => attribution_id.as_str().to_string(),
        };

        RoleMessage {
            role: LlmRole::User,
            content: platform_msg.content.clone(),
            attribution: AttributionRecord {
                context_id: context_id.as_str().to_string(),
                user_id: platform_msg.author_id.clone(),
                attribution_id,
                display_name,
                is_bot: false,
                created_at: platform_msg.timestamp,
            },
        }
    }

    /// Flattens role messages to the `[{role, content}]` shape the LLM
    /// collaborator expects. When `preserve_attribution` is set and more
    /// than one distinct non-bot user appears, user content is prefixed
    /// `"[<display_name>]: "`; bot messages are never prefixed.
    pub fn to_llm_format(&self, role_messages: &[RoleMessage], preserve_attribution: bool) -> Vec<LlmMessage> {
        let distinct_users: HashSet<&str> = role_messages
            .iter()
            .filter(|m| !m.attribution.is_bot)
            .map(|m| m.attribution.user_id.as_str())
            .collect();
        let needs_prefix = preserve_attribution && distinct_users.len() > 1;

        role_messages
            .iter()
            .map(|m| {
                let content = if needs_prefix && !m.attribution.is_bot {
                    format!("[{}]: {}", m.attribution.display_name, m.content)
                } else {
                    m.content.clone()
                };
                LlmMessage { role: m.role, content }
            })
            .collect()
    }

    pub fn validate(&self, role_message: &RoleMessage) -> ValidationOutcome {
        validate(role_message)
    }

    pub fn clear(&self, context_id: &ContextId) {
        self.registry.clear(context_id);
    }
}
