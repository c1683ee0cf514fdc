//! History assembly, spec §4.10 step 3: maps cached platform messages to
//! alternating `{role, content}` turns via C11's attribution rules,
//! dropping commands, spoofed messages, and (when immersive mode is on)
//! meta-analysis breakdowns, then merges consecutive same-role runs.

use crate::filter;
use personaforge_attribution::AttributionManager;
use personaforge_types::{CachedMessage, ContextId, LlmMessage, LlmRole};

const COMMAND_PREFIXES: &[char] = &['!', '/'];

fn is_command(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .map(|c| COMMAND_PREFIXES.contains(&c))
        .unwrap_or(false)
}

/// Builds the LLM-ready history turns from cached messages.
pub fn build_history(
    recent_messages: &[CachedMessage],
    attribution: &AttributionManager,
    context_id: &ContextId,
    strict_immersive_mode: bool,
    preserve_attribution: bool,
) -> Vec<LlmMessage> {
    let mut kept: Vec<CachedMessage> = Vec::with_capacity(recent_messages.len());
    let mut skip_next_bot_reply = false;

    for msg in recent_messages {
        if !msg.is_bot && is_command(&msg.content) {
            skip_next_bot_reply = true;
            continue;
        }
        if msg.is_bot && skip_next_bot_reply {
            skip_next_bot_reply = false;
            continue;
        }
        skip_next_bot_reply = false;
        kept.push(msg.clone());
    }

    let role_messages: Vec<_> = kept
        .iter()
        .map(|m| attribution.to_role_message(m, context_id))
        .filter(|rm| {
            let outcome = attribution.validate(rm);
            if outcome.security_level == personaforge_attribution::SecurityLevel::Compromised {
                tracing::warn!(errors = ?outcome.errors, "dropping spoofed message from history");
                return false;
            }
            if strict_immersive_mode && filter::is_meta_analysis(&rm.content) {
                return false;
            }
            true
        })
        .collect();

    let formatted = attribution.to_llm_format(&role_messages, preserve_attribution);
    merge_same_role_runs(formatted)
}

/// Alternation fix: a consecutive run of messages sharing the same role is
/// merged into a single message with newline-joined content.
fn merge_same_role_runs(messages: Vec<LlmMessage>) -> Vec<LlmMessage> {
    let mut out: Vec<LlmMessage> = Vec::with_capacity(messages.len());
    for msg in messages {
        match out.last_mut() {
            Some(prev) if roles_equal(prev.role, msg.role) => {
                prev.content.push('\n');
                prev.content.push_str(&msg.content);
            }
            _ => out.push(msg),
        }
    }
    out
}

fn roles_equal(a: LlmRole, b: LlmRole) -> bool {
    matches!(
        (a, b),
        (LlmRole::User, LlmRole::User) | (LlmRole::Assistant, LlmRole::Assistant) | (LlmRole::System, LlmRole::System)
    )
}
