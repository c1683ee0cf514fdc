//! Spoofing and prompt-injection detection, spec §4.11 and P7.
//!
//! The suspicious-phrase list covers prompt-injection cues (system-override
//! and instruction-reset phrasing); detection is a flat list of lowercase
//! substrings checked against the message body.

use personaforge_types::{LlmRole, RoleMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    Ok,
    Suspicious,
    Compromised,
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub security_level: SecurityLevel,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

const SUSPICIOUS_PATTERNS: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous instructions",
    "disregard the above",
    "system prompt",
    "you are now",
    "new instructions:",
    "reset your instructions",
    "forget everything",
    "act as if",
    "developer mode",
];

/// A non-bot attribution carrying `role == assistant` is identity spoofing
/// (P7). Content matching a known injection cue is flagged `suspicious`
/// rather than rejected outright, so C10 can still use it tagged.
pub fn validate(message: &RoleMessage) -> ValidationOutcome {
    if !message.attribution.is_bot && message.role == LlmRole::Assistant {
        return ValidationOutcome {
            valid: false,
            security_level: SecurityLevel::Compromised,
            errors: vec![format!(
                "user {} claimed the assistant role",
                message.attribution.user_id
            )],
            warnings: Vec::new(),
        };
    }

    let lower = message.content.to_ascii_lowercase();
    let matched: Vec<&str> = SUSPICIOUS_PATTERNS
        .iter()
        .filter(|p| lower.contains(*p))
        .copied()
        .collect();

    if matched.is_empty() {
        ValidationOutcome {
            valid: true,
            security_level: SecurityLevel::Ok,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    } else {
        ValidationOutcome {
            valid: true,
            security_level: SecurityLevel::Suspicious,
            errors: Vec::new(),
            warnings: matched
                .into_iter()
                .map(|p| format!("message matched prompt-injection cue: {p}"))
                .collect(),
        }
    }
}
