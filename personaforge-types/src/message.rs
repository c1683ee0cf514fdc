//! Inbound message normalization and cache/attribution message shapes.

use crate::ids::{AttributionId, ChannelId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized inbound message handed to the Orchestrator (C12 step 2) by a
/// transport collaborator. Transport framing is out of scope; this is the
/// boundary value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub is_dm: bool,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub url_or_ref: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    Image,
    Other,
}

impl InboundMessage {
    /// Validate and sanitize per C12 step 1: length cap, control characters
    /// stripped, empty rejected.
    pub fn validate(mut self, max_len: usize) -> Result<Self, crate::error::PipelineError> {
        self.text = self
            .text
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            return Err(crate::error::PipelineError::Invalid {
                reason: "empty message text".to_string(),
            });
        }
        if trimmed.chars().count() > max_len {
            self.text = trimmed.chars().take(max_len).collect();
        } else {
            self.text = trimmed.to_string();
        }
        Ok(self)
    }
}

/// One cached or history entry, per C6 (§4.6) and C11 (§4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedMessage {
    pub message_id: Option<MessageId>,
    pub content: String,
    pub author_id: UserId,
    pub author_name: String,
    pub timestamp: DateTime<Utc>,
    pub is_bot: bool,
    pub source: MessageSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSource {
    Platform,
    Vector,
    Unknown,
}

/// Identity level for C11's attribution mode (§6 config `identity_level`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityLevel {
    Identified,
    Contextualized,
    Anonymous,
}

/// A role-attributed message ready to be turned into LLM chat format (C11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleMessage {
    pub role: LlmRole,
    pub content: String,
    pub attribution: AttributionRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmRole {
    User,
    Assistant,
    System,
}

/// Attribution Record, spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionRecord {
    pub context_id: String,
    pub user_id: UserId,
    pub attribution_id: AttributionId,
    pub display_name: String,
    pub is_bot: bool,
    pub created_at: DateTime<Utc>,
}

/// One `{role, content}` pair ready for the LLM collaborator (C10 output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}
