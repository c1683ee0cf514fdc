//! Turn, Memory Record, Session, Topic and Relationship State — spec §3.

use crate::emotion::Emotion;
use crate::ids::{ChannelId, PersonaId, SessionId, TopicId, TurnId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Six named embedding views attached to a Memory Record (§3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingKind {
    Content,
    Emotion,
    Semantic,
    Relationship,
    Context,
    Personality,
}

impl EmbeddingKind {
    pub const ALL: [EmbeddingKind; 6] = [
        EmbeddingKind::Content,
        EmbeddingKind::Emotion,
        EmbeddingKind::Semantic,
        EmbeddingKind::Relationship,
        EmbeddingKind::Context,
        EmbeddingKind::Personality,
    ];

    /// Text framing prefix so one embedding model produces semantically
    /// distinct views per kind (§4.1).
    pub fn frame(&self, text: &str) -> String {
        match self {
            EmbeddingKind::Content => format!("content: {text}"),
            EmbeddingKind::Emotion => format!("emotion: {text}"),
            EmbeddingKind::Semantic => format!("semantic: {text}"),
            EmbeddingKind::Relationship => format!("relationship: {text}"),
            EmbeddingKind::Context => format!("context: {text}"),
            EmbeddingKind::Personality => format!("personality: {text}"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingKind::Content => "content",
            EmbeddingKind::Emotion => "emotion",
            EmbeddingKind::Semantic => "semantic",
            EmbeddingKind::Relationship => "relationship",
            EmbeddingKind::Context => "context",
            EmbeddingKind::Personality => "personality",
        }
    }
}

/// Where a Memory Record came from (§3 payload.source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    Turn,
    Fact,
    Summary,
    Update,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryPayload {
    pub primary_emotion: Emotion,
    pub emotion_confidence: f32,
    pub emotion_intensity: f32,
    pub is_multi_emotion: bool,
    pub secondary_emotions: Vec<Emotion>,
    pub relationship_level: f32,
    pub interaction_count: u32,
    pub topic_tags: Vec<String>,
    pub source: MemorySource,
}

/// Memory Record, spec §3 and §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub memory_id: String,
    pub persona_id: PersonaId,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub vectors: HashMap<EmbeddingKind, Vec<f32>>,
    pub payload: MemoryPayload,
}

impl MemoryRecord {
    /// All six named vectors present, per invariant in §3 and P5.
    pub fn has_complete_vectors(&self) -> bool {
        EmbeddingKind::ALL.iter().all(|k| self.vectors.contains_key(k))
    }
}

/// Turn, spec §3. `signals` is stored as opaque JSON in the relational
/// store (schema §6: `turns.signals_json`) since its shape is derived per
/// pipeline run and not queried relationally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub turn_id: TurnId,
    pub persona_id: PersonaId,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub created_at: DateTime<Utc>,
    pub user_text: String,
    pub bot_text: String,
    pub signals: serde_json::Value,
}

/// Relationship State, spec §3. All five scalars live in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RelationshipState {
    pub trust: f32,
    pub affection: f32,
    pub attunement: f32,
    pub interaction_quality: f32,
    pub comfort: f32,
}

impl Default for RelationshipState {
    fn default() -> Self {
        Self {
            trust: 0.5,
            affection: 0.5,
            attunement: 0.5,
            interaction_quality: 0.5,
            comfort: 0.5,
        }
    }
}

/// Bounded additive delta applied to a `RelationshipState` (C13 §4.13).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RelationshipDelta {
    pub trust: f32,
    pub affection: f32,
    pub attunement: f32,
    pub interaction_quality: f32,
    pub comfort: f32,
}

impl RelationshipState {
    pub fn apply_clamped(&self, delta: RelationshipDelta) -> Self {
        let clamp = |v: f32| v.clamp(0.0, 1.0);
        Self {
            trust: clamp(self.trust + delta.trust),
            affection: clamp(self.affection + delta.affection),
            attunement: clamp(self.attunement + delta.attunement),
            interaction_quality: clamp(self.interaction_quality + delta.interaction_quality),
            comfort: clamp(self.comfort + delta.comfort),
        }
    }
}

/// Session state machine, spec §3 and §4.13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Paused,
    Resumed,
    Interrupted,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub state: SessionState,
    pub start_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub current_topic: Option<Topic>,
    pub topic_history: Vec<Topic>,
    pub message_count: u32,
    pub context_summary: String,
}

/// Topic resolution status, spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Resolved,
    Ended,
    Interrupted,
    Resumed,
    Ongoing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: TopicId,
    pub keywords: Vec<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub message_count: u32,
    pub emotional_tone: Option<Emotion>,
    pub resolution_status: ResolutionStatus,
}

impl Topic {
    pub fn is_active(&self) -> bool {
        self.end_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub fact_id: String,
    pub persona_id: PersonaId,
    pub user_id: UserId,
    pub category: String,
    pub content: String,
    pub confidence: f32,
    pub created_at: DateTime<Utc>,
}
