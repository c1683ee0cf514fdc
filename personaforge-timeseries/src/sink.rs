use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use personaforge_types::{Emotion, PersonaId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of the measurement families of §4.5, with its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Measurement {
    ConfidenceEvolution {
        user_fact_confidence: f32,
        relationship_confidence: f32,
        context_confidence: f32,
        emotional_confidence: f32,
        overall_confidence: f32,
    },
    RelationshipProgression {
        trust: f32,
        affection: f32,
        attunement: f32,
        interaction_quality: f32,
        comfort: f32,
    },
    ConversationQuality {
        engagement: f32,
        satisfaction: f32,
        natural_flow: f32,
        emotional_resonance: f32,
        topic_relevance: f32,
        user_reaction_score: Option<f32>,
        reaction_emoji: Option<String>,
        has_user_feedback: bool,
    },
    BotEmotion {
        emotion: Emotion,
        intensity: f32,
        confidence: f32,
    },
    UserEmotion {
        emotion: Emotion,
        intensity: f32,
        confidence: f32,
    },
}

impl Measurement {
    /// Measurement family name, used as the point's series key.
    pub fn family(&self) -> &'static str {
        match self {
            Measurement::ConfidenceEvolution { .. } => "confidence_evolution",
            Measurement::RelationshipProgression { .. } => "relationship_progression",
            Measurement::ConversationQuality { .. } => "conversation_quality",
            Measurement::BotEmotion { .. } => "bot_emotion",
            Measurement::UserEmotion { .. } => "user_emotion",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricPoint {
    pub persona_id: PersonaId,
    pub user_id: UserId,
    pub session_id: Option<SessionId>,
    pub measurement: Measurement,
    pub recorded_at: DateTime<Utc>,
}

/// All writes are best-effort: disabled sinks and transport failures both
/// return `false` rather than propagating an error to the caller (§4.5).
#[async_trait]
pub trait TimeSeriesSink: Send + Sync {
    async fn write_point(&self, point: MetricPoint) -> bool;

    /// Chronological window of points for one user's `family`, most recent
    /// `limit` entries, oldest first — the shape C8's trajectory query needs.
    async fn trajectory_window(
        &self,
        user_id: &UserId,
        family: &str,
        limit: usize,
    ) -> Vec<MetricPoint>;
}

/// Disabled-by-configuration default: accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl TimeSeriesSink for NullSink {
    async fn write_point(&self, _point: MetricPoint) -> bool {
        false
    }

    async fn trajectory_window(
        &self,
        _user_id: &UserId,
        _family: &str,
        _limit: usize,
    ) -> Vec<MetricPoint> {
        Vec::new()
    }
}

/// In-memory reference sink for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryTimeSeriesSink {
    by_user: RwLock<HashMap<UserId, Vec<MetricPoint>>>,
}

impl InMemoryTimeSeriesSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_user.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TimeSeriesSink for InMemoryTimeSeriesSink {
    async fn write_point(&self, point: MetricPoint) -> bool {
        self.by_user
            .write()
            .entry(point.user_id.clone())
            .or_default()
            .push(point);
        true
    }

    async fn trajectory_window(
        &self,
        user_id: &UserId,
        family: &str,
        limit: usize,
    ) -> Vec<MetricPoint> {
        let guard = self.by_user.read();
        let Some(points) = guard.get(user_id) else {
            return Vec::new();
        };
        let matching: Vec<&MetricPoint> = points
            .iter()
            .filter(|p| p.measurement.family() == family)
            .collect();
        matching
            .into_iter()
            .rev()
            .take(limit)
            .rev()
            .cloned()
            .collect()
    }
}
