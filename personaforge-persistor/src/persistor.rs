//! Turn Persistor (C13), spec §4.13: the Orchestrator's last step. Embeds
//! the turn under all six named views in parallel via a `join_all`
//! fan-out, then dual-writes the vector store, relational store, and
//! time-series sink.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use personaforge_embeddings::EmbeddingClient;
use personaforge_flow::IntimacyDevelopment;
use personaforge_relational::RelationalStore;
use personaforge_timeseries::{Measurement, MetricPoint, TimeSeriesSink};
use personaforge_types::{
    ChannelId, EmbeddingKind, EmotionSignal, MemoryPayload, MemoryRecord, MemorySource, PersonaId,
    RelationshipState, SessionId, Turn, TurnId, UserId,
};
use personaforge_vectorstore::PersonaCollection;

use crate::relationship::relationship_delta;

pub struct PersistInput<'a> {
    pub turn_id: TurnId,
    pub channel_id: ChannelId,
    pub created_at: DateTime<Utc>,
    pub user_text: &'a str,
    pub bot_text: &'a str,
    pub user_emotion: Option<&'a EmotionSignal>,
    pub bot_emotion: Option<&'a EmotionSignal>,
    pub intimacy_development: Option<IntimacyDevelopment>,
    pub session_id: Option<SessionId>,
    pub topic_tags: Vec<String>,
    pub interaction_count: u32,
}

#[derive(Debug, Default)]
pub struct PersistOutcome {
    pub memory_written: bool,
    pub turn_written: bool,
    pub relationship_state: Option<RelationshipState>,
}

pub struct TurnPersistor {
    embeddings: Arc<dyn EmbeddingClient>,
    relational: Arc<RelationalStore>,
    timeseries: Arc<dyn TimeSeriesSink>,
}

impl TurnPersistor {
    pub fn new(
        embeddings: Arc<dyn EmbeddingClient>,
        relational: Arc<RelationalStore>,
        timeseries: Arc<dyn TimeSeriesSink>,
    ) -> Self {
        Self { embeddings, relational, timeseries }
    }

    /// Every step below is independently best-effort — a failure in one
    /// store never rolls back another (§4.13's stores are independently
    /// recoverable).
    pub async fn persist(
        &self,
        collection: &PersonaCollection,
        persona_id: &PersonaId,
        user_id: &UserId,
        input: PersistInput<'_>,
    ) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();
        let combined_text = format!("{} {}", input.user_text, input.bot_text);

        let vectors = self.embed_all_views(&combined_text).await;

        if vectors.len() == EmbeddingKind::ALL.len() {
            let memory_id = collection.generate_memory_id(user_id, &combined_text, input.created_at);
            let record = MemoryRecord {
                memory_id,
                persona_id: persona_id.clone(),
                user_id: user_id.clone(),
                channel_id: input.channel_id.clone(),
                content: combined_text.clone(),
                created_at: input.created_at,
                vectors,
                payload: MemoryPayload {
                    primary_emotion: input.user_emotion.map(|e| e.primary_emotion).unwrap_or_default(),
                    emotion_confidence: input.user_emotion.map(|e| e.confidence).unwrap_or(0.0),
                    emotion_intensity: input.user_emotion.map(|e| e.intensity).unwrap_or(0.0),
                    is_multi_emotion: input.user_emotion.map(|e| e.is_multi_emotion).unwrap_or(false),
                    secondary_emotions: input
                        .user_emotion
                        .map(|e| e.secondary_emotions.clone())
                        .unwrap_or_default(),
                    relationship_level: 0.5,
                    interaction_count: input.interaction_count,
                    topic_tags: input.topic_tags.clone(),
                    source: MemorySource::Turn,
                },
            };
            match collection.upsert(record) {
                Ok(()) => outcome.memory_written = true,
                Err(err) => tracing::warn!(error = %err, "memory record upsert rejected"),
            }
        } else {
            tracing::warn!(views = vectors.len(), "incomplete embedding set, skipping memory record write");
        }

        let turn = Turn {
            turn_id: input.turn_id,
            persona_id: persona_id.clone(),
            user_id: user_id.clone(),
            channel_id: input.channel_id.clone(),
            created_at: input.created_at,
            user_text: input.user_text.to_string(),
            bot_text: input.bot_text.to_string(),
            signals: serde_json::json!({}),
        };
        match self.relational.insert_turn(&turn) {
            Ok(()) => outcome.turn_written = true,
            Err(err) => tracing::warn!(error = %err, "turn persistence failed"),
        }

        let delta = relationship_delta(input.user_emotion, input.intimacy_development);
        match self.relational.upsert_relationship_state(persona_id, user_id, delta) {
            Ok(state) => {
                outcome.relationship_state = Some(state);
                self.record_point(
                    persona_id,
                    user_id,
                    &input.session_id,
                    Measurement::RelationshipProgression {
                        trust: state.trust,
                        affection: state.affection,
                        attunement: state.attunement,
                        interaction_quality: state.interaction_quality,
                        comfort: state.comfort,
                    },
                    input.created_at,
                )
                .await;
            }
            Err(err) => tracing::warn!(error = %err, "relationship state update failed"),
        }

        if let Some(e) = input.user_emotion {
            self.record_point(
                persona_id,
                user_id,
                &input.session_id,
                Measurement::UserEmotion { emotion: e.primary_emotion, intensity: e.intensity, confidence: e.confidence },
                input.created_at,
            )
            .await;
        }
        if let Some(e) = input.bot_emotion {
            self.record_point(
                persona_id,
                user_id,
                &input.session_id,
                Measurement::BotEmotion { emotion: e.primary_emotion, intensity: e.intensity, confidence: e.confidence },
                input.created_at,
            )
            .await;
        }

        outcome
    }

    async fn embed_all_views(&self, text: &str) -> HashMap<EmbeddingKind, Vec<f32>> {
        let embed_futures = EmbeddingKind::ALL.iter().map(|kind| {
            let embeddings = Arc::clone(&self.embeddings);
            let kind = *kind;
            let text = text.to_string();
            async move { (kind, embeddings.embed(&text, kind).await) }
        });

        let mut vectors = HashMap::new();
        for (kind, result) in join_all(embed_futures).await {
            match result {
                Ok(vector) => {
                    vectors.insert(kind, vector);
                }
                Err(err) => tracing::warn!(error = %err, kind = kind.as_str(), "embedding failed for memory view"),
            }
        }
        vectors
    }

    async fn record_point(
        &self,
        persona_id: &PersonaId,
        user_id: &UserId,
        session_id: &Option<SessionId>,
        measurement: Measurement,
        recorded_at: DateTime<Utc>,
    ) {
        self.timeseries
            .write_point(MetricPoint {
                persona_id: persona_id.clone(),
                user_id: user_id.clone(),
                session_id: session_id.clone(),
                measurement,
                recorded_at,
            })
            .await;
    }
}
