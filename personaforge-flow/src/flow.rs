//! Conversation flow classification, spec §4.8.
//!
//! Preferred path issues a weighted C3 search over the current message's
//! embeddings (`vector_enhanced = true`); when embeddings or the vector
//! store are unavailable, falls back to the same cue table C7 uses plus
//! depth word lists.

use crate::trajectory::TrajectoryMomentum;
use personaforge_embeddings::EmbeddingClient;
use personaforge_types::{Emotion, EmbeddingKind, MemoryRecord, UserId};
use personaforge_vectorstore::PersonaCollection;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    TopicContinuation,
    TopicShift,
    CallbackReference,
    EmotionalProgression,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationDepth {
    Surface,
    Engaging,
    Personal,
    Intimate,
    Profound,
}

impl ConversationDepth {
    fn score(self) -> f32 {
        match self {
            ConversationDepth::Surface => 0.1,
            ConversationDepth::Engaging => 0.3,
            ConversationDepth::Personal => 0.6,
            ConversationDepth::Intimate => 0.8,
            ConversationDepth::Profound => 1.0,
        }
    }

    fn from_score(score: f32) -> Self {
        if score >= 0.9 {
            ConversationDepth::Profound
        } else if score >= 0.7 {
            ConversationDepth::Intimate
        } else if score >= 0.45 {
            ConversationDepth::Personal
        } else if score >= 0.2 {
            ConversationDepth::Engaging
        } else {
            ConversationDepth::Surface
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntimacyDevelopment {
    DeepeningSignificantly,
    ModerateDevelopment,
    StableInteraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPrediction {
    LikelyDeepening,
    LikelyTopicShift,
    LikelyContinuation,
    StableFlow,
}

#[derive(Debug, Clone)]
pub struct FlowResult {
    pub flow_type: FlowType,
    pub confidence: f32,
    pub depth: ConversationDepth,
    pub continuity_score: f32,
    pub intimacy_development: IntimacyDevelopment,
    pub emotional_momentum: TrajectoryMomentum,
    pub prediction: FlowPrediction,
    pub vector_enhanced: bool,
}

/// §4.8 weights: `{context: 0.30, relationship: 0.25, content: 0.20,
/// emotion: 0.15, personality: 0.10}`.
fn flow_weights() -> HashMap<EmbeddingKind, f32> {
    let mut weights = HashMap::new();
    weights.insert(EmbeddingKind::Context, 0.30);
    weights.insert(EmbeddingKind::Relationship, 0.25);
    weights.insert(EmbeddingKind::Content, 0.20);
    weights.insert(EmbeddingKind::Emotion, 0.15);
    weights.insert(EmbeddingKind::Personality, 0.10);
    weights
}

const FLOW_KINDS: [EmbeddingKind; 5] = [
    EmbeddingKind::Context,
    EmbeddingKind::Relationship,
    EmbeddingKind::Content,
    EmbeddingKind::Emotion,
    EmbeddingKind::Personality,
];

pub struct FlowAnalyzer {
    embeddings: Arc<dyn EmbeddingClient>,
}

impl FlowAnalyzer {
    pub fn new(embeddings: Arc<dyn EmbeddingClient>) -> Self {
        Self { embeddings }
    }

    pub async fn flow(
        &self,
        collection: &PersonaCollection,
        user_id: &UserId,
        current_text: &str,
    ) -> FlowResult {
        let mut dims = HashMap::new();
        for kind in FLOW_KINDS {
            match self.embeddings.embed(current_text, kind).await {
                Ok(vector) => {
                    dims.insert(kind, vector);
                }
                Err(err) => {
                    tracing::warn!(?kind, error = %err, "flow embedding view unavailable, dropping dimension");
                }
            }
        }

        if dims.is_empty() {
            return fallback_flow(current_text);
        }

        let weights = flow_weights();
        let results = collection.search_by_dimensions(user_id, &dims, &weights, 15);
        if results.is_empty() {
            return fallback_flow(current_text);
        }

        analyze_vector_results(&results.iter().map(|s| s.record.clone()).collect::<Vec<_>>(), current_text)
    }
}

fn analyze_vector_results(records: &[MemoryRecord], current_text: &str) -> FlowResult {
    let depths: Vec<ConversationDepth> = records.iter().map(|r| classify_depth(&r.content)).collect();
    let intimacies: Vec<IntimacyLevel> = records.iter().map(|r| classify_intimacy(&r.content)).collect();
    let continuities: Vec<ContinuitySignal> =
        records.iter().map(|r| detect_continuity(&r.content)).collect();

    let flow_type = dominant_flow_type(&continuities);

    let depth_avg =
        depths.iter().map(|d| d.score()).sum::<f32>() / depths.len().max(1) as f32;
    let depth = ConversationDepth::from_score(depth_avg);

    let intimacy_development = intimacy_progression(&intimacies);
    let continuity_score = continuity_score(&continuities);
    let emotional_momentum = emotional_momentum(records);

    let memory_count_factor = (records.len() as f32 / 10.0).min(1.0);
    let confidence = ((memory_count_factor + 0.8) / 2.0).clamp(0.0, 1.0);

    FlowResult {
        flow_type,
        confidence,
        depth,
        continuity_score,
        intimacy_development,
        emotional_momentum,
        prediction: predict_flow(current_text),
        vector_enhanced: true,
    }
}

fn fallback_flow(current_text: &str) -> FlowResult {
    let transition = personaforge_boundary::transitions::detect(current_text, false);
    let (flow_type, confidence) = match transition {
        personaforge_boundary::TopicTransition::ExplicitChange => (FlowType::TopicShift, 0.7),
        personaforge_boundary::TopicTransition::Resumption => (FlowType::CallbackReference, 0.65),
        personaforge_boundary::TopicTransition::Completion => (FlowType::TopicContinuation, 0.6),
        _ => {
            if classify_depth(current_text) >= ConversationDepth::Personal {
                (FlowType::EmotionalProgression, 0.6)
            } else {
                (FlowType::TopicContinuation, 0.5)
            }
        }
    };

    let depth = classify_depth(current_text);
    let intimacy_development = match classify_intimacy(current_text) {
        IntimacyLevel::High => IntimacyDevelopment::DeepeningSignificantly,
        IntimacyLevel::Moderate => IntimacyDevelopment::ModerateDevelopment,
        IntimacyLevel::Casual => IntimacyDevelopment::StableInteraction,
    };

    let continuity_score = match flow_type {
        FlowType::TopicContinuation => 0.9,
        FlowType::CallbackReference => 0.8,
        FlowType::EmotionalProgression => 0.7,
        FlowType::TopicShift => 0.3,
        FlowType::Neutral => 0.5,
    };

    let emotional_momentum = match personaforge_emotion::classify(current_text).primary_emotion {
        e if e.valence() > 0.3 => TrajectoryMomentum::PositiveMomentum,
        e if e.valence() < -0.3 => TrajectoryMomentum::NegativeMomentum,
        _ => TrajectoryMomentum::StableMomentum,
    };

    FlowResult {
        flow_type,
        confidence,
        depth,
        continuity_score,
        intimacy_development,
        emotional_momentum,
        prediction: predict_flow(current_text),
        vector_enhanced: false,
    }
}

impl PartialOrd for ConversationDepth {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.score().partial_cmp(&other.score()).unwrap_or(std::cmp::Ordering::Equal))
    }
}

fn classify_depth(text: &str) -> ConversationDepth {
    let lower = text.to_ascii_lowercase();
    if ["deeply", "soul", "meaning", "purpose"].iter().any(|w| lower.contains(w)) {
        ConversationDepth::Profound
    } else if ["private", "secret", "vulnerable"].iter().any(|w| lower.contains(w)) {
        ConversationDepth::Intimate
    } else if ["personal", "feel", "important"].iter().any(|w| lower.contains(w)) {
        ConversationDepth::Personal
    } else if ["think", "opinion", "interesting"].iter().any(|w| lower.contains(w)) {
        ConversationDepth::Engaging
    } else {
        ConversationDepth::Surface
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntimacyLevel {
    High,
    Moderate,
    Casual,
}

fn classify_intimacy(text: &str) -> IntimacyLevel {
    let lower = text.to_ascii_lowercase();
    if ["trust", "secret", "private"].iter().any(|w| lower.contains(w)) {
        IntimacyLevel::High
    } else if ["personal", "feel", "experience"].iter().any(|w| lower.contains(w)) {
        IntimacyLevel::Moderate
    } else {
        IntimacyLevel::Casual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContinuitySignal {
    TopicContinuation,
    CallbackReference,
    EmotionalProgression,
    TopicShift,
    None,
}

fn detect_continuity(text: &str) -> ContinuitySignal {
    let lower = text.to_ascii_lowercase();
    if ["also", "and", "furthermore"].iter().any(|w| lower.contains(w)) {
        ContinuitySignal::TopicContinuation
    } else if ["remember", "like we discussed"].iter().any(|w| lower.contains(w)) {
        ContinuitySignal::CallbackReference
    } else if ["feeling better", "still worried"].iter().any(|w| lower.contains(w)) {
        ContinuitySignal::EmotionalProgression
    } else if ["by the way", "different topic"].iter().any(|w| lower.contains(w)) {
        ContinuitySignal::TopicShift
    } else {
        ContinuitySignal::None
    }
}

fn dominant_flow_type(signals: &[ContinuitySignal]) -> FlowType {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for signal in signals {
        let key = match signal {
            ContinuitySignal::TopicContinuation => "topic_continuation",
            ContinuitySignal::CallbackReference => "callback_reference",
            ContinuitySignal::EmotionalProgression => "emotional_progression",
            ContinuitySignal::TopicShift => "topic_shift",
            ContinuitySignal::None => continue,
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    match counts.into_iter().max_by_key(|(_, c)| *c).map(|(k, _)| k) {
        Some("topic_continuation") => FlowType::TopicContinuation,
        Some("callback_reference") => FlowType::CallbackReference,
        Some("emotional_progression") => FlowType::EmotionalProgression,
        Some("topic_shift") => FlowType::TopicShift,
        _ => FlowType::Neutral,
    }
}

fn intimacy_progression(levels: &[IntimacyLevel]) -> IntimacyDevelopment {
    if levels.is_empty() {
        return IntimacyDevelopment::StableInteraction;
    }
    let high = levels.iter().filter(|l| matches!(l, IntimacyLevel::High)).count();
    let ratio = high as f32 / levels.len() as f32;
    if ratio > 0.6 {
        IntimacyDevelopment::DeepeningSignificantly
    } else if ratio > 0.3 {
        IntimacyDevelopment::ModerateDevelopment
    } else {
        IntimacyDevelopment::StableInteraction
    }
}

fn continuity_score(signals: &[ContinuitySignal]) -> f32 {
    if signals.is_empty() {
        return 0.5;
    }
    let values: Vec<f32> = signals
        .iter()
        .map(|s| match s {
            ContinuitySignal::TopicContinuation => 0.9,
            ContinuitySignal::CallbackReference => 0.8,
            ContinuitySignal::EmotionalProgression => 0.7,
            ContinuitySignal::TopicShift => 0.3,
            ContinuitySignal::None => 0.5,
        })
        .collect();
    values.iter().sum::<f32>() / values.len() as f32
}

fn emotional_momentum(records: &[MemoryRecord]) -> TrajectoryMomentum {
    let positive = records
        .iter()
        .filter(|r| r.payload.primary_emotion.is_positive_high_confidence_candidate())
        .count();
    let negative = records
        .iter()
        .filter(|r| matches!(r.payload.primary_emotion, Emotion::Sadness | Emotion::Anxiety | Emotion::Anger | Emotion::Frustration | Emotion::Disappointment))
        .count();
    if positive > negative {
        TrajectoryMomentum::PositiveMomentum
    } else if negative > positive {
        TrajectoryMomentum::NegativeMomentum
    } else {
        TrajectoryMomentum::StableMomentum
    }
}

fn predict_flow(current_text: &str) -> FlowPrediction {
    let lower = current_text.to_ascii_lowercase();
    if ["personal", "important", "feel", "experience", "struggle"]
        .iter()
        .any(|w| lower.contains(w))
    {
        FlowPrediction::LikelyDeepening
    } else if ["by the way", "actually", "different topic", "changing subject"]
        .iter()
        .any(|w| lower.contains(w))
    {
        FlowPrediction::LikelyTopicShift
    } else if ["also", "and", "furthermore", "speaking of"]
        .iter()
        .any(|w| lower.contains(w))
    {
        FlowPrediction::LikelyContinuation
    } else {
        FlowPrediction::StableFlow
    }
}
