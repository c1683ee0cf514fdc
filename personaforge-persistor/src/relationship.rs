//! Relationship-state delta formula, spec §4.13.
//!
//! A positive, high-confidence emotion nudges trust/affection/attunement
//! up; a strong negative one with high confidence nudges interaction
//! quality/comfort down. Everything else leaves the state untouched for
//! this turn — relationship state moves slowly on purpose (§3 RelationshipState).

use personaforge_flow::IntimacyDevelopment;
use personaforge_types::{EmotionSignal, RelationshipDelta};

const POSITIVE_CONFIDENCE_THRESHOLD: f32 = 0.6;
const NEGATIVE_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// `IntimacyDevelopment` is a three-way enum rather than a raw scalar (C8
/// classifies it for flow-hint purposes, not for this formula), so this
/// maps it onto the `[0, 1]` scale the attunement term expects.
fn intimacy_development_to_scalar(value: IntimacyDevelopment) -> f32 {
    match value {
        IntimacyDevelopment::DeepeningSignificantly => 1.0,
        IntimacyDevelopment::ModerateDevelopment => 0.5,
        IntimacyDevelopment::StableInteraction => 0.0,
    }
}

pub fn relationship_delta(emotion: Option<&EmotionSignal>, intimacy: Option<IntimacyDevelopment>) -> RelationshipDelta {
    let mut delta = RelationshipDelta::default();
    let Some(emotion) = emotion else {
        return delta;
    };

    if emotion.primary_emotion.is_positive_high_confidence_candidate()
        && emotion.confidence > POSITIVE_CONFIDENCE_THRESHOLD
    {
        let intimacy_scalar = intimacy.map(intimacy_development_to_scalar).unwrap_or(0.0).clamp(0.0, 1.0);
        delta.trust += 0.01;
        delta.affection += 0.015;
        delta.attunement += 0.01 * intimacy_scalar;
    }

    if emotion.primary_emotion.is_strong_negative() && emotion.confidence > NEGATIVE_CONFIDENCE_THRESHOLD {
        delta.interaction_quality -= 0.02;
        delta.comfort -= 0.01;
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use personaforge_types::Emotion;
    use std::collections::HashMap;

    fn signal(emotion: Emotion, confidence: f32) -> EmotionSignal {
        EmotionSignal {
            primary_emotion: emotion,
            confidence,
            intensity: 0.5,
            all_emotions: HashMap::new(),
            is_multi_emotion: false,
            secondary_emotions: vec![],
        }
    }

    #[test]
    fn positive_high_confidence_raises_trust_affection_attunement() {
        let delta = relationship_delta(
            Some(&signal(Emotion::Joy, 0.8)),
            Some(IntimacyDevelopment::DeepeningSignificantly),
        );
        assert_eq!(delta.trust, 0.01);
        assert_eq!(delta.affection, 0.015);
        assert_eq!(delta.attunement, 0.01);
    }

    #[test]
    fn negative_strong_confidence_lowers_quality_and_comfort() {
        let delta = relationship_delta(Some(&signal(Emotion::Anger, 0.9)), None);
        assert_eq!(delta.interaction_quality, -0.02);
        assert_eq!(delta.comfort, -0.01);
    }

    #[test]
    fn low_confidence_positive_emotion_is_a_no_op() {
        let delta = relationship_delta(Some(&signal(Emotion::Joy, 0.3)), None);
        assert_eq!(delta.trust, 0.0);
    }

    #[test]
    fn no_signal_is_a_no_op() {
        let delta = relationship_delta(None, None);
        assert_eq!(delta.affection, 0.0);
    }
}
