//! The closed emotion set of spec §6, shared by C2/C3/C5/C8.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed emotion vocabulary. Any value outside this set is coerced to
/// `Neutral` on ingress to the vector store (P6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Joy,
    Excitement,
    Gratitude,
    Love,
    Hope,
    Curiosity,
    Anticipation,
    Contentment,
    Contemplative,
    Reflective,
    Neutral,
    Sadness,
    Disappointment,
    Frustration,
    Anger,
    Fear,
    Anxiety,
    Worry,
}

impl Default for Emotion {
    fn default() -> Self {
        Emotion::Neutral
    }
}

impl Emotion {
    pub const ALL: &'static [Emotion] = &[
        Emotion::Joy,
        Emotion::Excitement,
        Emotion::Gratitude,
        Emotion::Love,
        Emotion::Hope,
        Emotion::Curiosity,
        Emotion::Anticipation,
        Emotion::Contentment,
        Emotion::Contemplative,
        Emotion::Reflective,
        Emotion::Neutral,
        Emotion::Sadness,
        Emotion::Disappointment,
        Emotion::Frustration,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Anxiety,
        Emotion::Worry,
    ];

    /// Parse from a free-form string, coercing anything unrecognized to
    /// `Neutral` rather than failing (spec §6, P6).
    pub fn coerce(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "joy" => Emotion::Joy,
            "excitement" => Emotion::Excitement,
            "gratitude" => Emotion::Gratitude,
            "love" => Emotion::Love,
            "hope" => Emotion::Hope,
            "curiosity" => Emotion::Curiosity,
            "anticipation" => Emotion::Anticipation,
            "contentment" => Emotion::Contentment,
            "contemplative" => Emotion::Contemplative,
            "reflective" => Emotion::Reflective,
            "sadness" => Emotion::Sadness,
            "disappointment" => Emotion::Disappointment,
            "frustration" => Emotion::Frustration,
            "anger" => Emotion::Anger,
            "fear" => Emotion::Fear,
            "anxiety" => Emotion::Anxiety,
            "worry" => Emotion::Worry,
            _ => Emotion::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Excitement => "excitement",
            Emotion::Gratitude => "gratitude",
            Emotion::Love => "love",
            Emotion::Hope => "hope",
            Emotion::Curiosity => "curiosity",
            Emotion::Anticipation => "anticipation",
            Emotion::Contentment => "contentment",
            Emotion::Contemplative => "contemplative",
            Emotion::Reflective => "reflective",
            Emotion::Neutral => "neutral",
            Emotion::Sadness => "sadness",
            Emotion::Disappointment => "disappointment",
            Emotion::Frustration => "frustration",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Anxiety => "anxiety",
            Emotion::Worry => "worry",
        }
    }

    /// Valence used by the trajectory analyzer (C8), spec §4.8.
    pub fn valence(&self) -> f32 {
        match self {
            Emotion::Joy => 2.0,
            Emotion::Excitement => 1.8,
            Emotion::Gratitude => 1.5,
            Emotion::Love => 2.0,
            Emotion::Hope => 1.3,
            Emotion::Contentment => 1.2,
            Emotion::Curiosity => 0.8,
            Emotion::Anticipation => 0.9,
            Emotion::Neutral => 0.0,
            Emotion::Contemplative => 0.2,
            Emotion::Reflective => 0.1,
            Emotion::Sadness => -1.5,
            Emotion::Disappointment => -1.2,
            Emotion::Frustration => -1.0,
            Emotion::Anger => -2.0,
            Emotion::Fear => -1.8,
            Emotion::Anxiety => -1.6,
            Emotion::Worry => -1.3,
        }
    }

    pub fn is_positive_high_confidence_candidate(&self) -> bool {
        matches!(
            self,
            Emotion::Joy
                | Emotion::Excitement
                | Emotion::Gratitude
                | Emotion::Love
                | Emotion::Hope
                | Emotion::Contentment
        )
    }

    pub fn is_strong_negative(&self) -> bool {
        matches!(self, Emotion::Anger | Emotion::Fear | Emotion::Anxiety)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of the Emotion Analyzer (C2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSignal {
    pub primary_emotion: Emotion,
    pub confidence: f32,
    pub intensity: f32,
    pub all_emotions: std::collections::HashMap<Emotion, f32>,
    pub is_multi_emotion: bool,
    pub secondary_emotions: Vec<Emotion>,
}

impl EmotionSignal {
    pub fn neutral_fallback() -> Self {
        Self {
            primary_emotion: Emotion::Neutral,
            confidence: 0.0,
            intensity: 0.0,
            all_emotions: std::collections::HashMap::new(),
            is_multi_emotion: false,
            secondary_emotions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unknown_emotion_coerces_to_neutral() {
        assert_eq!(Emotion::coerce("zoomies"), Emotion::Neutral);
        assert_eq!(Emotion::coerce(""), Emotion::Neutral);
    }

    #[test]
    fn round_trips_through_as_str() {
        for e in Emotion::ALL {
            assert_eq!(Emotion::coerce(e.as_str()), *e);
        }
    }

    proptest! {
        /// P6: for all inputs, `Emotion::coerce` lands in the closed set of §6.
        #[test]
        fn p6_coerce_is_always_in_closed_set(raw in ".*") {
            let coerced = Emotion::coerce(&raw);
            prop_assert!(Emotion::ALL.contains(&coerced));
        }

        /// Mixed-case and surrounding variants of a known name still coerce
        /// to the same emotion (coercion lower-cases before matching).
        #[test]
        fn p6_case_insensitive_round_trip(idx in 0..Emotion::ALL.len()) {
            let e = Emotion::ALL[idx];
            prop_assert_eq!(Emotion::coerce(&e.as_str().to_ascii_uppercase()), e);
        }
    }
}
