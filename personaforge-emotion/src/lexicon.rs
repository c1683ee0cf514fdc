use personaforge_types::{Emotion, EmotionSignal};
use std::collections::HashMap;

/// Cue words per emotion. Deliberately small and hand-picked rather than a
/// sourced sentiment dictionary — the contract is a deterministic, offline
/// fallback, not state-of-the-art classification accuracy.
fn cues(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Joy => &["happy", "joy", "joyful", "delighted", "glad", "wonderful"],
        Emotion::Excitement => &["excited", "thrilled", "pumped", "can't wait", "stoked"],
        Emotion::Gratitude => &["thank", "thanks", "grateful", "appreciate"],
        Emotion::Love => &["love", "adore", "cherish"],
        Emotion::Hope => &["hope", "hopeful", "optimistic", "looking forward"],
        Emotion::Curiosity => &["curious", "wonder", "wondering", "intrigued"],
        Emotion::Anticipation => &["anticipate", "can't wait", "about to", "soon"],
        Emotion::Contentment => &["content", "satisfied", "at peace", "comfortable"],
        Emotion::Contemplative => &["thinking about", "pondering", "reflecting", "considering"],
        Emotion::Reflective => &["looking back", "in hindsight", "realize now"],
        Emotion::Sadness => &["sad", "down", "unhappy", "depressed", "miserable"],
        Emotion::Disappointment => &["disappointed", "let down", "bummed"],
        Emotion::Frustration => &["frustrated", "annoyed", "irritated", "fed up"],
        Emotion::Anger => &["angry", "furious", "mad", "livid", "pissed"],
        Emotion::Fear => &["afraid", "scared", "terrified", "frightened"],
        Emotion::Anxiety => &["anxious", "nervous", "on edge", "uneasy"],
        Emotion::Worry => &["worried", "worry", "concerned", "overwhelmed"],
        Emotion::Neutral => &[],
    }
}

fn intensifiers() -> &'static [&'static str] {
    &["very", "extremely", "really", "so", "incredibly", "absolutely"]
}

/// Scores every emotion in the closed set against `text`, picks the highest
/// as primary, and derives intensity from exclamation marks and intensifier
/// words layered on top of the cue-match strength.
pub fn classify(text: &str) -> EmotionSignal {
    let lowercase = text.to_ascii_lowercase();
    if lowercase.trim().is_empty() {
        return EmotionSignal::neutral_fallback();
    }

    let word_count = lowercase.split_whitespace().count().max(1) as f32;
    let mut scores: HashMap<Emotion, f32> = HashMap::new();

    for &emotion in Emotion::ALL {
        if emotion == Emotion::Neutral {
            continue;
        }
        let hits = cues(emotion)
            .iter()
            .filter(|cue| lowercase.contains(*cue))
            .count();
        if hits > 0 {
            let score = (hits as f32 / word_count.sqrt()).min(1.0);
            scores.insert(emotion, score);
        }
    }

    if scores.is_empty() {
        return EmotionSignal::neutral_fallback();
    }

    let mut ranked: Vec<(Emotion, f32)> = scores.iter().map(|(e, s)| (*e, *s)).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (primary_emotion, top_score) = ranked[0];
    let exclamations = text.matches('!').count() as f32;
    let intensifier_hits = intensifiers()
        .iter()
        .filter(|w| lowercase.contains(*w))
        .count() as f32;
    let intensity = (top_score + 0.1 * exclamations + 0.1 * intensifier_hits).clamp(0.0, 1.0);
    let confidence = top_score.clamp(0.0, 1.0);

    // A second emotion within 0.2 of the top one counts as co-present.
    let secondary_emotions: Vec<Emotion> = ranked
        .iter()
        .skip(1)
        .take_while(|(_, score)| top_score - score <= 0.2)
        .map(|(e, _)| *e)
        .collect();
    let is_multi_emotion = !secondary_emotions.is_empty();

    EmotionSignal {
        primary_emotion,
        confidence,
        intensity,
        all_emotions: scores,
        is_multi_emotion,
        secondary_emotions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_is_neutral() {
        let signal = classify("");
        assert_eq!(signal.primary_emotion, Emotion::Neutral);
        assert_eq!(signal.confidence, 0.0);
    }

    #[test]
    fn unmatched_text_is_neutral() {
        let signal = classify("The quick brown fox jumps over the lazy dog.");
        assert_eq!(signal.primary_emotion, Emotion::Neutral);
    }

    #[test]
    fn joyful_text_is_classified_joy() {
        let signal = classify("I'm so happy and delighted today!");
        assert_eq!(signal.primary_emotion, Emotion::Joy);
        assert!(signal.confidence > 0.0);
        assert!(signal.intensity > signal.confidence - 0.01);
    }

    #[test]
    fn angry_text_outranks_weaker_matches() {
        let signal = classify("I am furious and mad about this, it's infuriating");
        assert_eq!(signal.primary_emotion, Emotion::Anger);
    }

    #[test]
    fn confidence_and_intensity_stay_in_unit_interval() {
        let signal = classify("I am so so so thrilled, excited, happy, grateful!!!!!!");
        assert!(signal.confidence <= 1.0);
        assert!(signal.intensity <= 1.0);
    }

    proptest! {
        /// For arbitrary input, `classify` never panics and always returns a
        /// primary emotion in the closed set with confidence/intensity in
        /// `[0, 1]` (spec §4.2, §6).
        #[test]
        fn p6_classify_never_panics_and_stays_bounded(text in ".{0,300}") {
            let signal = classify(&text);
            prop_assert!(Emotion::ALL.contains(&signal.primary_emotion));
            prop_assert!((0.0..=1.0).contains(&signal.confidence));
            prop_assert!((0.0..=1.0).contains(&signal.intensity));
        }
    }
}
