/// Closed cue-phrase categories of §4.7's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicTransition {
    ExplicitChange,
    Resumption,
    Completion,
    NaturalFlow,
    NewSession,
}

impl TopicTransition {
    /// `true` for the categories the table marks as triggering `NATURAL_FLOW`
    /// (i.e. the current topic continues rather than being closed).
    pub fn is_flow(&self) -> bool {
        matches!(self, TopicTransition::Completion | TopicTransition::NaturalFlow)
    }
}

const EXPLICIT_CHANGE_CUES: &[&str] = &[
    "by the way", "new topic", "moving on", "anyway", "speaking of",
    "different question", "change subject", "on another note",
];
const RESUMPTION_CUES: &[&str] = &["back to", "as i was saying", "returning to", "earlier you mentioned"];
const COMPLETION_CUES: &[&str] = &["thanks", "makes sense", "that's all", "got it", "understood", "perfect"];

/// Detects the cue category for `text`. `is_first_message` derives
/// `NewSession` (the fourth row of the table: "derived (1st message)").
pub fn detect(text: &str, is_first_message: bool) -> TopicTransition {
    if is_first_message {
        return TopicTransition::NewSession;
    }
    let lower = text.to_ascii_lowercase();
    if EXPLICIT_CHANGE_CUES.iter().any(|cue| lower.contains(cue)) {
        return TopicTransition::ExplicitChange;
    }
    if RESUMPTION_CUES.iter().any(|cue| lower.contains(cue)) {
        return TopicTransition::Resumption;
    }
    if COMPLETION_CUES.iter().any(|cue| lower.contains(cue)) {
        return TopicTransition::Completion;
    }
    TopicTransition::NaturalFlow
}
