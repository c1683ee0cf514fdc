//! Memory narrative rendering, spec §4.10 step 4: retrieved memories are
//! never shown to the LLM as raw JSON or score numbers — each becomes a
//! short tagged clause, partitioned into a recent window and everything
//! older.

use chrono::{DateTime, Utc};
use personaforge_types::MemoryRecord;

const RECENT_WINDOW_HOURS: i64 = 2;
const MAX_CLAUSE_CHARS: usize = 120;

pub struct MemoryNarrative {
    pub recent_conversation_context: Vec<String>,
    pub previous_interactions_and_facts: Vec<String>,
}

pub fn build_narrative(memories: &[MemoryRecord], now: DateTime<Utc>) -> MemoryNarrative {
    let mut recent = Vec::new();
    let mut previous = Vec::new();

    for record in memories {
        let clause = render_clause(record);
        let age = now.signed_duration_since(record.created_at);
        if age.num_hours() < RECENT_WINDOW_HOURS && age.num_seconds() >= 0 {
            recent.push(clause);
        } else {
            previous.push(clause);
        }
    }

    MemoryNarrative {
        recent_conversation_context: recent,
        previous_interactions_and_facts: previous,
    }
}

fn render_clause(record: &MemoryRecord) -> String {
    let truncated = truncate_chars(&record.content, MAX_CLAUSE_CHARS);
    format!("{} ({})", truncated, record.payload.primary_emotion.as_str())
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

impl MemoryNarrative {
    /// Renders both sections into the plain-text form dropped into the
    /// system message; empty sections are omitted entirely.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if !self.recent_conversation_context.is_empty() {
            out.push_str("Recent conversation context:\n");
            for clause in &self.recent_conversation_context {
                out.push_str("- ");
                out.push_str(clause);
                out.push('\n');
            }
        }
        if !self.previous_interactions_and_facts.is_empty() {
            out.push_str("Previous interactions and facts:\n");
            for clause in &self.previous_interactions_and_facts {
                out.push_str("- ");
                out.push_str(clause);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use personaforge_types::{Emotion, MemoryPayload, MemorySource, PersonaId, UserId};

    fn record(content: &str, created_at: DateTime<Utc>) -> MemoryRecord {
        MemoryRecord {
            memory_id: "m".to_string(),
            persona_id: PersonaId::from("elena"),
            user_id: UserId::from("u1"),
            channel_id: "c1".into(),
            content: content.to_string(),
            created_at,
            vectors: Default::default(),
            payload: MemoryPayload {
                primary_emotion: Emotion::Joy,
                emotion_confidence: 0.8,
                emotion_intensity: 0.5,
                is_multi_emotion: false,
                secondary_emotions: vec![],
                relationship_level: 0.5,
                interaction_count: 1,
                topic_tags: vec![],
                source: MemorySource::Turn,
            },
        }
    }

    #[test]
    fn partitions_by_two_hour_window() {
        let now = Utc::now();
        let memories = vec![
            record("just now", now - chrono::Duration::minutes(10)),
            record("a while ago", now - chrono::Duration::hours(5)),
        ];
        let narrative = build_narrative(&memories, now);
        assert_eq!(narrative.recent_conversation_context.len(), 1);
        assert_eq!(narrative.previous_interactions_and_facts.len(), 1);
    }

    #[test]
    fn long_content_is_truncated_under_120_chars() {
        let now = Utc::now();
        let long = "x".repeat(500);
        let memories = vec![record(&long, now)];
        let narrative = build_narrative(&memories, now);
        assert!(narrative.recent_conversation_context[0].chars().count() <= 130);
    }
}
