use crate::keywords::extract_keywords;
use crate::transitions::{self, TopicTransition};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use personaforge_types::{
    ChannelId, ConversationKey, MessageId, ResolutionStatus, Session, SessionId, SessionState,
    Topic, TopicId, UserId,
};
use std::sync::Arc;

/// Message count that triggers a context-summary recompute (§6
/// `summarization_threshold`, default 8).
const DEFAULT_SUMMARIZATION_THRESHOLD: u32 = 8;

struct Entry {
    session: Session,
    last_message_id: Option<MessageId>,
}

pub struct BoundaryManager {
    inactivity_window: Duration,
    summarization_threshold: u32,
    sessions: DashMap<ConversationKey, Arc<RwLock<Entry>>>,
}

impl BoundaryManager {
    pub fn new(inactivity_window: Duration) -> Self {
        Self {
            inactivity_window,
            summarization_threshold: DEFAULT_SUMMARIZATION_THRESHOLD,
            sessions: DashMap::new(),
        }
    }

    pub fn with_summarization_threshold(mut self, threshold: u32) -> Self {
        self.summarization_threshold = threshold;
        self
    }

    /// Idempotent by `message_id`: re-processing the same message returns
    /// the session unchanged.
    pub fn process_message(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        message_id: MessageId,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Session {
        let key = ConversationKey::new(user_id.clone(), channel_id.clone());
        let entry_arc = self
            .sessions
            .entry(key)
            .or_insert_with(|| {
                Arc::new(RwLock::new(Entry {
                    session: new_session(user_id, channel_id, timestamp),
                    last_message_id: None,
                }))
            })
            .clone();
        let mut entry = entry_arc.write();

        if entry.last_message_id.as_ref() == Some(&message_id) {
            return entry.session.clone();
        }

        let is_first_message = entry.session.message_count == 0;
        if !is_first_message
            && timestamp - entry.session.last_activity_at > self.inactivity_window
        {
            entry.session.state = SessionState::Paused;
            tracing::debug!(session = %entry.session.session_id, "session timed out, marking paused");
            // §4.7: "to resumed on next message" — this message is that next
            // message, so the pause above is immediately superseded.
            entry.session.state = SessionState::Resumed;
        } else if entry.session.state == SessionState::Resumed {
            entry.session.state = SessionState::Active;
        }

        entry.session.last_activity_at = timestamp;
        entry.session.message_count += 1;

        let transition = transitions::detect(text, is_first_message);
        match transition {
            TopicTransition::NewSession => {
                open_topic(&mut entry.session, text, timestamp);
            }
            _ if !transition.is_flow() => {
                close_topic(&mut entry.session, resolution_for(transition), timestamp);
                open_topic(&mut entry.session, text, timestamp);
            }
            _ => {
                if let Some(topic) = entry.session.current_topic.as_mut() {
                    topic.message_count += 1;
                } else {
                    open_topic(&mut entry.session, text, timestamp);
                }
            }
        }

        if entry.session.message_count >= self.summarization_threshold {
            entry.session.context_summary = digest_summary(&entry.session);
        }

        entry.last_message_id = Some(message_id);
        entry.session.clone()
    }

    pub fn handle_interruption(&self, user_id: &UserId, channel_id: &ChannelId, interrupter_id: &UserId) {
        let key = ConversationKey::new(user_id.clone(), channel_id.clone());
        let Some(entry_lock) = self.sessions.get(&key) else {
            return;
        };
        let mut entry = entry_lock.write();
        if let Some(topic) = entry.session.current_topic.as_mut() {
            topic.end_at = Some(Utc::now());
            topic.resolution_status = ResolutionStatus::Interrupted;
        }
        entry.session.state = SessionState::Interrupted;
        tracing::debug!(%user_id, %interrupter_id, "conversation interrupted");
    }

    /// Returns a bridge string when the session was paused or interrupted;
    /// `None` if there is no session or it was already active.
    pub fn resume(&self, user_id: &UserId, channel_id: &ChannelId, resume_text: &str) -> Option<String> {
        let key = ConversationKey::new(user_id.clone(), channel_id.clone());
        let entry_lock = self.sessions.get(&key)?;
        let mut entry = entry_lock.write();

        if !matches!(entry.session.state, SessionState::Paused | SessionState::Interrupted) {
            return None;
        }

        let bridge = resumption_bridge(&entry.session);

        let resume_lower = resume_text.to_ascii_lowercase();
        let resumes_last_topic = entry
            .session
            .current_topic
            .as_ref()
            .map(|t| t.keywords.iter().any(|k| resume_lower.contains(k.as_str())))
            .unwrap_or(false);

        if resumes_last_topic {
            if let Some(topic) = entry.session.current_topic.as_mut() {
                topic.end_at = None;
                topic.resolution_status = ResolutionStatus::Resumed;
            }
        } else {
            open_topic(&mut entry.session, resume_text, Utc::now());
        }

        entry.session.state = SessionState::Resumed;
        entry.session.last_activity_at = Utc::now();
        Some(bridge)
    }

    pub fn end(&self, user_id: &UserId, channel_id: &ChannelId, _reason: &str) -> Option<String> {
        let key = ConversationKey::new(user_id.clone(), channel_id.clone());
        let (_, entry_arc) = self.sessions.remove(&key)?;
        let mut entry = entry_arc.write();
        if let Some(topic) = entry.session.current_topic.as_mut() {
            topic.end_at = Some(Utc::now());
            topic.resolution_status = ResolutionStatus::Resolved;
        }
        entry.session.state = SessionState::Completed;
        Some(final_summary(&entry.session))
    }

    pub fn get(&self, user_id: &UserId, channel_id: &ChannelId) -> Option<Session> {
        let key = ConversationKey::new(user_id.clone(), channel_id.clone());
        self.sessions.get(&key).map(|e| e.read().session.clone())
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|e| e.read().session.state == SessionState::Active)
            .count()
    }
}

fn new_session(user_id: UserId, channel_id: ChannelId, timestamp: DateTime<Utc>) -> Session {
    Session {
        session_id: SessionId::from(uuid::Uuid::new_v4().to_string()),
        user_id,
        channel_id,
        state: SessionState::Active,
        start_at: timestamp,
        last_activity_at: timestamp,
        current_topic: None,
        topic_history: Vec::new(),
        message_count: 0,
        context_summary: String::new(),
    }
}

fn open_topic(session: &mut Session, text: &str, timestamp: DateTime<Utc>) {
    let topic = Topic {
        topic_id: TopicId::from(uuid::Uuid::new_v4().to_string()),
        keywords: extract_keywords(text),
        start_at: timestamp,
        end_at: None,
        message_count: 1,
        emotional_tone: None,
        resolution_status: ResolutionStatus::Ongoing,
    };
    session.current_topic = Some(topic.clone());
    session.topic_history.push(topic);
}

fn close_topic(session: &mut Session, status: ResolutionStatus, timestamp: DateTime<Utc>) {
    if let Some(topic) = session.current_topic.as_mut() {
        topic.end_at = Some(timestamp);
        topic.resolution_status = status;
        if let Some(last) = session.topic_history.last_mut() {
            last.end_at = topic.end_at;
            last.resolution_status = status;
        }
    }
}

fn resolution_for(transition: TopicTransition) -> ResolutionStatus {
    match transition {
        TopicTransition::ExplicitChange => ResolutionStatus::Ended,
        TopicTransition::Resumption => ResolutionStatus::Resumed,
        _ => ResolutionStatus::Ended,
    }
}

fn digest_summary(session: &Session) -> String {
    let topics: Vec<String> = session
        .topic_history
        .iter()
        .filter(|t| t.message_count >= 3)
        .map(|t| {
            let kw = t.keywords.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
            format!("discussed {kw} ({} messages)", t.message_count)
        })
        .collect();
    format!(
        "{} messages across {} topic(s). {}",
        session.message_count,
        session.topic_history.len(),
        topics.join("; ")
    )
}

fn resumption_bridge(session: &Session) -> String {
    let Some(topic) = session.topic_history.last().or(session.current_topic.as_ref()) else {
        return "Welcome back! How can I help you today?".to_string();
    };
    let keywords = topic.keywords.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    let gap = Utc::now() - session.last_activity_at;
    let minutes = gap.num_seconds() as f64 / 60.0;
    let time_phrase = if minutes < 60.0 {
        format!("{minutes:.0} minutes ago")
    } else if minutes < 1440.0 {
        format!("{:.1} hours ago", minutes / 60.0)
    } else {
        format!("{:.1} days ago", minutes / 1440.0)
    };
    if keywords.is_empty() {
        format!("Welcome back! It's been {time_phrase}. How can I help?")
    } else {
        format!("Welcome back! We were discussing {keywords} {time_phrase}.")
    }
}

fn final_summary(session: &Session) -> String {
    let resolved: Vec<&Topic> = session
        .topic_history
        .iter()
        .filter(|t| matches!(t.resolution_status, ResolutionStatus::Resolved))
        .collect();
    let mut summary = format!("Conversation ended with {} messages.", session.message_count);
    if !resolved.is_empty() {
        let topics: Vec<String> = resolved
            .iter()
            .map(|t| t.keywords.iter().take(2).cloned().collect::<Vec<_>>().join(", "))
            .collect();
        summary.push_str(&format!(" Resolved: {}.", topics.join("; ")));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dm() -> BoundaryManager {
        BoundaryManager::new(Duration::minutes(30))
    }

    #[test]
    fn first_message_creates_active_session_with_topic() {
        let mgr = dm();
        let session = mgr.process_message(
            UserId::from("u1"),
            ChannelId::from("c1"),
            MessageId::from("m1"),
            "Hi there, what's your favorite book?",
            Utc::now(),
        );
        assert_eq!(session.state, SessionState::Active);
        assert_eq!(session.message_count, 1);
        assert!(session.current_topic.is_some());
    }

    #[test]
    fn reprocessing_same_message_id_is_a_no_op() {
        let mgr = dm();
        let user = UserId::from("u1");
        let channel = ChannelId::from("c1");
        let at = Utc::now();
        mgr.process_message(user.clone(), channel.clone(), MessageId::from("m1"), "hello", at);
        let again = mgr.process_message(user, channel, MessageId::from("m1"), "hello", at);
        assert_eq!(again.message_count, 1);
    }

    #[test]
    fn inactivity_window_pauses_then_next_message_is_processed() {
        let mgr = dm();
        let user = UserId::from("u1");
        let channel = ChannelId::from("c1");
        let t0 = Utc::now();
        mgr.process_message(user.clone(), channel.clone(), MessageId::from("m1"), "hello", t0);
        let t2 = t0 + Duration::minutes(31);
        let session = mgr.process_message(user, channel, MessageId::from("m2"), "hello again", t2);
        assert_eq!(session.message_count, 2);
        assert_eq!(session.state, SessionState::Resumed);
    }

    /// P11: given `t0 < t1 < t0 + pause < t2`, processing at `t0, t2` takes
    /// the session `active -> paused -> resumed`, then a later, unremarkable
    /// message settles it back to `active`.
    #[test]
    fn p11_session_transitions_through_paused_to_resumed() {
        let mgr = dm();
        let user = UserId::from("u1");
        let channel = ChannelId::from("c1");
        let t0 = Utc::now();
        let first = mgr.process_message(user.clone(), channel.clone(), MessageId::from("m1"), "hello", t0);
        assert_eq!(first.state, SessionState::Active);

        let t2 = t0 + Duration::minutes(31);
        let resumed = mgr.process_message(user.clone(), channel.clone(), MessageId::from("m2"), "hello again", t2);
        assert_eq!(resumed.state, SessionState::Resumed);

        let t3 = t2 + Duration::seconds(5);
        let settled = mgr.process_message(user, channel, MessageId::from("m3"), "continuing on", t3);
        assert_eq!(settled.state, SessionState::Active);
    }

    #[test]
    fn explicit_change_cue_opens_new_topic_and_closes_old_one() {
        let mgr = dm();
        let user = UserId::from("u1");
        let channel = ChannelId::from("c1");
        let t0 = Utc::now();
        mgr.process_message(user.clone(), channel.clone(), MessageId::from("m1"), "I'm overwhelmed with work", t0);
        let session = mgr.process_message(
            user,
            channel,
            MessageId::from("m2"),
            "By the way, what's your favorite book?",
            t0 + Duration::seconds(5),
        );
        assert_eq!(session.topic_history.len(), 2);
        assert_eq!(session.topic_history[0].resolution_status, ResolutionStatus::Ended);
        assert!(session.current_topic.unwrap().keywords.iter().any(|k| k == "book" || k == "favorite"));
    }

    #[test]
    fn resume_after_interruption_produces_bridge() {
        let mgr = dm();
        let user = UserId::from("u1");
        let channel = ChannelId::from("c1");
        mgr.process_message(user.clone(), channel.clone(), MessageId::from("m1"), "talking about movies", Utc::now());
        mgr.handle_interruption(&user, &channel, &UserId::from("u2"));

        let bridge = mgr.resume(&user, &channel, "back to movies");
        assert!(bridge.is_some());
        let session = mgr.get(&user, &channel).unwrap();
        assert_eq!(session.state, SessionState::Resumed);
    }

    #[test]
    fn end_removes_session_and_returns_summary() {
        let mgr = dm();
        let user = UserId::from("u1");
        let channel = ChannelId::from("c1");
        mgr.process_message(user.clone(), channel.clone(), MessageId::from("m1"), "hello", Utc::now());
        let summary = mgr.end(&user, &channel, "natural_end");
        assert!(summary.is_some());
        assert!(mgr.get(&user, &channel).is_none());
    }
}
