/*!
# personaforge-cache

Conversation Cache (C6): a short-window, per-channel ring of recent messages,
sharded per channel via `DashMap<ChannelId, RwLock<VecDeque<CachedMessage>>>`
so channels never contend with each other.
*/

use dashmap::DashMap;
use parking_lot::RwLock;
use personaforge_types::{CachedMessage, ChannelId, MessageId, UserId};
use std::collections::VecDeque;

/// Ring capacity per channel (§6 `conversation_cache_max_local`, default 50).
const DEFAULT_MAX_LOCAL: usize = 50;

pub struct ConversationCache {
    max_local: usize,
    channels: DashMap<ChannelId, RwLock<VecDeque<CachedMessage>>>,
}

impl Default for ConversationCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOCAL)
    }
}

impl ConversationCache {
    pub fn new(max_local: usize) -> Self {
        Self {
            max_local: max_local.max(1),
            channels: DashMap::new(),
        }
    }

    /// O(1) append; evicts the oldest entry beyond `max_local`.
    pub fn append(&self, channel_id: ChannelId, message: CachedMessage) {
        let ring = self.channels.entry(channel_id).or_default();
        let mut ring = ring.write();
        ring.push_back(message);
        while ring.len() > self.max_local {
            ring.pop_front();
        }
    }

    /// Seeds an empty channel ring from the transport's own history. A no-op
    /// if the channel already has entries — bootstrap only ever fires on
    /// first access, never clobbers what's already cached.
    pub fn bootstrap(&self, channel_id: ChannelId, messages: impl IntoIterator<Item = CachedMessage>) {
        let ring = self.channels.entry(channel_id).or_default();
        let mut ring = ring.write();
        if !ring.is_empty() {
            return;
        }
        ring.extend(messages);
        while ring.len() > self.max_local {
            ring.pop_front();
        }
    }

    /// Most recent messages authored by `user_id` or by the bot, in
    /// chronological order, at most `limit` entries, optionally excluding
    /// one message by id (the one currently being processed).
    pub fn get_user_context(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
        limit: usize,
        exclude_message_id: Option<&MessageId>,
    ) -> Vec<CachedMessage> {
        let Some(ring) = self.channels.get(channel_id) else {
            return Vec::new();
        };
        let ring = ring.read();
        let matching: Vec<&CachedMessage> = ring
            .iter()
            .filter(|m| {
                let author_matches = &m.author_id == user_id || m.is_bot;
                let not_excluded = match (exclude_message_id, &m.message_id) {
                    (Some(ex), Some(id)) => id != ex,
                    _ => true,
                };
                author_matches && not_excluded
            })
            .collect();
        matching.into_iter().rev().take(limit).rev().cloned().collect()
    }

    pub fn clear(&self, channel_id: &ChannelId) {
        if let Some(ring) = self.channels.get(channel_id) {
            ring.write().clear();
        }
    }

    /// Informational only: records whether the just-appended message has
    /// been durably persisted. Does not affect cache contents or eviction.
    pub fn sync_with_storage(&self, channel_id: &ChannelId, persist_succeeded: bool) {
        if !persist_succeeded {
            tracing::warn!(channel = %channel_id, "conversation cache entry not durably persisted");
        }
    }

    pub fn len(&self, channel_id: &ChannelId) -> usize {
        self.channels.get(channel_id).map(|r| r.read().len()).unwrap_or(0)
    }

    pub fn is_empty(&self, channel_id: &ChannelId) -> bool {
        self.len(channel_id) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use personaforge_types::MessageSource;

    fn msg(author: &str, is_bot: bool) -> CachedMessage {
        CachedMessage {
            message_id: None,
            content: format!("hi from {author}"),
            author_id: UserId::from(author),
            author_name: author.to_string(),
            timestamp: Utc::now(),
            is_bot,
            source: MessageSource::Platform,
        }
    }

    #[test]
    fn append_evicts_beyond_max_local() {
        let cache = ConversationCache::new(3);
        let channel = ChannelId::from("c1");
        for i in 0..5 {
            cache.append(channel.clone(), msg(&format!("u{i}"), false));
        }
        assert_eq!(cache.len(&channel), 3);
    }

    #[test]
    fn get_user_context_includes_bot_and_author_only() {
        let cache = ConversationCache::new(50);
        let channel = ChannelId::from("c1");
        cache.append(channel.clone(), msg("u1", false));
        cache.append(channel.clone(), msg("u2", false));
        cache.append(channel.clone(), msg("bot", true));

        let ctx = cache.get_user_context(&channel, &UserId::from("u1"), 10, None);
        assert_eq!(ctx.len(), 2);
        assert!(ctx.iter().any(|m| m.is_bot));
        assert!(ctx.iter().any(|m| m.author_id == UserId::from("u1")));
        assert!(!ctx.iter().any(|m| m.author_id == UserId::from("u2")));
    }

    #[test]
    fn bootstrap_only_fires_when_empty() {
        let cache = ConversationCache::new(50);
        let channel = ChannelId::from("c1");
        cache.append(channel.clone(), msg("u1", false));
        cache.bootstrap(channel.clone(), vec![msg("u2", false), msg("u3", false)]);
        assert_eq!(cache.len(&channel), 1);

        let fresh_channel = ChannelId::from("c2");
        cache.bootstrap(fresh_channel.clone(), vec![msg("u2", false), msg("u3", false)]);
        assert_eq!(cache.len(&fresh_channel), 2);
    }

    #[test]
    fn clear_empties_the_ring() {
        let cache = ConversationCache::new(50);
        let channel = ChannelId::from("c1");
        cache.append(channel.clone(), msg("u1", false));
        cache.clear(&channel);
        assert!(cache.is_empty(&channel));
    }
}
