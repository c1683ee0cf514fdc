//! Per-conversation serialization, spec §5: "within a `(user_id,
//! channel_id)`, turns are processed serially." A `DashMap` of per-key
//! locks rather than one global mutex — the same pattern C7's
//! `BoundaryManager` uses for its session map.

use dashmap::DashMap;
use personaforge_types::ConversationKey;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct ConversationLocks {
    locks: DashMap<ConversationKey, Arc<Mutex<()>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the per-conversation lock, creating it on first use. Held
    /// for the lifetime of the returned guard — callers should hold it for
    /// the full scatter-gather-compose-persist sequence of one turn.
    pub async fn acquire(&self, key: &ConversationKey) -> OwnedMutexGuard<()> {
        let mutex = self.locks.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
        mutex.lock_owned().await
    }
}
