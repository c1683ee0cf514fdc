//! Per-context pseudonym assignment, spec §4.11.
//!
//! `Contextualized` mode hands out `user_N` in first-seen order, kept in a
//! `DashMap<ContextId, ContextState>` so sequencing is per-context rather
//! than global. `Anonymous` mode needs no stored sequence at all — it's a
//! pure `Sha256` + `hex::encode` hash of `(context_id, user_id)`, giving a
//! stable pseudonym with no stored state.

use dashmap::DashMap;
use parking_lot::Mutex;
use personaforge_types::{AttributionId, ContextId, IdentityLevel, UserId};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Default)]
struct ContextState {
    sequence: Mutex<HashMap<UserId, u32>>,
}

#[derive(Default)]
pub struct PseudonymRegistry {
    contexts: DashMap<ContextId, ContextState>,
}

impl PseudonymRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic and stable within `context_id` (P3): repeated calls for
    /// the same `(context_id, user_id)` always return the same id, and
    /// distinct users in the same context always get distinct ids.
    pub fn attribution_id(
        &self,
        level: IdentityLevel,
        user_id: &UserId,
        context_id: &ContextId,
    ) -> AttributionId {
        match level {
            IdentityLevel::Identified => AttributionId::from(user_id.as_str().to_string()),
            IdentityLevel::Contextualized => self.sequential(user_id, context_id),
            IdentityLevel::Anonymous => Self::hashed(user_id, context_id),
        }
    }

    fn sequential(&self, user_id: &UserId, context_id: &ContextId) -> AttributionId {
        let state = self.contexts.entry(context_id.clone()).or_default();
        let mut sequence = state.sequence.lock();
        let next_ordinal = sequence.len() as u32 + 1;
        let ordinal = *sequence.entry(user_id.clone()).or_insert(next_ordinal);
        AttributionId::from(format!("user_{ordinal}"))
    }

    fn hashed(user_id: &UserId, context_id: &ContextId) -> AttributionId {
        let mut hasher = Sha256::new();
        hasher.update(context_id.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(user_id.as_str().as_bytes());
        let digest = hex::encode(hasher.finalize());
        AttributionId::from(format!("anon_{}", &digest[..10]))
    }

    pub fn clear(&self, context_id: &ContextId) {
        self.contexts.remove(context_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contextualized_ids_are_stable_and_distinct() {
        let registry = PseudonymRegistry::new();
        let ctx = ContextId::from("c1");
        let u1 = UserId::from("u1");
        let u2 = UserId::from("u2");

        let a = registry.attribution_id(IdentityLevel::Contextualized, &u1, &ctx);
        let b = registry.attribution_id(IdentityLevel::Contextualized, &u1, &ctx);
        assert_eq!(a, b);

        let c = registry.attribution_id(IdentityLevel::Contextualized, &u2, &ctx);
        assert_ne!(a, c);
    }

    #[test]
    fn same_user_different_contexts_are_independent() {
        let registry = PseudonymRegistry::new();
        let u1 = UserId::from("u1");
        let ctx_a = ContextId::from("a");
        let ctx_b = ContextId::from("b");

        // u1 is first-seen in both contexts, so both get user_1 independently.
        let in_a = registry.attribution_id(IdentityLevel::Contextualized, &u1, &ctx_a);
        let in_b = registry.attribution_id(IdentityLevel::Contextualized, &u1, &ctx_b);
        assert_eq!(in_a.as_str(), "user_1");
        assert_eq!(in_b.as_str(), "user_1");
    }

    #[test]
    fn anonymous_ids_are_deterministic() {
        let ctx = ContextId::from("c1");
        let user = UserId::from("u1");
        let a = PseudonymRegistry::hashed(&user, &ctx);
        let b = PseudonymRegistry::hashed(&user, &ctx);
        assert_eq!(a, b);
    }

    #[test]
    fn clear_resets_sequence() {
        let registry = PseudonymRegistry::new();
        let ctx = ContextId::from("c1");
        let u1 = UserId::from("u1");
        registry.attribution_id(IdentityLevel::Contextualized, &u1, &ctx);
        registry.clear(&ctx);

        let u2 = UserId::from("u2");
        let first_after_clear = registry.attribution_id(IdentityLevel::Contextualized, &u2, &ctx);
        assert_eq!(first_after_clear.as_str(), "user_1");
    }

    proptest! {
        /// P3: repeated calls for the same `(user_id, context_id)` under
        /// `Anonymous` mode return the same id, for arbitrary inputs.
        #[test]
        fn p3_anonymous_id_is_stable(ctx in "[a-z0-9]{1,12}", user in "[a-z0-9]{1,12}") {
            let ctx_id = ContextId::from(ctx);
            let user_id = UserId::from(user);
            let a = PseudonymRegistry::hashed(&user_id, &ctx_id);
            let b = PseudonymRegistry::hashed(&user_id, &ctx_id);
            prop_assert_eq!(a, b);
        }

        /// P4: the same `user_id` may land on the same sequential ordinal in
        /// two independent, never-cross-referenced contexts (no leakage).
        #[test]
        fn p4_cross_context_independence(
            ctx_a in "[a-z]{1,8}",
            ctx_b in "[a-z]{1,8}",
            user in "[a-z0-9]{1,12}",
        ) {
            prop_assume!(ctx_a != ctx_b);
            let registry = PseudonymRegistry::new();
            let user_id = UserId::from(user);
            let id_a = registry.attribution_id(IdentityLevel::Contextualized, &user_id, &ContextId::from(ctx_a));
            let id_b = registry.attribution_id(IdentityLevel::Contextualized, &user_id, &ContextId::from(ctx_b));
            // Both are first-seen in their own context, so both are "user_1" —
            // proving the sequence counter never crosses the context boundary.
            prop_assert_eq!(id_a.as_str(), "user_1");
            prop_assert_eq!(id_b.as_str(), "user_1");
        }
    }
}
