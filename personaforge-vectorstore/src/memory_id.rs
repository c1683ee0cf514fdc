//! Stable, content- and persona-derived memory IDs so re-ingesting the
//! identical turn is idempotent (§3, §4.3, P2).

use chrono::{DateTime, Utc};
use personaforge_types::{PersonaId, UserId};
use sha2::{Digest, Sha256};

pub fn generate_memory_id(
    persona_id: &PersonaId,
    user_id: &UserId,
    content: &str,
    created_at: DateTime<Utc>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(persona_id.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(user_id.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(content.as_bytes());
    hasher.update(b"\0");
    hasher.update(created_at.timestamp_micros().to_le_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_yield_identical_id() {
        let persona = PersonaId::from("elena");
        let user = UserId::from("u1");
        let now = Utc::now();
        let a = generate_memory_id(&persona, &user, "hello", now);
        let b = generate_memory_id(&persona, &user, "hello", now);
        assert_eq!(a, b);
    }

    #[test]
    fn different_persona_yields_different_id() {
        let user = UserId::from("u1");
        let now = Utc::now();
        let a = generate_memory_id(&PersonaId::from("elena"), &user, "hello", now);
        let b = generate_memory_id(&PersonaId::from("marcus"), &user, "hello", now);
        assert_ne!(a, b);
    }
}
