use crate::schema;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use personaforge_types::{
    Fact, PersonaId, PipelineError, RelationshipDelta, RelationshipState, Turn, TurnId, UserId,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub struct RelationalStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub platform: String,
    pub display_name: String,
    pub first_seen: DateTime<Utc>,
}

impl RelationalStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let conn = Connection::open(path).map_err(|e| PipelineError::Unavailable {
            component: "relational_store",
            source: e.to_string(),
        })?;
        schema::initialize(&conn).map_err(|e| PipelineError::Unavailable {
            component: "relational_store",
            source: e.to_string(),
        })?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self, PipelineError> {
        let conn = Connection::open_in_memory().map_err(|e| PipelineError::Unavailable {
            component: "relational_store",
            source: e.to_string(),
        })?;
        schema::initialize(&conn).map_err(|e| PipelineError::Unavailable {
            component: "relational_store",
            source: e.to_string(),
        })?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn upsert_user(&self, user: &UserRecord) -> Result<(), PipelineError> {
        let conn = self.conn.lock();
        conn.execute(
            r#"INSERT INTO users (user_id, platform, display_name, first_seen)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(user_id) DO UPDATE SET display_name = excluded.display_name"#,
            params![
                user.user_id.as_str(),
                user.platform,
                user.display_name,
                user.first_seen.timestamp_micros(),
            ],
        )
        .map_err(persist_err("users"))?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, PipelineError> {
        let conn = self.conn.lock();
        let result = conn
            .query_row(
                "SELECT user_id, platform, display_name, first_seen FROM users WHERE user_id = ?1",
                params![user_id.as_str()],
                |row| {
                    let ts: i64 = row.get(3)?;
                    Ok(UserRecord {
                        user_id: UserId::from(row.get::<_, String>(0)?),
                        platform: row.get(1)?,
                        display_name: row.get(2)?,
                        first_seen: micros_to_dt(ts),
                    })
                },
            )
            .optional()
            .map_err(persist_err("users"))?;
        Ok(result)
    }

    /// Idempotent by `turn_id`.
    pub fn insert_turn(&self, turn: &Turn) -> Result<(), PipelineError> {
        let conn = self.conn.lock();
        conn.execute(
            r#"INSERT OR IGNORE INTO turns
               (turn_id, persona_id, user_id, channel_id, created_at, user_text, bot_text, signals_json)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            params![
                turn.turn_id.as_str(),
                turn.persona_id.as_str(),
                turn.user_id.as_str(),
                turn.channel_id.as_str(),
                turn.created_at.timestamp_micros(),
                turn.user_text,
                turn.bot_text,
                turn.signals.to_string(),
            ],
        )
        .map_err(persist_err("turns"))?;
        Ok(())
    }

    pub fn get_turn(&self, turn_id: &TurnId) -> Result<Option<Turn>, PipelineError> {
        let conn = self.conn.lock();
        let result = conn
            .query_row(
                r#"SELECT turn_id, persona_id, user_id, channel_id, created_at, user_text, bot_text, signals_json
                   FROM turns WHERE turn_id = ?1"#,
                params![turn_id.as_str()],
                |row| {
                    let ts: i64 = row.get(4)?;
                    let signals_str: String = row.get(7)?;
                    Ok(Turn {
                        turn_id: TurnId::from(row.get::<_, String>(0)?),
                        persona_id: PersonaId::from(row.get::<_, String>(1)?),
                        user_id: UserId::from(row.get::<_, String>(2)?),
                        channel_id: row.get::<_, String>(3)?.into(),
                        created_at: micros_to_dt(ts),
                        user_text: row.get(5)?,
                        bot_text: row.get(6)?,
                        signals: serde_json::from_str(&signals_str).unwrap_or(serde_json::Value::Null),
                    })
                },
            )
            .optional()
            .map_err(persist_err("turns"))?;
        Ok(result)
    }

    /// Applied as clamped addition on each of the five scalars (§4.4).
    pub fn upsert_relationship_state(
        &self,
        persona_id: &PersonaId,
        user_id: &UserId,
        delta: RelationshipDelta,
    ) -> Result<RelationshipState, PipelineError> {
        let current = self.get_relationship_state(persona_id, user_id)?;
        let updated = current.apply_clamped(delta);
        let conn = self.conn.lock();
        conn.execute(
            r#"INSERT INTO relationship_state
                (persona_id, user_id, trust, affection, attunement, interaction_quality, comfort, last_updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               ON CONFLICT(persona_id, user_id) DO UPDATE SET
                trust = excluded.trust, affection = excluded.affection,
                attunement = excluded.attunement, interaction_quality = excluded.interaction_quality,
                comfort = excluded.comfort, last_updated_at = excluded.last_updated_at"#,
            params![
                persona_id.as_str(),
                user_id.as_str(),
                updated.trust,
                updated.affection,
                updated.attunement,
                updated.interaction_quality,
                updated.comfort,
                Utc::now().timestamp_micros(),
            ],
        )
        .map_err(persist_err("relationship_state"))?;
        Ok(updated)
    }

    /// Returns the default state `{0.5, 0.5, 0.5, 0.5, 0.5}` if absent (§4.4).
    pub fn get_relationship_state(
        &self,
        persona_id: &PersonaId,
        user_id: &UserId,
    ) -> Result<RelationshipState, PipelineError> {
        let conn = self.conn.lock();
        let result = conn
            .query_row(
                r#"SELECT trust, affection, attunement, interaction_quality, comfort
                   FROM relationship_state WHERE persona_id = ?1 AND user_id = ?2"#,
                params![persona_id.as_str(), user_id.as_str()],
                |row| {
                    Ok(RelationshipState {
                        trust: row.get(0)?,
                        affection: row.get(1)?,
                        attunement: row.get(2)?,
                        interaction_quality: row.get(3)?,
                        comfort: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(persist_err("relationship_state"))?;
        Ok(result.unwrap_or_default())
    }

    pub fn upsert_fact(
        &self,
        persona_id: &PersonaId,
        user_id: &UserId,
        fact: &str,
        category: &str,
        confidence: f32,
    ) -> Result<String, PipelineError> {
        let fact_id = uuid::Uuid::new_v4().to_string();
        let conn = self.conn.lock();
        conn.execute(
            r#"INSERT INTO facts (fact_id, persona_id, user_id, category, content, confidence, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                fact_id,
                persona_id.as_str(),
                user_id.as_str(),
                category,
                fact,
                confidence,
                Utc::now().timestamp_micros(),
            ],
        )
        .map_err(persist_err("facts"))?;
        Ok(fact_id)
    }

    pub fn query_facts(
        &self,
        persona_id: &PersonaId,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Fact>, PipelineError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                r#"SELECT fact_id, persona_id, user_id, category, content, confidence, created_at
                   FROM facts WHERE persona_id = ?1 AND user_id = ?2
                   ORDER BY created_at DESC LIMIT ?3"#,
            )
            .map_err(persist_err("facts"))?;

        let rows = stmt
            .query_map(params![persona_id.as_str(), user_id.as_str(), limit as i64], |row| {
                let ts: i64 = row.get(6)?;
                Ok(Fact {
                    fact_id: row.get(0)?,
                    persona_id: PersonaId::from(row.get::<_, String>(1)?),
                    user_id: UserId::from(row.get::<_, String>(2)?),
                    category: row.get(3)?,
                    content: row.get(4)?,
                    confidence: row.get(5)?,
                    created_at: micros_to_dt(ts),
                })
            })
            .map_err(persist_err("facts"))?;

        rows.collect::<Result<Vec<_>, _>>().map_err(persist_err("facts"))
    }
}

fn micros_to_dt(micros: i64) -> DateTime<Utc> {
    Utc.timestamp_micros(micros).single().unwrap_or_else(Utc::now)
}

fn persist_err(store: &'static str) -> impl Fn(rusqlite::Error) -> PipelineError {
    move |e| PipelineError::PersistenceFailure {
        store,
        source: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::from(id)
    }

    #[test]
    fn insert_turn_is_idempotent_p2() {
        let store = RelationalStore::in_memory().unwrap();
        let turn = Turn {
            turn_id: TurnId::from("t1"),
            persona_id: PersonaId::from("elena"),
            user_id: user("u1"),
            channel_id: "c1".into(),
            created_at: Utc::now(),
            user_text: "hi".into(),
            bot_text: "hello!".into(),
            signals: serde_json::json!({}),
        };
        store.insert_turn(&turn).unwrap();
        store.insert_turn(&turn).unwrap();

        let conn = store.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM turns WHERE turn_id = 't1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn relationship_state_defaults_when_absent() {
        let store = RelationalStore::in_memory().unwrap();
        let state = store
            .get_relationship_state(&PersonaId::from("elena"), &user("u1"))
            .unwrap();
        assert_eq!(state.trust, 0.5);
        assert_eq!(state.comfort, 0.5);
    }

    #[test]
    fn relationship_delta_is_clamped() {
        let store = RelationalStore::in_memory().unwrap();
        let persona = PersonaId::from("elena");
        let u = user("u1");
        for _ in 0..200 {
            store
                .upsert_relationship_state(
                    &persona,
                    &u,
                    RelationshipDelta {
                        trust: 0.1,
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        let state = store.get_relationship_state(&persona, &u).unwrap();
        assert!(state.trust <= 1.0);
    }
}
