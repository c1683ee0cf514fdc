//! Schema per spec §6: `users`, `turns`, `relationship_state`, `facts`.

use rusqlite::Connection;

pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            platform TEXT NOT NULL,
            display_name TEXT NOT NULL,
            first_seen INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS turns (
            turn_id TEXT PRIMARY KEY,
            persona_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            channel_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            user_text TEXT NOT NULL,
            bot_text TEXT NOT NULL,
            signals_json TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_turns_conversation
            ON turns(persona_id, user_id, channel_id, created_at DESC);

        CREATE TABLE IF NOT EXISTS relationship_state (
            persona_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            trust REAL NOT NULL,
            affection REAL NOT NULL,
            attunement REAL NOT NULL,
            interaction_quality REAL NOT NULL,
            comfort REAL NOT NULL,
            last_updated_at INTEGER NOT NULL,
            PRIMARY KEY (persona_id, user_id),
            CHECK (trust >= 0.0 AND trust <= 1.0),
            CHECK (affection >= 0.0 AND affection <= 1.0),
            CHECK (attunement >= 0.0 AND attunement <= 1.0),
            CHECK (interaction_quality >= 0.0 AND interaction_quality <= 1.0),
            CHECK (comfort >= 0.0 AND comfort <= 1.0)
        );

        CREATE TABLE IF NOT EXISTS facts (
            fact_id TEXT PRIMARY KEY,
            persona_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            category TEXT NOT NULL,
            content TEXT NOT NULL,
            confidence REAL NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_facts_persona_user
            ON facts(persona_id, user_id, created_at DESC);

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', '1');
        "#,
    )
}
