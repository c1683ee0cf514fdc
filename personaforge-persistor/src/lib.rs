/*!
# personaforge-persistor

Turn Persistor (C13): the last step of the pipeline. Embeds a turn's
combined text under all six named views in parallel, writes a Memory
Record to the vector store when the full set succeeds, appends the Turn to
the relational store (idempotent by `turn_id`, P2), applies the §4.13
relationship-state delta, and records time-series points for relationship
progression and per-turn emotion.
*/

mod persistor;
mod relationship;

pub use persistor::{PersistInput, PersistOutcome, TurnPersistor};
pub use relationship::relationship_delta;
