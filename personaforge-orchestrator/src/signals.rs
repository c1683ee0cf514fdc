//! Fused scatter-gather output, spec §4.12 step 6.

use personaforge_flow::{FlowResult, Trajectory};
use personaforge_types::{CachedMessage, EmotionSignal, MemoryRecord, RelationshipDelta, RelationshipState, Session};

/// Every field is independently optional: a branch that timed out or failed
/// during the scatter (§4.12 step 5) simply contributes `None` here rather
/// than failing the whole turn.
pub struct Signals {
    pub emotion: Option<EmotionSignal>,
    pub flow: Option<FlowResult>,
    pub trajectory: Option<Trajectory>,
    pub memories: Vec<MemoryRecord>,
    pub recent_messages: Vec<CachedMessage>,
    pub session: Option<Session>,
    pub relationship_state: Option<RelationshipState>,
    pub derived_persona_deltas: RelationshipDelta,
}
