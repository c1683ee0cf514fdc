/*!
# personaforge-flow

Flow / Trajectory Analyzer (C8): multi-turn emotional trajectory analysis
over a window of recorded emotions (`trajectory`, spec §4.8), and
vector-enhanced conversation-flow classification (`flow`, a weighting
scheme over retrieved memories with a keyword-only fallback reusing C7's
cue table when embeddings or the vector store are unavailable).

Both operations are read-only with respect to the stores they're handed —
C8 never writes a Memory Record or Turn itself, leaving persistence to
C13.
*/

mod flow;
mod trajectory;

pub use flow::{
    ConversationDepth, FlowAnalyzer, FlowPrediction, FlowResult, FlowType, IntimacyDevelopment,
};
pub use trajectory::{
    trajectory, EmotionPoint, Trajectory, TrajectoryArc, TrajectoryDirection, TrajectoryMomentum,
};
