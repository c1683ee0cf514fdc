//! Pipeline Orchestrator (C12): the per-message scatter-gather loop that
//! fans out to the other eleven intelligence components, fuses their
//! signals, composes a prompt, invokes the LLM collaborator, and persists
//! the turn. See `orchestrator::Orchestrator` for the entry point.

mod locks;
mod orchestrator;
mod scatter;
mod signals;

pub use locks::ConversationLocks;
pub use orchestrator::Orchestrator;
pub use scatter::{ScatterDeps, ScatterResult};
pub use signals::Signals;
