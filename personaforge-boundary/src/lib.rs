/*!
# personaforge-boundary

Boundary Manager (C7): per-`(user_id, channel_id)` session and topic
segmentation, keyed by a `DashMap` of per-key locked state rather than one
global lock so unrelated conversations never contend with each other.
*/

mod keywords;
mod manager;
pub mod transitions;

pub use manager::BoundaryManager;
pub use transitions::TopicTransition;
