/*!
# personaforge-types

Shared domain types, error taxonomy, and configuration for the persona
intelligence pipeline. Every other crate in the workspace depends on this
one and nothing else in the workspace depends back on it.
*/

pub mod config;
pub mod emotion;
pub mod error;
pub mod ids;
pub mod message;
pub mod turn;

pub use config::*;
pub use emotion::*;
pub use error::*;
pub use ids::*;
pub use message::*;
pub use turn::*;
