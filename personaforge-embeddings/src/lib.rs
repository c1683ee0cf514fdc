/*!
# personaforge-embeddings

Embedding Provider (C1): produces fixed-dimension vectors for text inputs,
framed by an `EmbeddingKind` so one underlying model can serve all six named
views a Memory Record needs (§4.1).
*/

mod client;
mod http;

pub use client::{EmbeddingClient, MockEmbeddingClient, ModelInfo};
#[cfg(feature = "http")]
pub use http::HttpEmbeddingClient;

pub use personaforge_types::EmbeddingKind;
