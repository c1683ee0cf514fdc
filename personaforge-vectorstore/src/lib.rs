/*!
# personaforge-vectorstore

Vector Memory Store (C3): a persona-scoped logical collection keyed by
`persona_id`, where every record carries six named embedding views and
search combines per-kind ANN results with caller-supplied weights (§4.3).

The collection handle (`PersonaCollection`) is persona-bound at
construction: there is no operation on it that does not take that bound
`persona_id` as the scoping key, so a bug that forgets to filter by persona
is a type error, not a runtime leak (§4.3 "must be detectable").
*/

mod memory_id;
mod score;
mod store;

pub use memory_id::generate_memory_id;
pub use score::cosine_similarity;
pub use store::{PersonaCollection, VectorStore};

pub use personaforge_types::{EmbeddingKind, MemoryPayload, MemoryRecord, MemorySource};

use personaforge_types::PipelineError;

/// Failure modes for the vector store, per §4.3 and §7.
pub fn unavailable(source: impl Into<String>) -> PipelineError {
    PipelineError::Unavailable {
        component: "vector_store",
        source: source.into(),
    }
}
