//! Trait-based abstraction for embedding backends, plus a deterministic
//! mock used in tests and as the pipeline's default when no remote
//! embedding endpoint is configured.

use async_trait::async_trait;
use dashmap::DashMap;
use personaforge_types::{EmbeddingKind, PipelineError};
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed `text` under the given `kind`. A single-view failure is
    /// non-fatal to callers in the Orchestrator — the affected dimension is
    /// simply dropped from the query (§4.1, §4.12).
    async fn embed(&self, text: &str, kind: EmbeddingKind) -> Result<Vec<f32>, PipelineError>;

    /// Embed the same text under every named view in one call, used by the
    /// Turn Persistor (C13) to build a Memory Record's six vectors.
    async fn embed_all(&self, text: &str) -> [(EmbeddingKind, Result<Vec<f32>, PipelineError>); 6] {
        let mut out = Vec::with_capacity(6);
        for kind in EmbeddingKind::ALL {
            out.push((kind, self.embed(text, kind).await));
        }
        out.try_into().unwrap_or_else(|_| unreachable!())
    }

    fn dimensions(&self) -> usize;
    fn model_info(&self) -> ModelInfo;
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub dimensions: usize,
    pub max_tokens: usize,
}

/// Deterministic, network-free embedding client. Used as the reference
/// implementation and in every test in this workspace — same input and
/// `kind` always yields the same vector within a process (§4.1
/// "Deterministic for identical inputs within a model version").
pub struct MockEmbeddingClient {
    dimensions: usize,
    cache: DashMap<(EmbeddingKind, String), Vec<f32>>,
}

impl MockEmbeddingClient {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            cache: DashMap::new(),
        }
    }

    fn generate(&self, framed: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        framed.hash(&mut hasher);
        let seed = hasher.finish();
        let mut rng = SmallRng::seed_from_u64(seed);

        let mut vector = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            vector.push(rng.random_range(-1.0..1.0));
        }
        let magnitude: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in &mut vector {
                *v /= magnitude;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingClient {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, text: &str, kind: EmbeddingKind) -> Result<Vec<f32>, PipelineError> {
        let key = (kind, text.to_string());
        if let Some(v) = self.cache.get(&key) {
            return Ok(v.clone());
        }
        let framed = kind.frame(text);
        let vector = self.generate(&framed);
        self.cache.insert(key, vector.clone());
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: "mock-deterministic".to_string(),
            version: "1".to_string(),
            dimensions: self.dimensions,
            max_tokens: 8192,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_same_kind_is_deterministic() {
        let client = MockEmbeddingClient::new(16);
        let a = client.embed("hello there", EmbeddingKind::Content).await.unwrap();
        let b = client.embed("hello there", EmbeddingKind::Content).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn distinct_kinds_yield_distinct_views() {
        let client = MockEmbeddingClient::new(16);
        let content = client.embed("hello there", EmbeddingKind::Content).await.unwrap();
        let emotion = client.embed("hello there", EmbeddingKind::Emotion).await.unwrap();
        assert_ne!(content, emotion);
    }

    #[tokio::test]
    async fn embed_all_produces_six_vectors() {
        let client = MockEmbeddingClient::new(8);
        let all = client.embed_all("a message").await;
        assert_eq!(all.len(), 6);
        for (_, result) in all {
            assert!(result.is_ok());
        }
    }
}
