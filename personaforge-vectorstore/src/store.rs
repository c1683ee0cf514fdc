//! Persona-bound collections over an in-memory, `DashMap`-backed index.
//!
//! A production deployment would swap the brute-force scan below for an
//! ANN index behind the same `search_by_dimensions` contract — documented
//! as an Open Question resolution in DESIGN.md; correctness, not peak QPS,
//! is the contract here.

use crate::memory_id::generate_memory_id;
use crate::score::cosine_similarity;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use personaforge_types::{
    EmbeddingKind, MemoryRecord, PersonaId, PipelineError, UserId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Default)]
struct CollectionInner {
    records: DashMap<String, MemoryRecord>,
    /// (created_at micros, memory_id) kept sorted for `scroll_recent`.
    by_time: RwLock<BTreeMap<(i64, String), ()>>,
}

/// Top-level store: one logical collection per persona.
#[derive(Default)]
pub struct VectorStore {
    collections: DashMap<PersonaId, Arc<CollectionInner>>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain (creating if necessary) the persona-bound handle. Every
    /// subsequent operation on the returned `PersonaCollection` is scoped to
    /// this persona by construction — there is no code path that can read
    /// or write another persona's records through it.
    pub fn collection(&self, persona_id: PersonaId) -> PersonaCollection {
        let inner = self
            .collections
            .entry(persona_id.clone())
            .or_insert_with(|| Arc::new(CollectionInner::default()))
            .clone();
        PersonaCollection { persona_id, inner }
    }
}

pub struct PersonaCollection {
    persona_id: PersonaId,
    inner: Arc<CollectionInner>,
}

#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    pub score: f32,
}

impl PersonaCollection {
    pub fn persona_id(&self) -> &PersonaId {
        &self.persona_id
    }

    pub fn generate_memory_id(&self, user_id: &UserId, content: &str, created_at: DateTime<Utc>) -> String {
        generate_memory_id(&self.persona_id, user_id, content, created_at)
    }

    /// Idempotent by `memory_id`; rejects partial-vector records (P5).
    pub fn upsert(&self, record: MemoryRecord) -> Result<(), PipelineError> {
        if record.persona_id != self.persona_id {
            return Err(PipelineError::Invalid {
                reason: format!(
                    "record persona_id {} does not match collection persona {}",
                    record.persona_id, self.persona_id
                ),
            });
        }
        if !record.has_complete_vectors() {
            return Err(PipelineError::Invalid {
                reason: "record is missing one or more of the six named vectors".to_string(),
            });
        }

        let key = (record.created_at.timestamp_micros(), record.memory_id.clone());
        self.inner.by_time.write().insert(key, ());
        self.inner.records.insert(record.memory_id.clone(), record);
        Ok(())
    }

    /// Weighted multi-dimensional retrieval (§4.3). For each `kind` present
    /// in `dims`, scores every candidate record by cosine similarity on
    /// that named vector, then combines `sum(weight_k * score_k)` across
    /// kinds — a record's contribution from a kind it didn't surface in is
    /// treated as 0, per spec.
    pub fn search_by_dimensions(
        &self,
        user_id: &UserId,
        dims: &HashMap<EmbeddingKind, Vec<f32>>,
        weights: &HashMap<EmbeddingKind, f32>,
        limit: usize,
    ) -> Vec<ScoredMemory> {
        if dims.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<MemoryRecord> = self
            .inner
            .records
            .iter()
            .filter(|e| e.value().user_id == *user_id)
            .map(|e| e.value().clone())
            .collect();

        let mut combined: HashMap<String, f32> = HashMap::new();
        for (kind, query_vec) in dims {
            let weight = weights.get(kind).copied().unwrap_or(1.0);
            if weight <= 0.0 {
                continue;
            }
            for record in &candidates {
                if let Some(v) = record.vectors.get(kind) {
                    let score = cosine_similarity(query_vec, v);
                    *combined.entry(record.memory_id.clone()).or_insert(0.0) += weight * score;
                }
            }
        }

        let mut scored: Vec<ScoredMemory> = candidates
            .into_iter()
            .filter_map(|record| {
                combined.get(&record.memory_id).map(|score| ScoredMemory {
                    record,
                    score: *score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    /// Convenience wrapper equivalent to `search_by_dimensions` with only
    /// the `content` dimension (§4.3).
    pub fn search_by_content(
        &self,
        user_id: &UserId,
        query_vector: &[f32],
        limit: usize,
    ) -> Vec<ScoredMemory> {
        let mut dims = HashMap::new();
        dims.insert(EmbeddingKind::Content, query_vector.to_vec());
        let mut weights = HashMap::new();
        weights.insert(EmbeddingKind::Content, 1.0);
        self.search_by_dimensions(user_id, &dims, &weights, limit)
    }

    /// Records in descending `created_at`, filtered by user (persona scope
    /// is implicit in the collection handle).
    pub fn scroll_recent(
        &self,
        user_id: &UserId,
        limit: usize,
        older_than: Option<DateTime<Utc>>,
    ) -> Vec<MemoryRecord> {
        let by_time = self.inner.by_time.read();
        let cutoff = older_than.map(|t| t.timestamp_micros()).unwrap_or(i64::MAX);

        let mut out = Vec::with_capacity(limit);
        for ((created_at, memory_id), _) in by_time.iter().rev() {
            if *created_at >= cutoff {
                continue;
            }
            if let Some(record) = self.inner.records.get(memory_id) {
                if record.user_id == *user_id {
                    out.push(record.clone());
                    if out.len() >= limit {
                        break;
                    }
                }
            }
        }
        out
    }

    pub fn get(&self, memory_id: &str) -> Option<MemoryRecord> {
        self.inner.records.get(memory_id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.records.is_empty()
    }
}


impl std::ops::Deref for ScoredMemory {
    type Target = MemoryRecord;
    fn deref(&self) -> &MemoryRecord {
        &self.record
    }
}
