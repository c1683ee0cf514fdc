//! Scatter-gather over C2/C3/C6/C8, spec §4.12 steps 4-6. Every branch is
//! wrapped in its own soft timeout; a branch that times out or errors
//! degrades to `None`/empty rather than failing the others (§5 "an
//! arbitrarily slow or failing branch cannot stall the others beyond its
//! soft timeout").

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use personaforge_embeddings::EmbeddingClient;
use personaforge_emotion::EmotionAnalyzer;
use personaforge_flow::{self as flow_crate, EmotionPoint, FlowAnalyzer, FlowResult, Trajectory};
use personaforge_types::{CachedMessage, EmbeddingKind, EmotionSignal, MemoryRecord, UserId};
use personaforge_vectorstore::PersonaCollection;

const ANALYZER_SOFT_TIMEOUT: Duration = Duration::from_secs(2);
const SEARCH_SOFT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRIEVAL_LIMIT: usize = 15;
const RECENT_MESSAGES_TARGET: usize = 15;

/// §4.12 step 4's retrieval weights — distinct from C8's own `flow_weights`
/// (different call site, different purpose).
fn retrieval_weights() -> HashMap<EmbeddingKind, f32> {
    let mut weights = HashMap::new();
    weights.insert(EmbeddingKind::Content, 0.25);
    weights.insert(EmbeddingKind::Emotion, 0.20);
    weights.insert(EmbeddingKind::Personality, 0.20);
    weights.insert(EmbeddingKind::Relationship, 0.15);
    weights.insert(EmbeddingKind::Context, 0.15);
    weights.insert(EmbeddingKind::Semantic, 0.05);
    weights
}

pub struct ScatterResult {
    pub emotion: Option<EmotionSignal>,
    pub memories: Vec<MemoryRecord>,
    pub recent_messages: Vec<CachedMessage>,
    pub flow: Option<FlowResult>,
    pub trajectory: Option<Trajectory>,
}

pub struct ScatterDeps {
    pub embeddings: Arc<dyn EmbeddingClient>,
    pub emotion_analyzer: Arc<dyn EmotionAnalyzer>,
    pub flow_analyzer: Arc<FlowAnalyzer>,
}

pub async fn scatter(
    deps: &ScatterDeps,
    collection: &PersonaCollection,
    user_id: &UserId,
    text: &str,
    recent_context: &[String],
    cached_recent: Vec<CachedMessage>,
    emotion_window: Vec<EmotionPoint>,
) -> ScatterResult {
    let (emotion, memories, flow) = tokio::join!(
        run_emotion(deps, text, user_id, recent_context),
        run_retrieval(deps, collection, user_id, text),
        run_flow(deps, collection, user_id, text),
    );

    let recent_messages = if cached_recent.len() >= RECENT_MESSAGES_TARGET {
        cached_recent
    } else {
        supplement_recent(collection, user_id, cached_recent)
    };

    let trajectory = if emotion_window.len() >= 2 {
        Some(flow_crate::trajectory(&emotion_window))
    } else {
        None
    };

    ScatterResult { emotion, memories, recent_messages, flow, trajectory }
}

async fn run_emotion(
    deps: &ScatterDeps,
    text: &str,
    user_id: &UserId,
    recent_context: &[String],
) -> Option<EmotionSignal> {
    match tokio::time::timeout(ANALYZER_SOFT_TIMEOUT, deps.emotion_analyzer.analyze(text, user_id, recent_context)).await {
        Ok(signal) => Some(signal),
        Err(_) => {
            tracing::warn!("emotion analyzer exceeded soft timeout");
            None
        }
    }
}

async fn run_retrieval(
    deps: &ScatterDeps,
    collection: &PersonaCollection,
    user_id: &UserId,
    text: &str,
) -> Vec<MemoryRecord> {
    let embed = async {
        let futures = EmbeddingKind::ALL.iter().map(|kind| {
            let embeddings = Arc::clone(&deps.embeddings);
            let kind = *kind;
            let text = text.to_string();
            async move { (kind, embeddings.embed(&text, kind).await) }
        });
        let mut dims = HashMap::new();
        for (kind, result) in join_all(futures).await {
            if let Ok(vector) = result {
                dims.insert(kind, vector);
            }
        }
        dims
    };

    match tokio::time::timeout(SEARCH_SOFT_TIMEOUT, embed).await {
        Ok(dims) if !dims.is_empty() => {
            let weights = retrieval_weights();
            collection
                .search_by_dimensions(user_id, &dims, &weights, RETRIEVAL_LIMIT)
                .into_iter()
                .map(|scored| scored.record)
                .collect()
        }
        Ok(_) => Vec::new(),
        Err(_) => {
            tracing::warn!("memory retrieval exceeded soft timeout");
            Vec::new()
        }
    }
}

async fn run_flow(
    deps: &ScatterDeps,
    collection: &PersonaCollection,
    user_id: &UserId,
    text: &str,
) -> Option<FlowResult> {
    match tokio::time::timeout(ANALYZER_SOFT_TIMEOUT, deps.flow_analyzer.flow(collection, user_id, text)).await {
        Ok(result) => Some(result),
        Err(_) => {
            tracing::warn!("flow analyzer exceeded soft timeout");
            None
        }
    }
}

/// Supplements a short cache hit from C3's own recency index (§4.12 step
/// 4's "C6 recent-messages fetch ... supplement from C3.scroll_recent if
/// fewer"). Deduplicates by content since the two stores don't share keys.
fn supplement_recent(
    collection: &PersonaCollection,
    user_id: &UserId,
    mut cached_recent: Vec<CachedMessage>,
) -> Vec<CachedMessage> {
    let needed = RECENT_MESSAGES_TARGET.saturating_sub(cached_recent.len());
    if needed == 0 {
        return cached_recent;
    }
    let seen: std::collections::HashSet<String> = cached_recent.iter().map(|m| m.content.clone()).collect();
    let supplemental = collection.scroll_recent(user_id, needed, None);
    for record in supplemental {
        if seen.contains(&record.content) {
            continue;
        }
        cached_recent.push(personaforge_types::CachedMessage {
            message_id: None,
            content: record.content,
            author_id: record.user_id.clone(),
            author_name: record.user_id.to_string(),
            timestamp: record.created_at,
            is_bot: false,
            source: personaforge_types::MessageSource::Vector,
        });
    }
    cached_recent
}
