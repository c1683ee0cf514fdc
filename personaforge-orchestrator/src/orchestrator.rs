//! Pipeline Orchestrator (C12), spec §4.12: the Orchestrator's eleven steps,
//! wired on top of `scatter` (steps 4-6) and `ConversationLocks` (§5's
//! per-conversation serial-ordering contract).

use std::sync::Arc;
use std::time::Duration;

use personaforge_attribution::AttributionManager;
use personaforge_boundary::BoundaryManager;
use personaforge_cache::ConversationCache;
use personaforge_embeddings::EmbeddingClient;
use personaforge_emotion::EmotionAnalyzer;
use personaforge_flow::{EmotionPoint, FlowAnalyzer};
use personaforge_llm::{LlmClient, ResilientLlm, RetryConfig};
use personaforge_persistor::{PersistInput, TurnPersistor};
use personaforge_persona::PersonaStore;
use personaforge_prompts::{strip_persona_prefix, ComposeInput, PromptComposer};
use personaforge_relational::RelationalStore;
use personaforge_timeseries::TimeSeriesSink;
use personaforge_types::{ChannelId, ConversationKey, ContextId, InboundMessage, PersonaId, TurnId, UserId};
use personaforge_vectorstore::VectorStore;

use crate::locks::ConversationLocks;
use crate::scatter::{self, ScatterDeps};
use crate::signals::Signals;

/// §4.12 step 1's length cap.
const MAX_MESSAGE_CHARS: usize = 4000;
/// §4.12 step 4's target before falling back to C3.scroll_recent.
const RECENT_MESSAGES_TARGET: usize = 15;
/// Window of past `user_emotion` points fed to C8.trajectory.
const TRAJECTORY_WINDOW: usize = 10;
/// §4.12's overall budget: exceeding this returns the in-character fallback
/// and skips persist entirely, distinct from any per-branch soft timeout.
const GLOBAL_ORCHESTRATION_TIMEOUT: Duration = Duration::from_secs(25);

pub struct Orchestrator {
    personas: Arc<PersonaStore>,
    cache: Arc<ConversationCache>,
    boundary: Arc<BoundaryManager>,
    vector_store: Arc<VectorStore>,
    scatter_deps: ScatterDeps,
    attribution: AttributionManager,
    composer: PromptComposer,
    llm: ResilientLlm,
    persistor: Arc<TurnPersistor>,
    relational: Arc<RelationalStore>,
    timeseries: Arc<dyn TimeSeriesSink>,
    locks: ConversationLocks,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        personas: Arc<PersonaStore>,
        cache: Arc<ConversationCache>,
        boundary: Arc<BoundaryManager>,
        vector_store: Arc<VectorStore>,
        embeddings: Arc<dyn EmbeddingClient>,
        emotion_analyzer: Arc<dyn EmotionAnalyzer>,
        flow_analyzer: Arc<FlowAnalyzer>,
        attribution: AttributionManager,
        composer: PromptComposer,
        llm_client: Arc<dyn LlmClient>,
        persistor: Arc<TurnPersistor>,
        relational: Arc<RelationalStore>,
        timeseries: Arc<dyn TimeSeriesSink>,
    ) -> Self {
        Self {
            personas,
            cache,
            boundary,
            vector_store,
            scatter_deps: ScatterDeps { embeddings, emotion_analyzer, flow_analyzer },
            attribution,
            composer,
            llm: ResilientLlm::new(llm_client, RetryConfig::production(), Duration::from_secs(10)),
            persistor,
            relational,
            timeseries,
            locks: ConversationLocks::new(),
        }
    }

    /// Convenience constructor wiring the in-process reference stack (mock
    /// embeddings, heuristic emotion analyzer, in-memory vector/relational/
    /// time-series stores) the way a development deployment would, rather
    /// than hand-assembling every collaborator at each call site.
    pub fn bootstrap(
        persona_dir: impl AsRef<std::path::Path>,
        relational_db: impl AsRef<std::path::Path>,
        embeddings: Arc<dyn EmbeddingClient>,
        emotion_analyzer: Arc<dyn EmotionAnalyzer>,
        llm_client: Arc<dyn LlmClient>,
        config: &personaforge_types::PipelineConfig,
    ) -> anyhow::Result<Self> {
        let personas = Arc::new(PersonaStore::load(persona_dir)?);
        let cache = Arc::new(ConversationCache::new(config.conversation_cache_max_local));
        let boundary = Arc::new(
            BoundaryManager::new(chrono::Duration::minutes(config.session_inactivity_minutes))
                .with_summarization_threshold(config.summarization_threshold as u32),
        );
        let vector_store = Arc::new(VectorStore::new());
        let relational = Arc::new(RelationalStore::open(relational_db)?);
        let timeseries: Arc<dyn TimeSeriesSink> = Arc::new(personaforge_timeseries::InMemoryTimeSeriesSink::new());
        let flow_analyzer = Arc::new(FlowAnalyzer::new(Arc::clone(&embeddings)));
        let attribution = AttributionManager::new(config.identity_level);
        let composer = PromptComposer::new(&config.llm_model, config.max_context_tokens, config.strict_immersive_mode);
        let persistor = Arc::new(TurnPersistor::new(Arc::clone(&embeddings), Arc::clone(&relational), Arc::clone(&timeseries)));

        Ok(Self::new(
            personas,
            cache,
            boundary,
            vector_store,
            embeddings,
            emotion_analyzer,
            flow_analyzer,
            attribution,
            composer,
            llm_client,
            persistor,
            relational,
            timeseries,
        ))
    }

    /// Runs the full §4.12 pipeline for one inbound message and returns the
    /// reply handed to the transport. Dropping this future before it
    /// resolves is the cancellation path of §4.12's last paragraph: every
    /// suspension point below is a legitimate cancellation point, and
    /// nothing after the dropped await runs — in particular `persist`
    /// (step 11) never fires for a cancelled turn.
    pub async fn process_message(&self, inbound: InboundMessage, persona_id: &PersonaId) -> String {
        let persona = match self.personas.get(persona_id) {
            Ok(p) => p,
            Err(err) => return err.user_safe_message().to_string(),
        };

        match tokio::time::timeout(
            GLOBAL_ORCHESTRATION_TIMEOUT,
            self.process_message_inner(inbound, persona_id, &persona),
        )
        .await
        {
            Ok(reply) => reply,
            Err(_elapsed) => {
                tracing::warn!(persona = %persona_id, "orchestration exceeded global timeout, skipping persist");
                format!("Sorry, {} is taking a little longer than usual to think — try again in a moment.", persona.display_name)
            }
        }
    }

    async fn process_message_inner(
        &self,
        inbound: InboundMessage,
        persona_id: &PersonaId,
        persona: &personaforge_persona::PersonaDefinition,
    ) -> String {
        // Steps 1-2: validate and normalize.
        let inbound = match inbound.validate(MAX_MESSAGE_CHARS) {
            Ok(inbound) => inbound,
            Err(err) => return err.user_safe_message().to_string(),
        };

        let key = ConversationKey::new(inbound.user_id.clone(), inbound.channel_id.clone());
        let _conversation_guard = self.locks.acquire(&key).await;

        // Step 3: notify C7 and C6.
        let session = self.boundary.process_message(
            inbound.user_id.clone(),
            inbound.channel_id.clone(),
            inbound.message_id.clone(),
            &inbound.text,
            inbound.timestamp,
        );
        self.cache.append(
            inbound.channel_id.clone(),
            personaforge_types::CachedMessage {
                message_id: Some(inbound.message_id.clone()),
                content: inbound.text.clone(),
                author_id: inbound.user_id.clone(),
                author_name: inbound.user_id.to_string(),
                timestamp: inbound.timestamp,
                is_bot: false,
                source: personaforge_types::MessageSource::Platform,
            },
        );

        let collection = self.vector_store.collection(persona_id.clone());
        let recent_context: Vec<String> = self
            .cache
            .get_user_context(&inbound.channel_id, &inbound.user_id, 5, Some(&inbound.message_id))
            .into_iter()
            .map(|m| m.content)
            .collect();
        let cached_recent = self.cache.get_user_context(
            &inbound.channel_id,
            &inbound.user_id,
            RECENT_MESSAGES_TARGET,
            Some(&inbound.message_id),
        );
        let emotion_window = self
            .timeseries
            .trajectory_window(&inbound.user_id, "user_emotion", TRAJECTORY_WINDOW)
            .await
            .into_iter()
            .filter_map(|point| match point.measurement {
                personaforge_timeseries::Measurement::UserEmotion { emotion, .. } => {
                    Some(EmotionPoint { recorded_at: point.recorded_at, emotion })
                }
                _ => None,
            })
            .collect::<Vec<_>>();

        // Steps 4-5: scatter-gather.
        let scattered = scatter::scatter(
            &self.scatter_deps,
            &collection,
            &inbound.user_id,
            &inbound.text,
            &recent_context,
            cached_recent,
            emotion_window,
        )
        .await;

        let relationship_state = self
            .relational
            .get_relationship_state(persona_id, &inbound.user_id)
            .ok();
        let derived_persona_deltas = personaforge_persistor::relationship_delta(
            scattered.emotion.as_ref(),
            scattered.flow.as_ref().map(|f| f.intimacy_development),
        );

        // Step 6: fuse.
        let signals = Signals {
            emotion: scattered.emotion,
            flow: scattered.flow,
            trajectory: scattered.trajectory,
            memories: scattered.memories,
            recent_messages: scattered.recent_messages,
            session: Some(session.clone()),
            relationship_state,
            derived_persona_deltas,
        };

        // Step 7: compose.
        let context_id = ContextId::from(inbound.channel_id.as_str());
        let session_summary = signals
            .session
            .as_ref()
            .map(|s| s.context_summary.as_str())
            .filter(|s| !s.is_empty());
        let compose_input = ComposeInput {
            persona,
            inbound: &inbound,
            emotion: signals.emotion.as_ref(),
            flow: signals.flow.as_ref(),
            trajectory: signals.trajectory.as_ref(),
            memories: &signals.memories,
            recent_messages: &signals.recent_messages,
            session_summary,
            context_id: &context_id,
        };
        let messages = match self.composer.compose(&compose_input, &self.attribution, inbound.timestamp) {
            Ok(messages) => messages,
            Err(err) => return err.user_safe_message().to_string(),
        };

        // Step 8: invoke the LLM collaborator, with built-in fallback.
        let fallback_seed = inbound.message_id.as_str().len();
        let raw_reply = self.llm.complete_or_fallback(&messages, fallback_seed).await;

        // Step 9: post-process.
        let reply = strip_persona_prefix(&persona.display_name, &raw_reply);

        // Step 11: persist (step 10, handing the reply to the transport, is
        // the caller's responsibility once this function returns).
        let bot_emotion = self.scatter_deps.emotion_analyzer.analyze(&reply, &inbound.user_id, &[]).await;
        let turn_id = TurnId::from(inbound.message_id.as_str());
        self.persistor
            .persist(
                &collection,
                persona_id,
                &inbound.user_id,
                PersistInput {
                    turn_id,
                    channel_id: inbound.channel_id.clone(),
                    created_at: inbound.timestamp,
                    user_text: &inbound.text,
                    bot_text: &reply,
                    user_emotion: signals.emotion.as_ref(),
                    bot_emotion: Some(&bot_emotion),
                    intimacy_development: signals.flow.as_ref().map(|f| f.intimacy_development),
                    session_id: signals.session.as_ref().map(|s| s.session_id.clone()),
                    topic_tags: signals
                        .session
                        .as_ref()
                        .and_then(|s| s.current_topic.as_ref())
                        .map(|t| t.keywords.clone())
                        .unwrap_or_default(),
                    interaction_count: signals.session.as_ref().map(|s| s.message_count).unwrap_or(1),
                },
            )
            .await;
        self.cache.append(
            inbound.channel_id.clone(),
            personaforge_types::CachedMessage {
                message_id: None,
                content: reply.clone(),
                author_id: UserId::from("bot"),
                author_name: persona.display_name.clone(),
                timestamp: chrono::Utc::now(),
                is_bot: true,
                source: personaforge_types::MessageSource::Platform,
            },
        );

        reply
    }

    /// Exposed for transports that need to react to a boundary event
    /// (e.g. a third party interrupting the conversation) outside the
    /// normal message flow.
    pub fn handle_interruption(&self, user_id: &UserId, channel_id: &ChannelId, interrupter_id: &UserId) {
        self.boundary.handle_interruption(user_id, channel_id, interrupter_id);
    }

    pub fn end_conversation(&self, user_id: &UserId, channel_id: &ChannelId, reason: &str) -> Option<String> {
        self.boundary.end(user_id, channel_id, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use personaforge_embeddings::MockEmbeddingClient;
    use personaforge_emotion::HeuristicEmotionAnalyzer;
    use personaforge_llm::MockLlm;
    use personaforge_timeseries::InMemoryTimeSeriesSink;
    use personaforge_types::{AttachmentKind, ChannelId, IdentityLevel, MessageId};
    use std::io::Write;

    fn write_persona(dir: &std::path::Path, slug: &str, name: &str) {
        let mut file = std::fs::File::create(dir.join(format!("{slug}.toml"))).unwrap();
        writeln!(
            file,
            r#"
            [identity]
            name = "{name}"

            personality = "warm and curious"
            communication_style = "conversational, asks follow-up questions"
            "#,
        )
        .unwrap();
    }

    fn inbound(user: &str, channel: &str, message: &str, text: &str) -> InboundMessage {
        InboundMessage {
            user_id: UserId::from(user),
            channel_id: ChannelId::from(channel),
            message_id: MessageId::from(message),
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
            is_dm: true,
            attachments: vec![],
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        persona_dir: &std::path::Path,
        embeddings: Arc<dyn EmbeddingClient>,
        emotion_analyzer: Arc<dyn EmotionAnalyzer>,
        llm: Arc<dyn LlmClient>,
        timeseries: Arc<dyn TimeSeriesSink>,
    ) -> (Orchestrator, Arc<RelationalStore>, Arc<VectorStore>) {
        let personas = Arc::new(PersonaStore::load(persona_dir).unwrap());
        let cache = Arc::new(ConversationCache::new(50));
        let boundary = Arc::new(BoundaryManager::new(chrono::Duration::minutes(30)));
        let vector_store = Arc::new(VectorStore::new());
        let relational = Arc::new(RelationalStore::in_memory().unwrap());
        let flow_analyzer = Arc::new(personaforge_flow::FlowAnalyzer::new(Arc::clone(&embeddings)));
        let attribution = AttributionManager::new(IdentityLevel::Identified);
        let composer = PromptComposer::new("gpt-4o-mini", 4000, true);
        let persistor = Arc::new(TurnPersistor::new(Arc::clone(&embeddings), Arc::clone(&relational), Arc::clone(&timeseries)));

        let orchestrator = Orchestrator::new(
            Arc::clone(&personas),
            cache,
            boundary,
            Arc::clone(&vector_store),
            embeddings,
            emotion_analyzer,
            flow_analyzer,
            attribution,
            composer,
            llm,
            persistor,
            Arc::clone(&relational),
            timeseries,
        );
        (orchestrator, relational, vector_store)
    }

    /// Greeting with no history (spec scenario 1): a fresh `(user, channel)`
    /// pair gets a non-empty in-character reply, a relationship state, and
    /// a recorded turn.
    #[tokio::test]
    async fn greeting_with_no_history_produces_reply_and_persists_turn() {
        let tmp = tempfile::tempdir().unwrap();
        write_persona(tmp.path(), "elena", "Elena");

        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(MockEmbeddingClient::new(16));
        let emotion_analyzer: Arc<dyn EmotionAnalyzer> = Arc::new(HeuristicEmotionAnalyzer);
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::new("Hi there! Great to hear from you."));
        let timeseries: Arc<dyn TimeSeriesSink> = Arc::new(InMemoryTimeSeriesSink::new());

        let (orchestrator, relational, vector_store) = build(tmp.path(), embeddings, emotion_analyzer, llm, timeseries);

        let persona_id = PersonaId::from("elena");
        let reply = orchestrator
            .process_message(inbound("u1", "c1", "m1", "Hi!"), &persona_id)
            .await;

        assert!(!reply.trim().is_empty());
        assert!(relational.get_turn(&TurnId::from("m1")).unwrap().is_some());
        let state = relational.get_relationship_state(&persona_id, &UserId::from("u1")).unwrap();
        assert!((0.0..=1.0).contains(&state.trust));
        assert_eq!(vector_store.collection(persona_id).len(), 1);
    }

    /// An attachment policy is injected into the system message without
    /// derailing the rest of the pipeline.
    #[tokio::test]
    async fn image_attachment_still_produces_reply() {
        let tmp = tempfile::tempdir().unwrap();
        write_persona(tmp.path(), "elena", "Elena");

        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(MockEmbeddingClient::new(16));
        let emotion_analyzer: Arc<dyn EmotionAnalyzer> = Arc::new(HeuristicEmotionAnalyzer);
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::default());
        let timeseries: Arc<dyn TimeSeriesSink> = Arc::new(InMemoryTimeSeriesSink::new());

        let (orchestrator, _relational, _vector_store) =
            build(tmp.path(), embeddings, emotion_analyzer, llm, timeseries);

        let mut msg = inbound("u1", "c1", "m1", "check this out");
        msg.attachments.push(personaforge_types::Attachment {
            kind: AttachmentKind::Image,
            url_or_ref: "https://example.com/x.png".to_string(),
        });

        let reply = orchestrator.process_message(msg, &PersonaId::from("elena")).await;
        assert!(!reply.trim().is_empty());
    }

    /// Always-failing embeddings client: P10, branch-failure tolerance.
    /// Retrieval, flow analysis, and the memory write all degrade, but the
    /// turn is still persisted and a reply still comes back as long as the
    /// LLM itself succeeds.
    struct AlwaysErrEmbeddings;

    #[async_trait]
    impl EmbeddingClient for AlwaysErrEmbeddings {
        async fn embed(
            &self,
            _text: &str,
            _kind: personaforge_types::EmbeddingKind,
        ) -> Result<Vec<f32>, personaforge_types::PipelineError> {
            Err(personaforge_types::PipelineError::Unavailable {
                component: "embeddings",
                source: "simulated outage".to_string(),
            })
        }

        fn dimensions(&self) -> usize {
            16
        }

        fn model_info(&self) -> personaforge_embeddings::ModelInfo {
            personaforge_embeddings::ModelInfo {
                name: "always-err".to_string(),
                version: "0".to_string(),
                dimensions: 16,
                max_tokens: 8192,
            }
        }
    }

    #[tokio::test]
    async fn branch_failure_in_embeddings_still_yields_reply_and_persisted_turn() {
        let tmp = tempfile::tempdir().unwrap();
        write_persona(tmp.path(), "elena", "Elena");

        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(AlwaysErrEmbeddings);
        let emotion_analyzer: Arc<dyn EmotionAnalyzer> = Arc::new(HeuristicEmotionAnalyzer);
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::new("Still here for you."));
        let timeseries: Arc<dyn TimeSeriesSink> = Arc::new(InMemoryTimeSeriesSink::new());

        let (orchestrator, relational, vector_store) = build(tmp.path(), embeddings, emotion_analyzer, llm, timeseries);
        let persona_id = PersonaId::from("elena");

        let reply = orchestrator
            .process_message(inbound("u2", "c2", "m2", "Hi, how are you?"), &persona_id)
            .await;

        assert!(!reply.trim().is_empty());
        assert!(relational.get_turn(&TurnId::from("m2")).unwrap().is_some());
        // No embedding view succeeded, so no memory record is written, but
        // the turn and relationship state still are.
        assert_eq!(vector_store.collection(persona_id.clone()).len(), 0);
        assert!(relational.get_relationship_state(&persona_id, &UserId::from("u2")).is_ok());
    }

    /// P9: concurrent submissions for the same conversation key are
    /// serialized by `ConversationLocks`, so both turns land and neither
    /// clobbers the other.
    #[tokio::test]
    async fn same_conversation_key_serializes_concurrent_turns() {
        let tmp = tempfile::tempdir().unwrap();
        write_persona(tmp.path(), "elena", "Elena");

        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(MockEmbeddingClient::new(16));
        let emotion_analyzer: Arc<dyn EmotionAnalyzer> = Arc::new(HeuristicEmotionAnalyzer);
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::default());
        let timeseries: Arc<dyn TimeSeriesSink> = Arc::new(InMemoryTimeSeriesSink::new());

        let (orchestrator, relational, _vector_store) =
            build(tmp.path(), embeddings, emotion_analyzer, llm, timeseries);
        let orchestrator = Arc::new(orchestrator);
        let persona_id = PersonaId::from("elena");

        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            let persona_id = persona_id.clone();
            tokio::spawn(async move {
                orchestrator
                    .process_message(inbound("u3", "c3", "first", "hello there"), &persona_id)
                    .await
            })
        };
        let second = {
            let orchestrator = Arc::clone(&orchestrator);
            let persona_id = persona_id.clone();
            tokio::spawn(async move {
                orchestrator
                    .process_message(inbound("u3", "c3", "second", "a follow-up"), &persona_id)
                    .await
            })
        };

        let (first_reply, second_reply) = tokio::join!(first, second);
        assert!(!first_reply.unwrap().trim().is_empty());
        assert!(!second_reply.unwrap().trim().is_empty());
        assert!(relational.get_turn(&TurnId::from("first")).unwrap().is_some());
        assert!(relational.get_turn(&TurnId::from("second")).unwrap().is_some());
    }
}

