//! Remote chat-completion endpoint client, used when a deployment points
//! the collaborator at a real provider instead of the deterministic mock.
//! Mirrors `personaforge-embeddings::http::HttpEmbeddingClient`'s shape.

#![cfg(feature = "http")]

use async_trait::async_trait;
use personaforge_types::{LlmMessage, LlmRole, PipelineError};
use serde::{Deserialize, Serialize};

use crate::client::LlmClient;

pub struct HttpLlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl HttpLlmClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

fn role_str(role: LlmRole) -> &'static str {
    match role {
        LlmRole::User => "user",
        LlmRole::Assistant => "assistant",
        LlmRole::System => "system",
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, messages: &[LlmMessage]) -> Result<String, PipelineError> {
        let chat_messages = messages
            .iter()
            .map(|m| ChatMessage { role: role_str(m.role), content: &m.content })
            .collect();

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&ChatRequest { model: &self.model, messages: chat_messages })
            .send()
            .await
            .map_err(|e| PipelineError::Unavailable {
                component: "llm_http_client",
                source: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(PipelineError::Unavailable {
                component: "llm_http_client",
                source: format!("status {}", resp.status()),
            });
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| PipelineError::Invalid {
            reason: format!("malformed chat completion response: {e}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PipelineError::Invalid {
                reason: "chat completion response had no choices".to_string(),
            })
    }
}
