//! Remote embedding endpoint client, used when a deployment configures a
//! real embedding model behind HTTP instead of the deterministic mock.

#![cfg(feature = "http")]

use crate::client::{EmbeddingClient, ModelInfo};
use async_trait::async_trait;
use personaforge_types::{EmbeddingKind, PipelineError};
use serde::{Deserialize, Serialize};

pub struct HttpEmbeddingClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl HttpEmbeddingClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, text: &str, kind: EmbeddingKind) -> Result<Vec<f32>, PipelineError> {
        let framed = kind.frame(text);
        let resp = self
            .http
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                input: &framed,
            })
            .send()
            .await
            .map_err(|e| PipelineError::Unavailable {
                component: "embedding_http_client",
                source: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(PipelineError::Unavailable {
                component: "embedding_http_client",
                source: format!("status {}", resp.status()),
            });
        }

        let parsed: EmbedResponse = resp.json().await.map_err(|e| PipelineError::Invalid {
            reason: format!("malformed embedding response: {e}"),
        })?;

        if parsed.embedding.len() != self.dimensions {
            return Err(PipelineError::Invalid {
                reason: format!(
                    "embedding dimension {} != configured {}",
                    parsed.embedding.len(),
                    self.dimensions
                ),
            });
        }

        Ok(parsed.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.model.clone(),
            version: "remote".to_string(),
            dimensions: self.dimensions,
            max_tokens: 8192,
        }
    }
}
