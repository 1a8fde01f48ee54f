use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ApiType, Config};
use crate::error::{RagError, Result};
use crate::http::{model_auth, ServiceClient};
use crate::retry::RetryPolicy;

/// Turns text into a fixed-length vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// Embedding endpoint client. Every call re-embeds; nothing is cached.
pub struct EmbeddingClient {
    http: ServiceClient,
    url: String,
    api_type: ApiType,
    api_key: String,
    engine: String,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    pub fn new(cfg: &Config, http: ServiceClient) -> Self {
        let url = match cfg.api_type {
            ApiType::OpenAi => format!("{}/embeddings", cfg.api_base),
            ApiType::Azure | ApiType::AzureAd => format!(
                "{}/openai/deployments/{}/embeddings?api-version={}",
                cfg.api_base, cfg.embedding_engine, cfg.api_version
            ),
        };
        Self {
            http,
            url,
            api_type: cfg.api_type,
            api_key: cfg.api_key.clone(),
            engine: cfg.embedding_engine.clone(),
            retry: cfg.embed_retry.clone(),
        }
    }

    fn embed_once(&self, text: &str) -> Result<Vec<f32>> {
        let req = EmbedRequest {
            input: text,
            model: (self.api_type == ApiType::OpenAi).then_some(self.engine.as_str()),
        };
        let headers = model_auth(self.api_type, &self.api_key)?;
        let res = self.http.post_json::<EmbedResponse, _>(&self.url, headers, &req)?;
        res.data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| RagError::service("No embeddings in response"))
    }
}

impl Embedder for EmbeddingClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.retry.run("embedding", || self.embed_once(text))?;
        debug!(dims = vector.len(), "embedded query");
        Ok(vector)
    }
}
