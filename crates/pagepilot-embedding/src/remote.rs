//! HTTP embedding provider for `/embeddings`-style APIs (Voyage, OpenAI).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pagepilot_protocols::{Embedding, EmbeddingError, EmbeddingProvider};

/// Output dimension of `voyage-2`.
pub const VOYAGE_DIMENSION: usize = 1024;

/// Configuration for an HTTP embedding endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Base URL; `/embeddings` is appended.
    pub base_url: String,
    /// Fixed output dimension of the model.
    pub dimension: usize,
}

impl HttpEmbeddingConfig {
    /// Voyage AI defaults (`voyage-2`, 1024 dimensions).
    pub fn voyage(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "voyage-2".to_string(),
            base_url: "https://api.voyageai.com/v1".to_string(),
            dimension: VOYAGE_DIMENSION,
        }
    }

    /// OpenAI defaults (`text-embedding-3-small`, 1536 dimensions).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            dimension: 1536,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_dimension(mut self, dim: usize) -> Self {
        self.dimension = dim;
        self
    }
}

/// Embedding provider backed by an HTTP API.
pub struct HttpEmbedding {
    client: reqwest::Client,
    config: HttpEmbeddingConfig,
}

impl HttpEmbedding {
    pub fn new(config: HttpEmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &HttpEmbeddingConfig {
        &self.config
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [&'a str],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let embeddings = self.embed_batch(&[text]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Failed("Empty response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            input: texts,
            model: &self.config.model,
        };
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));

        debug!("Embedding {} texts with {}", texts.len(), self.config.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Failed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Failed(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Failed(format!("Invalid response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: parsed.data.len(),
            });
        }

        if let Some(bad) = parsed
            .data
            .iter()
            .find(|d| d.embedding.len() != self.config.dimension)
        {
            return Err(EmbeddingError::InvalidInput(format!(
                "{} returned {}-dimensional vectors, configured for {}",
                self.config.model,
                bad.embedding.len(),
                self.config.dimension
            )));
        }

        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(parsed
            .data
            .into_iter()
            .map(|d| Embedding::new(d.embedding))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
