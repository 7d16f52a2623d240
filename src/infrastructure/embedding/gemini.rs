use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingModel as _;
use rig::providers::gemini;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::{require_api_key, EmbeddingConfig};

/// Texts per batch embedding request.
const MAX_BATCH: usize = 100;

pub struct GeminiEmbedding {
    model: gemini::embedding::EmbeddingModel,
    model_name: String,
    dimension: usize,
}

fn unavailable(e: impl std::fmt::Display) -> DomainError {
    DomainError::index_unavailable(format!("embedding provider: {e}"))
}

impl GeminiEmbedding {
    /// Builds a client from `GEMINI_API_KEY`, failing if the key is absent.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, DomainError> {
        require_api_key()?;
        let client = gemini::Client::from_env();
        Ok(Self {
            model: client.embedding_model_with_ndims(&config.model, config.dimension),
            model_name: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingService for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let embedding = self.model.embed_text(text).await.map_err(unavailable)?;
        Ok(Embedding::from_f64(&embedding.vec))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH) {
            let vectors = self
                .model
                .embed_texts(batch.iter().map(|t| t.to_string()))
                .await
                .map_err(unavailable)?;

            if vectors.len() != batch.len() {
                return Err(unavailable(format!(
                    "{} returned {} vectors for {} texts",
                    self.model_name,
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors.iter().map(|e| Embedding::from_f64(&e.vec)));
        }

        tracing::debug!(count = embeddings.len(), model = %self.model_name, "embedded batch");
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
