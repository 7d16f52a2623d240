use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

/// Turns text into vectors. Implementations must be deterministic for a
/// fixed model: the same text always maps to the same embedding.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;
    /// Embeds every text, preserving input order in the output.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError>;
    fn dimension(&self) -> usize;
}
