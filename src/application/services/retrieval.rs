use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentChunk, DomainError, Embedding, SearchResult,
};

/// Merged retrieval index over every chunk of the current upload.
pub struct RetrievalIndex {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
}

impl RetrievalIndex {
    pub fn new(embedding: Arc<dyn EmbeddingService>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedding,
            vector_store,
        }
    }

    /// Replaces the index contents with `chunks`. Returns how many were stored.
    #[instrument(skip_all, fields(count = chunks.len()))]
    pub async fn build(&self, chunks: &[DocumentChunk]) -> Result<usize, DomainError> {
        let entries = self.embed_chunks(chunks).await?;
        self.replace(&entries).await
    }

    /// Embeds chunks without touching the stored index.
    #[instrument(skip_all, fields(count = chunks.len()))]
    pub async fn embed_chunks(
        &self,
        chunks: &[DocumentChunk],
    ) -> Result<Vec<(DocumentChunk, Embedding)>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::index_unavailable(format!(
                "embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        Ok(chunks.iter().cloned().zip(embeddings).collect())
    }

    /// Swaps the stored index for `entries`.
    #[instrument(skip_all, fields(count = entries.len()))]
    pub async fn replace(&self, entries: &[(DocumentChunk, Embedding)]) -> Result<usize, DomainError> {
        self.vector_store.clear().await?;
        self.vector_store.upsert_batch(entries).await?;
        tracing::info!(chunks = entries.len(), "index built");
        Ok(entries.len())
    }

    /// Returns the `top_k` chunks most similar to `question`.
    #[instrument(skip(self))]
    pub async fn query(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        if top_k == 0 {
            return Err(DomainError::invalid_input("top_k must be positive"));
        }

        let embedding = self.embedding.embed(question).await?;
        let results = self.vector_store.search(&embedding, top_k).await?;

        tracing::debug!(results = results.len(), "retrieved chunks");
        Ok(results)
    }

    pub async fn clear(&self) -> Result<(), DomainError> {
        self.vector_store.clear().await
    }
}
