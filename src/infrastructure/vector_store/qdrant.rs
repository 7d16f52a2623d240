use async_trait::async_trait;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, ScoredPoint,
    SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use uuid::Uuid;

use super::top_ranked;
use crate::domain::{ports::VectorStore, DocumentChunk, DomainError, Embedding, SearchResult};

/// Qdrant-backed store. The collection holds exactly one session's chunks
/// and is dropped and recreated on [`VectorStore::clear`].
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

fn unavailable(e: impl std::fmt::Display) -> DomainError {
    DomainError::index_unavailable(format!("qdrant: {e}"))
}

impl QdrantVectorStore {
    pub async fn new(url: &str, collection: &str, dimension: usize) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url).build().map_err(unavailable)?;

        let store = Self {
            client,
            collection: collection.to_string(),
            dimension,
        };

        store.ensure_collection().await?;

        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(unavailable)?;

        if !exists {
            tracing::info!(collection = %self.collection, dimension = self.dimension, "creating collection");
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(unavailable)?;
        }

        Ok(())
    }

    fn to_point(chunk: &DocumentChunk, embedding: &Embedding) -> Result<PointStruct, DomainError> {
        let payload: Payload = serde_json::json!({
            "chunk_id": chunk.id.to_string(),
            "document_name": chunk.document_name,
            "document_position": chunk.document_position,
            "chunk_index": chunk.chunk_index,
            "token_start": chunk.tokens.start,
            "token_end": chunk.tokens.end,
            "byte_start": chunk.bytes.start,
            "byte_end": chunk.bytes.end,
            "content": chunk.content,
        })
        .try_into()
        .map_err(|_| DomainError::internal("Failed to create payload"))?;

        Ok(PointStruct::new(
            chunk.id.to_string(),
            embedding.as_slice().to_vec(),
            payload,
        ))
    }

    fn from_payload(payload: &HashMap<String, Value>) -> Result<DocumentChunk, DomainError> {
        let malformed = |key: &str| unavailable(format!("point payload missing or invalid '{key}'"));
        let text = |key: &str| -> Result<String, DomainError> {
            payload
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| malformed(key))
        };
        let int = |key: &str| -> Result<usize, DomainError> {
            payload
                .get(key)
                .and_then(|v| v.as_integer())
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| malformed(key))
        };

        let id: Uuid = text("chunk_id")?.parse().map_err(|_| malformed("chunk_id"))?;

        Ok(DocumentChunk {
            id,
            document_name: text("document_name")?,
            document_position: int("document_position")?,
            chunk_index: int("chunk_index")?,
            tokens: int("token_start")?..int("token_end")?,
            bytes: int("byte_start")?..int("byte_end")?,
            content: text("content")?,
        })
    }

    /// Exact search so that repeated queries see identical scores.
    async fn search_exact(
        &self,
        query: &Embedding,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>, DomainError> {
        let mut request =
            SearchPointsBuilder::new(&self.collection, query.as_slice().to_vec(), limit as u64)
                .with_payload(true)
                .params(SearchParamsBuilder::default().exact(true));
        if let Some(threshold) = score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = self.client.search_points(request).await.map_err(unavailable)?;
        Ok(response.result)
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn upsert(&self, chunk: &DocumentChunk, embedding: &Embedding) -> Result<(), DomainError> {
        self.upsert_batch(&[(chunk.clone(), embedding.clone())])
            .await
    }

    async fn upsert_batch(
        &self,
        entries: &[(DocumentChunk, Embedding)],
    ) -> Result<(), DomainError> {
        if entries.is_empty() {
            return Ok(());
        }

        let points = entries
            .iter()
            .map(|(chunk, embedding)| Self::to_point(chunk, embedding))
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let head = self.search_exact(query, top_k, None).await?;

        // Qdrant orders equal scores arbitrarily, so a full page is widened to
        // every point scoring at least the k-th score before ranking.
        let kth_score = match head.last() {
            Some(last) if head.len() == top_k => Some(last.score),
            _ => None,
        };
        let points = match kth_score {
            Some(score) => {
                let total = self.len().await?;
                self.search_exact(query, total.max(top_k), Some(score))
                    .await?
            }
            None => head,
        };

        let results = points
            .into_iter()
            .map(|point| {
                Ok(SearchResult {
                    chunk: Self::from_payload(&point.payload)?,
                    score: point.score,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(top_ranked(results, top_k))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.client
            .delete_collection(&self.collection)
            .await
            .map_err(unavailable)?;
        self.ensure_collection().await
    }

    async fn len(&self) -> Result<usize, DomainError> {
        let count = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(unavailable)?;

        Ok(count.result.map(|r| r.count as usize).unwrap_or(0))
    }
}
