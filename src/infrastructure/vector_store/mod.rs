mod in_memory;
mod qdrant;

use std::cmp::Ordering;

use crate::domain::SearchResult;

pub use in_memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;

/// Result ordering shared by every store: descending score, then document
/// position, then chunk index.
pub(crate) fn rank(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then(a.chunk.document_position.cmp(&b.chunk.document_position))
        .then(a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
}

/// Sorts by [`rank`] and keeps the first `top_k`.
pub(crate) fn top_ranked(mut results: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
    results.sort_by(rank);
    results.truncate(top_k);
    results
}
