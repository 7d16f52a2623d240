use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::{chunk_document, Document, DocumentChunk, DomainError, PipelineConfig};

/// Most documents a single upload may contain.
pub const MAX_DOCUMENTS: usize = 4;

/// Validates an upload and splits it into overlapping token chunks.
pub struct DocumentIngestor {
    config: Arc<PipelineConfig>,
}

impl DocumentIngestor {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    /// Chunks every document in upload order. Chunk order follows document
    /// order, then position within the document.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn ingest(&self, documents: &[Document]) -> Result<Vec<DocumentChunk>, DomainError> {
        validate(documents)?;

        let chunks: Vec<DocumentChunk> = documents
            .iter()
            .enumerate()
            .flat_map(|(position, doc)| {
                chunk_document(
                    &doc.name,
                    position,
                    &doc.content,
                    self.config.chunk_size(),
                    self.config.chunk_overlap(),
                )
            })
            .collect();

        tracing::debug!(chunks = chunks.len(), "documents chunked");
        Ok(chunks)
    }
}

fn validate(documents: &[Document]) -> Result<(), DomainError> {
    if documents.is_empty() {
        return Err(DomainError::invalid_input("at least one document is required"));
    }
    if documents.len() > MAX_DOCUMENTS {
        return Err(DomainError::invalid_input(format!(
            "at most {MAX_DOCUMENTS} documents may be uploaded, got {}",
            documents.len()
        )));
    }

    let mut names = HashSet::new();
    for doc in documents {
        if doc.name.trim().is_empty() {
            return Err(DomainError::invalid_input("document name must not be empty"));
        }
        if doc.is_blank() {
            return Err(DomainError::invalid_input(format!(
                "document '{}' is empty",
                doc.name
            )));
        }
        if !names.insert(doc.name.as_str()) {
            return Err(DomainError::invalid_input(format!(
                "document '{}' was uploaded twice",
                doc.name
            )));
        }
    }

    Ok(())
}
