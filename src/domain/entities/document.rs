use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use uuid::Uuid;

/// A named text blob supplied by the user. The name is its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            uploaded_at: Utc::now(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_name: String,
    /// Position of the source document within its upload.
    pub document_position: usize,
    pub chunk_index: usize,
    /// Token offsets into the source document, end exclusive.
    pub tokens: Range<usize>,
    /// Byte offsets into the source document, end exclusive.
    pub bytes: Range<usize>,
    pub content: String,
}

impl DocumentChunk {
    pub fn new(
        document_name: impl Into<String>,
        document_position: usize,
        chunk_index: usize,
        tokens: Range<usize>,
        bytes: Range<usize>,
        content: impl Into<String>,
    ) -> Self {
        let document_name = document_name.into();
        let content = content.into();
        Self {
            id: chunk_id(&document_name, chunk_index, &content),
            document_name,
            document_position,
            chunk_index,
            tokens,
            bytes,
            content,
        }
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Name-based id so rebuilding an index from the same text yields the same ids.
fn chunk_id(document_name: &str, chunk_index: usize, content: &str) -> Uuid {
    let key = format!("{document_name}\u{0}{chunk_index}\u{0}{content}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Splits text into tokens, returning the byte range of each.
///
/// A token is a run of non-whitespace characters plus the whitespace that
/// follows it. Leading whitespace is folded into the first token, so the
/// ranges tile the whole input.
pub fn tokenize(text: &str) -> Vec<Range<usize>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_trailing_space = false;
    let mut seen_word = false;

    for (offset, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if seen_word {
                in_trailing_space = true;
            }
        } else if in_trailing_space {
            tokens.push(start..offset);
            start = offset;
            in_trailing_space = false;
        } else {
            seen_word = true;
        }
    }

    if seen_word {
        tokens.push(start..text.len());
    }

    tokens
}

/// Counts tokens the same way [`tokenize`] splits them.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits a document into overlapping token windows.
///
/// Windows hold `chunk_size` tokens and start every `chunk_size - chunk_overlap`
/// tokens; the final window may be shorter. Text with fewer than `chunk_size`
/// tokens becomes a single chunk, blank text yields none.
pub fn chunk_document(
    document_name: &str,
    document_position: usize,
    content: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<DocumentChunk> {
    debug_assert!(chunk_overlap < chunk_size);

    let tokens = tokenize(content);
    let total = tokens.len();
    let stride = chunk_size - chunk_overlap;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let end = (start + chunk_size).min(total);
        let bytes = tokens[start].start..tokens[end - 1].end;

        chunks.push(DocumentChunk::new(
            document_name,
            document_position,
            chunks.len(),
            start..end,
            bytes.clone(),
            &content[bytes],
        ));

        if end == total {
            break;
        }
        start += stride;
    }

    chunks
}

/// Rebuilds a document's text from its chunks by dropping the overlap each
/// chunk shares with its predecessor. Chunks must be in order.
pub fn reconstruct(chunks: &[DocumentChunk]) -> String {
    let mut text = String::new();
    let mut covered = 0usize;

    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.bytes.start);
        if skip < chunk.content.len() {
            text.push_str(&chunk.content[skip..]);
        }
        covered = covered.max(chunk.bytes.end);
    }

    text
}
