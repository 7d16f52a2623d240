mod config;
mod conversation;
mod document;
mod embedding;

pub use config::PipelineConfig;
pub use conversation::{ChatTurn, Conversation, TurnRole, TurnStatus};
pub use document::{
    chunk_document, count_tokens, reconstruct, tokenize, Document, DocumentChunk, SearchResult,
};
pub use embedding::Embedding;
