//! Application layer - Use cases and orchestration.
//!
//! This module contains the ingest, retrieval and chat-session services.
//! Services depend on domain ports (traits) rather than concrete
//! provider implementations.

pub mod services;

pub use services::{
    Answer, ChatSession, DocumentIngestor, PromptBuilder, RetrievalIndex, SessionState, Source,
    MAX_DOCUMENTS,
};
