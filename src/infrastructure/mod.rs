pub mod config;
pub mod embedding;
pub mod library;
pub mod llm;
pub mod logging;
pub mod vector_store;

pub use config::{AppConfig, LlmConfig, PromptsConfig, VectorStoreConfig};
pub use embedding::GeminiEmbedding;
pub use library::DocumentLibrary;
pub use llm::GeminiLlm;
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore};
