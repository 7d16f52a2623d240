mod embedding;
mod llm;
mod vector_store;

pub use embedding::EmbeddingService;
pub use llm::{GenerationParams, LlmService};
pub use vector_store::VectorStore;
