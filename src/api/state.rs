use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::{ChatSession, PromptBuilder, RetrievalIndex};
use crate::domain::{
    ports::{EmbeddingService, LlmService, VectorStore},
    DomainError,
};
use crate::infrastructure::{
    AppConfig, DocumentLibrary, GeminiEmbedding, GeminiLlm, InMemoryVectorStore,
    QdrantVectorStore, VectorStoreConfig,
};

/// Shared handler state.
///
/// The session sits behind an async mutex held for the whole request, so at
/// most one load, question or reset runs at a time.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<ChatSession>>,
    pub library: Arc<DocumentLibrary>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(session: ChatSession, library: DocumentLibrary, config: AppConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            library: Arc::new(library),
            config: Arc::new(config),
        }
    }

    /// Wires the Gemini providers and the configured vector store.
    pub async fn from_config(config: AppConfig) -> Result<Self, DomainError> {
        let embedding: Arc<dyn EmbeddingService> =
            Arc::new(GeminiEmbedding::from_config(&config.embedding)?);
        let llm: Arc<dyn LlmService> = Arc::new(GeminiLlm::from_config(&config.llm)?);

        let vector_store: Arc<dyn VectorStore> = match &config.vector_store {
            VectorStoreConfig::Memory => Arc::new(InMemoryVectorStore::new()),
            VectorStoreConfig::Qdrant { url, collection } => Arc::new(
                QdrantVectorStore::new(url, collection, embedding.dimension()).await?,
            ),
        };

        tracing::info!(
            model = llm.model_name(),
            vector_store = ?config.vector_store,
            "providers initialized"
        );

        let session = ChatSession::new(
            Arc::new(config.pipeline.clone()),
            RetrievalIndex::new(embedding, vector_store),
            llm,
        )
        .with_prompts(PromptBuilder::new(
            &config.prompts.system,
            &config.prompts.no_context,
        ));
        let library = DocumentLibrary::from_config(&config.library);

        Ok(Self::new(session, library, config))
    }
}
