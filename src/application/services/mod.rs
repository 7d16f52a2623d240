mod ingest;
mod prompt;
mod retrieval;
mod session;

pub use ingest::{DocumentIngestor, MAX_DOCUMENTS};
pub use prompt::{select_history, PromptBuilder, DEFAULT_NO_CONTEXT, DEFAULT_SYSTEM_PROMPT};
pub use retrieval::RetrievalIndex;
pub use session::{Answer, ChatSession, SessionState, Source};
