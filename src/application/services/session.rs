use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use super::ingest::DocumentIngestor;
use super::prompt::{select_history, PromptBuilder};
use super::retrieval::RetrievalIndex;
use crate::domain::{
    ports::{GenerationParams, LlmService},
    ChatTurn, Conversation, Document, DomainError, PipelineConfig, SearchResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Ready,
    AwaitingResponse,
}

/// A passage the answer was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub document: String,
    pub chunk_index: usize,
    pub score: f32,
}

impl From<&SearchResult> for Source {
    fn from(result: &SearchResult) -> Self {
        Self {
            document: result.chunk.document_name.clone(),
            chunk_index: result.chunk.chunk_index,
            score: result.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

/// Conversation over one set of uploaded documents.
///
/// `Uninitialized` until documents load, then `Ready`. Each `ask` passes
/// through `AwaitingResponse` and returns to `Ready` whether or not the model
/// answered. Methods take `&mut self`, so a session handles one request at a
/// time.
pub struct ChatSession {
    config: Arc<PipelineConfig>,
    ingestor: DocumentIngestor,
    index: RetrievalIndex,
    llm: Arc<dyn LlmService>,
    model: String,
    prompts: PromptBuilder,
    state: SessionState,
    documents: Vec<String>,
    chunk_count: usize,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(config: Arc<PipelineConfig>, index: RetrievalIndex, llm: Arc<dyn LlmService>) -> Self {
        Self {
            ingestor: DocumentIngestor::new(config.clone()),
            config,
            index,
            model: llm.model_name().to_string(),
            llm,
            prompts: PromptBuilder::default(),
            state: SessionState::Uninitialized,
            documents: Vec::new(),
            chunk_count: 0,
            conversation: Conversation::new(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn history(&self) -> &[ChatTurn] {
        self.conversation.turns()
    }

    /// Model id the next question is sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Switches the model for later questions. Documents and history are kept.
    pub fn select_model(&mut self, model: impl Into<String>) -> Result<(), DomainError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(DomainError::invalid_input("model must not be empty"));
        }
        tracing::info!(from = %self.model, to = %model, "model selected");
        self.model = model;
        Ok(())
    }

    /// Chunks and indexes `documents`, starting a fresh conversation.
    ///
    /// Validation and embedding happen before the current index is touched,
    /// so those failures leave the session exactly as it was. A failure
    /// while writing the new index leaves it `Uninitialized`.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn load_documents(&mut self, documents: Vec<Document>) -> Result<usize, DomainError> {
        let chunks = self.ingestor.ingest(&documents).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected upload");
        })?;

        let entries = self.index.embed_chunks(&chunks).await.inspect_err(|e| {
            tracing::error!(error = %e, "failed to embed documents");
        })?;

        if let Err(e) = self.index.replace(&entries).await {
            tracing::error!(error = %e, "failed to store index");
            self.clear_local();
            return Err(e);
        }

        self.documents = documents.into_iter().map(|d| d.name).collect();
        self.chunk_count = entries.len();
        self.conversation = Conversation::new();
        self.state = SessionState::Ready;

        tracing::info!(
            documents = self.documents.len(),
            chunks = self.chunk_count,
            "documents loaded"
        );
        Ok(self.chunk_count)
    }

    /// Answers `question` from the indexed documents.
    ///
    /// The question is recorded before the model is called. On success the
    /// reply is appended after it; on failure the question is marked failed
    /// and nothing else is appended.
    #[instrument(skip(self))]
    pub async fn ask(&mut self, question: &str) -> Result<Answer, DomainError> {
        self.recover_abandoned();

        if self.state != SessionState::Ready {
            return Err(DomainError::not_ready(
                "load documents before asking questions",
            ));
        }

        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::invalid_input("question must not be empty"));
        }

        self.state = SessionState::AwaitingResponse;
        let turn = self.conversation.push_question(question);

        let result = self.answer(question).await;

        match &result {
            Ok(answer) => {
                if self.conversation.push_answer(turn, answer.text.clone()).is_none() {
                    tracing::warn!(turn, "question was settled before its answer arrived");
                }
                tracing::info!(sources = answer.sources.len(), "question answered");
            }
            Err(e) => {
                self.conversation.mark_failed(turn);
                tracing::error!(error = %e, "question failed");
            }
        }

        self.state = SessionState::Ready;
        result
    }

    /// Drops documents, index and history.
    #[instrument(skip(self))]
    pub async fn reset(&mut self) -> Result<(), DomainError> {
        self.clear_local();
        self.index.clear().await?;
        tracing::info!("session reset");
        Ok(())
    }

    async fn answer(&self, question: &str) -> Result<Answer, DomainError> {
        let context = self.index.query(question, self.config.top_k()).await?;

        let prompt = {
            let history = select_history(
                &self.conversation,
                self.config.max_history_turns(),
                self.config.max_response_tokens(),
            );
            self.prompts.build(question, &context, &history)
        };

        let params = GenerationParams::new(&self.config, &self.model);
        let text = self
            .llm
            .generate(self.prompts.system(), &prompt, params)
            .await?;

        if text.trim().is_empty() {
            return Err(DomainError::generation_failed("model returned no content"));
        }

        Ok(Answer {
            text,
            sources: context.iter().map(Source::from).collect(),
        })
    }

    /// An `ask` whose future was dropped leaves the session awaiting a reply
    /// that will never arrive.
    fn recover_abandoned(&mut self) {
        if self.state == SessionState::AwaitingResponse {
            let failed = self.conversation.fail_pending();
            tracing::warn!(failed, "recovering from abandoned question");
            self.state = SessionState::Ready;
        }
    }

    fn clear_local(&mut self) {
        self.state = SessionState::Uninitialized;
        self.documents.clear();
        self.chunk_count = 0;
        self.conversation = Conversation::new();
    }
}
