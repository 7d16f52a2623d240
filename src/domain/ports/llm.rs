use crate::domain::{errors::DomainError, PipelineConfig};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl GenerationParams {
    pub fn new(config: &PipelineConfig, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: config.temperature(),
            max_tokens: config.max_response_tokens(),
        }
    }
}

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, DomainError>;

    /// Model used until a session selects another.
    fn model_name(&self) -> &str;
}
