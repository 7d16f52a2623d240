use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::gemini;
use std::time::Duration;

use crate::domain::{
    ports::{GenerationParams, LlmService},
    DomainError,
};
use crate::infrastructure::config::{require_api_key, LlmConfig};

pub struct GeminiLlm {
    client: gemini::Client,
    model: String,
    timeout: Duration,
}

impl GeminiLlm {
    /// Builds a client from `GEMINI_API_KEY`, failing if the key is absent.
    pub fn from_env(model: impl Into<String>) -> Result<Self, DomainError> {
        require_api_key()?;
        Ok(Self {
            client: gemini::Client::from_env(),
            model: model.into(),
            timeout: Duration::from_secs(60),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, DomainError> {
        Ok(Self::from_env(config.default_model())?
            .with_timeout(Duration::from_secs(config.timeout_seconds)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmService for GeminiLlm {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, DomainError> {
        let agent = self
            .client
            .agent(&params.model)
            .preamble(system)
            .temperature(f64::from(params.temperature))
            .max_tokens(params.max_tokens as u64)
            .build();

        tracing::debug!(model = %params.model, prompt_len = prompt.len(), "calling model");

        tokio::time::timeout(self.timeout, agent.prompt(prompt))
            .await
            .map_err(|_| DomainError::generation_failed("model call timed out"))?
            .map_err(|e| DomainError::generation_failed(format!("{}: {e}", params.model)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
