use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::DomainError;

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MAX_RESPONSE_TOKENS: usize = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_HISTORY_TURNS: usize = 10;
pub const DEFAULT_LOG_PATH: &str = "app.log";

/// Retrieval and generation settings shared by every part of the pipeline.
///
/// Fields are private so that a value can only exist after validation;
/// deserialization goes through the same checks as [`PipelineConfig::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPipelineConfig", into = "RawPipelineConfig")]
pub struct PipelineConfig {
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
    max_response_tokens: usize,
    temperature: f32,
    max_history_turns: usize,
    log_path: PathBuf,
}

impl PipelineConfig {
    pub fn new(
        chunk_size: usize,
        chunk_overlap: usize,
        max_response_tokens: usize,
        temperature: f32,
        log_path: impl Into<PathBuf>,
    ) -> Result<Self, DomainError> {
        RawPipelineConfig {
            chunk_size,
            chunk_overlap,
            max_response_tokens,
            temperature,
            log_path: log_path.into(),
            ..RawPipelineConfig::default()
        }
        .try_into()
    }

    pub fn with_top_k(self, top_k: usize) -> Result<Self, DomainError> {
        let mut raw = RawPipelineConfig::from(self);
        raw.top_k = top_k;
        raw.try_into()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance in tokens between the starts of consecutive chunks.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn max_response_tokens(&self) -> usize {
        self.max_response_tokens
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_history_turns(&self) -> usize {
        self.max_history_turns
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let raw = RawPipelineConfig::default();
        Self {
            chunk_size: raw.chunk_size,
            chunk_overlap: raw.chunk_overlap,
            top_k: raw.top_k,
            max_response_tokens: raw.max_response_tokens,
            temperature: raw.temperature,
            max_history_turns: raw.max_history_turns,
            log_path: raw.log_path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RawPipelineConfig {
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
    max_response_tokens: usize,
    temperature: f32,
    max_history_turns: usize,
    log_path: PathBuf,
}

impl Default for RawPipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            max_response_tokens: DEFAULT_MAX_RESPONSE_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

impl TryFrom<RawPipelineConfig> for PipelineConfig {
    type Error = DomainError;

    fn try_from(raw: RawPipelineConfig) -> Result<Self, Self::Error> {
        if raw.chunk_size == 0 {
            return Err(DomainError::invalid_config("chunk_size must be positive"));
        }
        if raw.chunk_overlap >= raw.chunk_size {
            return Err(DomainError::invalid_config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                raw.chunk_overlap, raw.chunk_size
            )));
        }
        if !(0.0..=1.0).contains(&raw.temperature) {
            return Err(DomainError::invalid_config(format!(
                "temperature must be within [0, 1], got {}",
                raw.temperature
            )));
        }
        if raw.max_response_tokens == 0 {
            return Err(DomainError::invalid_config(
                "max_response_tokens must be positive",
            ));
        }
        if raw.top_k == 0 {
            return Err(DomainError::invalid_config("top_k must be positive"));
        }

        Ok(Self {
            chunk_size: raw.chunk_size,
            chunk_overlap: raw.chunk_overlap,
            top_k: raw.top_k,
            max_response_tokens: raw.max_response_tokens,
            temperature: raw.temperature,
            max_history_turns: raw.max_history_turns,
            log_path: raw.log_path,
        })
    }
}

impl From<PipelineConfig> for RawPipelineConfig {
    fn from(config: PipelineConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            top_k: config.top_k,
            max_response_tokens: config.max_response_tokens,
            temperature: config.temperature,
            max_history_turns: config.max_history_turns,
            log_path: config.log_path,
        }
    }
}
