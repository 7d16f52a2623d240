//! Deterministic in-process providers for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::ports::{EmbeddingService, GenerationParams, LlmService};
use crate::domain::{DomainError, Embedding};

const DIMENSION: usize = 64;

/// Bag-of-words embedding: each lowercase word is hashed into one bucket.
#[derive(Clone, Default)]
pub struct HashEmbedding {
    unavailable: Arc<AtomicBool>,
}

impl HashEmbedding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn vector(text: &str) -> Embedding {
        let mut vec = vec![0.0f32; DIMENSION];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }
            // FNV-1a
            let hash = word
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100_0000_01b3));
            vec[(hash % DIMENSION as u64) as usize] += 1.0;
        }
        Embedding::new(vec)
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DomainError::index_unavailable("embedding provider unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EmbeddingService for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.check()?;
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        self.check()?;
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub prompt: String,
    pub params: GenerationParams,
}

/// Language model that returns a fixed reply, or fails on demand.
#[derive(Clone)]
pub struct ScriptedLlm {
    reply: Arc<Mutex<Option<String>>>,
    hanging: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedLlm {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Arc::new(Mutex::new(Some(reply.into()))),
            hanging: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Arc::new(Mutex::new(None)),
            hanging: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_reply(&self, reply: Option<&str>) {
        *self.reply.lock().unwrap() = reply.map(str::to_string);
    }

    /// While set, calls never complete.
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, DomainError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
            params,
        });

        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        self.reply
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| DomainError::generation_failed("rate limit exceeded"))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
