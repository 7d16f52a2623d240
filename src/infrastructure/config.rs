use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::application::services::{DEFAULT_NO_CONTEXT, DEFAULT_SYSTEM_PROMPT};
use crate::domain::{DomainError, PipelineConfig};

pub const CONFIG_PATH_ENV: &str = "DOCCHAT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Everything the service reads at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub server: ServerConfig,
    pub library: LibraryConfig,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Catalog name or raw model id.
    pub model: String,
    /// Display name to provider model id.
    pub models: BTreeMap<String, String>,
    pub timeout_seconds: u64,
}

impl LlmConfig {
    pub const FALLBACK_MODEL: &'static str = "gemini-1.5-flash";

    /// Looks up a catalog display name or a model id already in the catalog.
    pub fn find_model(&self, selection: &str) -> Option<String> {
        if let Some(id) = self.models.get(selection) {
            return Some(id.clone());
        }
        self.models
            .values()
            .find(|id| id.as_str() == selection)
            .cloned()
    }

    /// Resolves a catalog name to its model id, falling back to
    /// [`Self::FALLBACK_MODEL`] for anything outside the catalog.
    pub fn resolve_model(&self, selection: &str) -> String {
        self.find_model(selection).unwrap_or_else(|| {
            tracing::warn!(selection, fallback = Self::FALLBACK_MODEL, "unknown model, using fallback");
            Self::FALLBACK_MODEL.to_string()
        })
    }

    pub fn default_model(&self) -> String {
        self.resolve_model(&self.model)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let models = [
            ("Gemini 1.5 Flash", "gemini-1.5-flash"),
            ("Gemini 1.5 Pro", "gemini-1.5-pro"),
            ("Gemini 2.0 Flash", "gemini-2.0-flash"),
        ]
        .into_iter()
        .map(|(name, id)| (name.to_string(), id.to_string()))
        .collect();

        Self {
            model: "Gemini 1.5 Flash".to_string(),
            models,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "embedding-001".to_string(),
            dimension: 768,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VectorStoreConfig {
    #[default]
    Memory,
    Qdrant { url: String, collection: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub directory: PathBuf,
    pub extension: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("txt_files"),
            extension: "txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub system: String,
    pub no_context: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            no_context: DEFAULT_NO_CONTEXT.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the file named by `DOCCHAT_CONFIG` (or the default path) and
    /// applies environment overrides.
    ///
    /// Also returns the file that was read. `None` means the default file was
    /// absent and built-in defaults were used. Runs before logging is
    /// installed, so the caller reports the source.
    pub fn load() -> Result<(Self, Option<PathBuf>), DomainError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    fn load_with(
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, Option<PathBuf>), DomainError> {
        let explicit = var(CONFIG_PATH_ENV);
        let path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));

        let (mut config, source) = match Self::from_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(DomainError::NotFound(_)) if explicit.is_none() => (Self::default(), None),
            Err(e) => return Err(e),
        };

        config.apply_env(var)?;
        Ok((config, source))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                DomainError::not_found(format!("config file {}", path.display()))
            }
            _ => DomainError::invalid_config(format!("{}: {e}", path.display())),
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(raw).map_err(|e| DomainError::invalid_config(e.to_string()))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), DomainError> {
        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| DomainError::invalid_config(format!("invalid SERVER_PORT '{port}'")))?;
        }
        if let Some(url) = var("QDRANT_URL") {
            let collection = match &self.vector_store {
                VectorStoreConfig::Qdrant { collection, .. } => collection.clone(),
                VectorStoreConfig::Memory => "doc_chat".to_string(),
            };
            self.vector_store = VectorStoreConfig::Qdrant { url, collection };
        }
        Ok(())
    }
}

/// Fails when the provider key is absent or blank.
pub fn require_api_key() -> Result<(), DomainError> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(DomainError::invalid_config(format!("{API_KEY_ENV} is not set"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_yaml_full() {
        let config = AppConfig::from_yaml(
            r#"
pipeline:
  chunk_size: 256
  chunk_overlap: 32
  top_k: 3
  temperature: 0.7
  log_path: logs/chat.log
llm:
  model: Pro
  models:
    Pro: gemini-1.5-pro
  timeout_seconds: 30
vector_store:
  kind: qdrant
  url: http://localhost:6334
  collection: docs
library:
  directory: corpus
"#,
        )
        .unwrap();

        assert_eq!(config.pipeline.chunk_size(), 256);
        assert_eq!(config.pipeline.top_k(), 3);
        assert_eq!(config.pipeline.log_path(), Path::new("logs/chat.log"));
        assert_eq!(config.llm.default_model(), "gemini-1.5-pro");
        assert_eq!(config.llm.timeout_seconds, 30);
        assert!(matches!(config.vector_store, VectorStoreConfig::Qdrant { ref collection, .. } if collection == "docs"));
        assert_eq!(config.library.directory, PathBuf::from("corpus"));
        assert_eq!(config.library.extension, "txt");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert!(matches!(config.vector_store, VectorStoreConfig::Memory));
        assert_eq!(config.prompts.system, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_invalid_pipeline_rejected() {
        let err = AppConfig::from_yaml("pipeline:\n  chunk_size: 10\n  chunk_overlap: 20\n")
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig(_)));
    }

    #[test]
    fn test_resolve_model() {
        let llm = LlmConfig::default();
        assert_eq!(llm.resolve_model("Gemini 1.5 Pro"), "gemini-1.5-pro");
        assert_eq!(llm.resolve_model("gemini-2.0-flash"), "gemini-2.0-flash");
        assert_eq!(llm.resolve_model("Gemini Ultra"), LlmConfig::FALLBACK_MODEL);
        assert_eq!(llm.find_model("Gemini 2.0 Flash").as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(llm.find_model("Gemini Ultra"), None);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "9000"),
            ("QDRANT_URL", "http://qdrant:6334"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert!(matches!(config.vector_store, VectorStoreConfig::Qdrant { ref url, .. } if url == "http://qdrant:6334"));
    }

    #[test]
    fn test_load_reports_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.yaml");
        std::fs::write(&path, "server:\n  port: 9100\n").unwrap();
        let explicit = path.display().to_string();

        let (config, source) = AppConfig::load_with(|k| {
            (k == CONFIG_PATH_ENV).then(|| explicit.clone())
        })
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(source, Some(path));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let err = AppConfig::load_with(|k| {
            (k == CONFIG_PATH_ENV).then(|| "/nonexistent/chat.yaml".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_shipped_default_config_loads() {
        let (config, source) = AppConfig::load_with(|_| None).unwrap();

        assert_eq!(source, Some(PathBuf::from(DEFAULT_CONFIG_PATH)));
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.llm.default_model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|k| (k == "SERVER_PORT").then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = AppConfig::from_file("/nonexistent/doc-chat.yaml").unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
