use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::application::MAX_DOCUMENTS;
use crate::domain::{Document, DomainError};
use crate::infrastructure::config::LibraryConfig;

/// Text files in a local directory that users can pick from instead of
/// uploading.
#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    directory: PathBuf,
    extension: String,
}

impl DocumentLibrary {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(&config.directory, &config.extension)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File names with the library extension, sorted. A missing directory is
    /// an empty library.
    #[instrument(skip(self), fields(directory = %self.directory.display()))]
    pub async fn list(&self) -> Result<Vec<String>, DomainError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("library directory not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(DomainError::internal(e.to_string())),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?
        {
            let path = entry.path();
            let matches = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);

            if matches && is_file {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Reads the named files, in the order given. The selection size is
    /// checked before anything is read.
    #[instrument(skip(self))]
    pub async fn load(&self, names: &[String]) -> Result<Vec<Document>, DomainError> {
        if names.is_empty() || names.len() > MAX_DOCUMENTS {
            return Err(DomainError::invalid_input(format!(
                "select between 1 and {MAX_DOCUMENTS} documents, got {}",
                names.len()
            )));
        }

        let mut documents = Vec::with_capacity(names.len());

        for name in names {
            let path = self.resolve(name)?;
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    DomainError::not_found(format!("library document '{name}'"))
                }
                _ => DomainError::invalid_input(format!("cannot read '{name}': {e}")),
            })?;
            documents.push(Document::new(name.clone(), content));
        }

        Ok(documents)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, DomainError> {
        let file = Path::new(name);
        let plain = file.components().count() == 1
            && file.file_name().is_some_and(|n| n == file.as_os_str());
        if !plain {
            return Err(DomainError::invalid_input(format!(
                "'{name}' is not a plain file name"
            )));
        }
        Ok(self.directory.join(file))
    }
}
