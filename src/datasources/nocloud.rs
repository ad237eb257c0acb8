//! NoCloud datasource
//!
//! Reads metadata, user data and network config from the seed volume
//! mounted at boot (by default `/mnt/lima-cidata`).

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::Document;
use crate::RdInitError;

/// NoCloud datasource for local file-based configuration
#[derive(Debug, Clone)]
pub struct NoCloud {
    seed_dir: PathBuf,
}

impl NoCloud {
    pub fn new(seed_dir: impl AsRef<Path>) -> Self {
        Self {
            seed_dir: seed_dir.as_ref().to_path_buf(),
        }
    }

    /// Location of a document on the seed volume
    pub fn path(&self, document: Document) -> PathBuf {
        self.seed_dir.join(document.file_name())
    }

    /// Read a document as text
    pub async fn read(&self, document: Document) -> Result<String, RdInitError> {
        let path = self.path(document);
        debug!("Reading {} from {}", document, path.display());

        fs::read_to_string(&path)
            .await
            .map_err(|source| RdInitError::Read { path, source })
    }

    /// Read and deserialize a YAML document
    pub async fn load<T: DeserializeOwned>(&self, document: Document) -> Result<T, RdInitError> {
        let content = self.read(document).await?;
        parse_yaml(document, &content)
    }
}

/// Deserialize YAML, tagging failures with the document they came from
pub fn parse_yaml<T: DeserializeOwned>(
    document: Document,
    content: &str,
) -> Result<T, RdInitError> {
    serde_yaml::from_str(content).map_err(|source| RdInitError::Parse {
        document: document.to_string(),
        source,
    })
}
