//! Persistence collaborator: opaque fallible save/load of the form document,
//! plus conversions between the stored document shape and the typed survey
//! state.

pub mod document;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No saved document found at {path}")]
    Missing { path: String },
}

/// Opaque async save/load. The core treats both calls as fallible black
/// boxes; durability is the implementation's concern.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Persist the document, returning a storage identifier.
    async fn save(&self, document: &Value) -> Result<String, PersistError>;

    /// Load a previously saved document by identifier.
    async fn load(&self, id: &str) -> Result<Value, PersistError>;
}

/// Single-document JSON file store, the moral equivalent of the original's
/// local-storage slot: `save` overwrites the file and `load` ignores the
/// identifier.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl Persistence for FilePersistence {
    async fn save(&self, document: &Value) -> Result<String, PersistError> {
        let bytes = serde_json::to_vec_pretty(document)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, bytes).await?;
        let id = format!("SESSION-{}", Utc::now().timestamp_millis());
        info!(path = %self.path.display(), id = %id, "form document saved");
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Value, PersistError> {
        debug!(path = %self.path.display(), id, "loading form document");
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistError::Missing {
                    path: self.path.display().to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}
