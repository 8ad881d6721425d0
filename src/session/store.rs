use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use super::identity::Credential;
use crate::error::AuthError;

/// Keeps the signed-in credential on disk between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Option<Credential>, AuthError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::Storage(e.to_string())),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AuthError::Storage(format!("{}: {e}", self.path.display())))
    }

    pub async fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(credential)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}
