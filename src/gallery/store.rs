//! Durable gallery: the full session list in one backend slot.

use crate::error::{ModelShotError, Result};
use crate::gallery::backend::StorageBackend;
use crate::gallery::session::Session;

/// Slot name the gallery is stored under.
pub const GALLERY_KEY: &str = "image-agent-gallery";

/// Loads and saves the whole session list as one JSON array.
///
/// There are no partial writes: every save re-serializes everything, and
/// the last save wins.
pub struct GalleryStore {
    backend: Box<dyn StorageBackend>,
    key: String,
}

impl GalleryStore {
    /// Creates a store over `backend` using [`GALLERY_KEY`].
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            key: GALLERY_KEY.to_string(),
        }
    }

    /// Uses a different slot name.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Slot name in use.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the gallery, treating an absent or unreadable slot as empty.
    pub fn load(&self) -> Vec<Session> {
        match self.try_load() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(key = %self.key, "gallery load failed, starting empty: {e}");
                Vec::new()
            }
        }
    }

    /// Reads the gallery, reporting corruption as an error.
    pub fn try_load(&self) -> Result<Vec<Session>> {
        let Some(text) = self.backend.read(&self.key)? else {
            return Ok(Vec::new());
        };
        let sessions: Vec<Session> = serde_json::from_str(&text)
            .map_err(|e| ModelShotError::Persistence(format!("corrupt gallery: {e}")))?;
        tracing::debug!(key = %self.key, sessions = sessions.len(), "gallery loaded");
        Ok(sessions)
    }

    /// Overwrites the slot with `sessions`. Failures are logged and dropped;
    /// the caller's in-memory list stays authoritative.
    pub fn save(&self, sessions: &[Session]) {
        if let Err(e) = self.try_save(sessions) {
            tracing::warn!(
                key = %self.key,
                sessions = sessions.len(),
                "gallery save failed, change is not durable: {e}"
            );
        }
    }

    /// Overwrites the slot with `sessions`.
    pub fn try_save(&self, sessions: &[Session]) -> Result<()> {
        let text = serde_json::to_string(sessions)
            .map_err(|e| ModelShotError::Persistence(e.to_string()))?;
        self.backend.write(&self.key, &text)?;
        tracing::debug!(key = %self.key, sessions = sessions.len(), "gallery saved");
        Ok(())
    }
}
