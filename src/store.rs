//! Persistent map of the last session id per vendor.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::vendor::VendorKind;

/// File name inside the data directory.
const STORE_FILE: &str = "sessions.json";

/// Error type for session store operations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The platform has no data directory.
    #[error("No data directory available")]
    NoDataDir,
    /// Failed to read or write the store file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The store file is not valid JSON.
    #[error("Invalid session store: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Session ids keyed by vendor, backed by a JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    sessions: BTreeMap<VendorKind, String>,
}

impl SessionStore {
    /// `<data_dir>/agent-bridge/sessions.json`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoDataDir` if the platform has no data directory.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        dirs::data_dir()
            .map(|dir| dir.join("agent-bridge").join(STORE_FILE))
            .ok_or(StoreError::NoDataDir)
    }

    /// Load the store from its default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the location is unknown or the file is unreadable.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::load(Self::default_path()?)
    }

    /// Load a store from a file.
    ///
    /// If the file doesn't exist, returns an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                sessions: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let sessions = if content.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&content)?
        };
        tracing::debug!(path = %path.display(), "Loaded session store");
        Ok(Self { path, sessions })
    }

    /// Save the store atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(&self.sessions)?;
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), "Saved session store");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, vendor: VendorKind) -> Option<&str> {
        self.sessions.get(&vendor).map(String::as_str)
    }

    /// Record the session id for a vendor. Empty ids are ignored.
    pub fn set(&mut self, vendor: VendorKind, session_id: impl Into<String>) {
        let session_id = session_id.into();
        if !session_id.is_empty() {
            self.sessions.insert(vendor, session_id);
        }
    }

    pub fn remove(&mut self, vendor: VendorKind) -> Option<String> {
        self.sessions.remove(&vendor)
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Stored sessions in vendor order.
    pub fn iter(&self) -> impl Iterator<Item = (VendorKind, &str)> {
        self.sessions
            .iter()
            .map(|(vendor, id)| (*vendor, id.as_str()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
