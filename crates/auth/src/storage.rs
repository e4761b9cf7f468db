//! Durable storage for the persisted session blob.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;

/// A single durable key holding the serialized session.
///
/// Implementations are synchronous: the session store writes through before
/// a mutating call returns.
pub trait SessionStorage: Send + Sync {
    /// Read the stored blob, `None` when nothing was persisted.
    fn load(&self) -> anyhow::Result<Option<String>>;

    fn save(&self, blob: &str) -> anyhow::Result<()>;

    /// Remove the stored blob. Removing a missing blob is not an error.
    fn remove(&self) -> anyhow::Result<()>;
}

/// File-backed storage (one JSON document).
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/wms-client/session.json`, falling back to the working
    /// directory when the platform has no data dir.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wms-client")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> anyhow::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read session file at {:?}", self.path)),
        }
    }

    fn save(&self, blob: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session directory at {:?}", parent))?;
        }
        std::fs::write(&self.path, blob)
            .with_context(|| format!("failed to write session file at {:?}", self.path))
    }

    fn remove(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove session file at {:?}", self.path)),
        }
    }
}

/// In-memory storage. Clones share the same slot, which lets tests restore
/// a fresh store from "the same" durable location.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(blob.into()))),
        }
    }

    /// Current raw contents.
    pub fn blob(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self.blob())
    }

    fn save(&self, blob: &str) -> anyhow::Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(blob.to_string());
        Ok(())
    }

    fn remove(&self) -> anyhow::Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
