//! Storage capabilities
//!
//! The engine never touches storage. The [`Speech`](crate::speech::Speech)
//! collaborator writes through these minimal capabilities instead, so
//! filesystem, in-memory and object-store backends all plug in the same
//! way.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::io::AsyncWriteExt;

use crate::error::SpeechError;

/// Write-side capability: a sink for one named file.
#[async_trait]
pub trait WriteBroker: Send {
    async fn write(&mut self, data: &[u8]) -> Result<(), SpeechError>;

    /// Flushes and finalizes the file. Call exactly once, after the last
    /// write.
    async fn close(&mut self) -> Result<(), SpeechError>;
}

/// Read-side capability: resolves a stored file to a retrievable URL.
#[async_trait]
pub trait ReadBroker: Send {
    async fn url(&self) -> Result<String, SpeechError>;
}

/// A named-file store handing out brokers.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn writer(&self, name: &str) -> Result<Box<dyn WriteBroker>, SpeechError>;

    async fn reader(&self, name: &str) -> Result<Box<dyn ReadBroker>, SpeechError>;

    /// Whether `name` is already stored. Errors count as absent.
    async fn exists(&self, name: &str) -> bool;
}

/// Folder-rooted filesystem store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    folder: PathBuf,
}

impl LocalStorage {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.folder.join(name)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn writer(&self, name: &str) -> Result<Box<dyn WriteBroker>, SpeechError> {
        tokio::fs::create_dir_all(&self.folder).await?;
        let file = tokio::fs::File::create(self.path_of(name)).await?;
        Ok(Box::new(LocalWriteBroker { file }))
    }

    async fn reader(&self, name: &str) -> Result<Box<dyn ReadBroker>, SpeechError> {
        Ok(Box::new(LocalReadBroker {
            name: name.to_string(),
            path: self.path_of(name),
        }))
    }

    async fn exists(&self, name: &str) -> bool {
        tokio::fs::try_exists(self.path_of(name)).await.unwrap_or(false)
    }
}

struct LocalWriteBroker {
    file: tokio::fs::File,
}

#[async_trait]
impl WriteBroker for LocalWriteBroker {
    async fn write(&mut self, data: &[u8]) -> Result<(), SpeechError> {
        self.file.write_all(data).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SpeechError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(())
    }
}

struct LocalReadBroker {
    name: String,
    path: PathBuf,
}

#[async_trait]
impl ReadBroker for LocalReadBroker {
    async fn url(&self) -> Result<String, SpeechError> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(SpeechError::NotFound(self.name.clone()));
        }
        Ok(format!("file://{}", absolute(&self.path).display()))
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// In-memory store, shared between clones. Used by tests and as a cache
/// for callers that never persist audio.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a stored file, if present.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.read().get(name).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn writer(&self, name: &str) -> Result<Box<dyn WriteBroker>, SpeechError> {
        Ok(Box::new(MemoryWriteBroker {
            name: name.to_string(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }

    async fn reader(&self, name: &str) -> Result<Box<dyn ReadBroker>, SpeechError> {
        Ok(Box::new(MemoryReadBroker {
            name: name.to_string(),
            files: Arc::clone(&self.files),
        }))
    }

    async fn exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }
}

struct MemoryWriteBroker {
    name: String,
    buffer: Vec<u8>,
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

#[async_trait]
impl WriteBroker for MemoryWriteBroker {
    async fn write(&mut self, data: &[u8]) -> Result<(), SpeechError> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SpeechError> {
        let buffer = std::mem::take(&mut self.buffer);
        self.files.write().insert(self.name.clone(), buffer);
        Ok(())
    }
}

struct MemoryReadBroker {
    name: String,
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

#[async_trait]
impl ReadBroker for MemoryReadBroker {
    async fn url(&self) -> Result<String, SpeechError> {
        if !self.files.read().contains_key(&self.name) {
            return Err(SpeechError::NotFound(self.name.clone()));
        }
        Ok(format!("memory://{}", self.name))
    }
}
