//! Append-only prompt log file.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use parley_core::context::{PromptLog, PromptRecord};
use parley_types::error::StoreError;

use crate::filesystem::ensure_parent;

/// Plain-text transcript, one rendered [`PromptRecord`] block per exchange.
#[derive(Debug)]
pub struct FilePromptLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePromptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

impl PromptLog for FilePromptLog {
    async fn append(&self, record: &PromptRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        ensure_parent(&self.path).await.map_err(io_error)?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_error)?;
        file.write_all(record.render().as_bytes())
            .await
            .map_err(io_error)?;
        file.flush().await.map_err(io_error)
    }

    async fn read(&self) -> Result<String, StoreError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(io_error(err)),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err)),
        }
    }
}
