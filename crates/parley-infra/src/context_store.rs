//! JSON-file implementation of [`ContextStore`].
//!
//! The whole history is one document, `{"context": [[user, assistant], ...]}`.
//! Every write goes to a uniquely named sibling temp file that is then
//! persisted over the target, so readers see either the old or the new
//! document.
//!
//! Each parley invocation is its own process, so access is serialized with
//! an advisory lock on `context.json.lock` (shared for loads, exclusive for
//! read-modify-write). An in-process mutex keeps tasks of one process from
//! parking blocking threads on the same lock.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use parley_core::context::ContextStore;
use parley_types::conversation::{ConversationContext, Turn};
use parley_types::error::StoreError;

/// Context store backed by a JSON file.
///
/// Safe to share between tasks (behind an `Arc`) and between processes
/// pointing at the same file: concurrent appends never lose turns or break
/// the cap.
#[derive(Debug)]
pub struct JsonContextStore {
    path: PathBuf,
    cap: usize,
    lock: Mutex<()>,
}

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

impl JsonContextStore {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the advisory lock file next to the document.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "context.json".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Run `f` on a blocking thread while holding the file lock.
    async fn locked<T, F>(&self, mode: LockMode, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let lock_path = self.lock_path();
        tokio::task::spawn_blocking(move || {
            let lock = open_lock_file(&lock_path)?;
            match mode {
                LockMode::Shared => FileExt::lock_shared(&lock),
                LockMode::Exclusive => FileExt::lock_exclusive(&lock),
            }
            .map_err(io_error)?;
            let result = f(&path);
            if let Err(e) = FileExt::unlock(&lock) {
                tracing::debug!("Failed to unlock {}: {e}", lock_path.display());
            }
            result
        })
        .await
        .map_err(|e| StoreError::Io(format!("context store task failed: {e}")))?
    }
}

fn open_lock_file(path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(io_error)
}

fn read_document(path: &Path) -> ConversationContext {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return ConversationContext::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, starting empty", path.display());
            return ConversationContext::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(context) => context,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, starting empty", path.display());
            ConversationContext::default()
        }
    }
}

fn write_document(path: &Path, context: &ConversationContext) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(context)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error)?;
    tmp.write_all(json.as_bytes()).map_err(io_error)?;
    tmp.as_file().sync_all().map_err(io_error)?;
    // A failed persist drops the temp file, which removes it.
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

impl ContextStore for JsonContextStore {
    async fn load(&self) -> ConversationContext {
        let result = self
            .locked(LockMode::Shared, |path| Ok(read_document(path)))
            .await;
        result.unwrap_or_else(|e| {
            tracing::warn!("Failed to lock {}: {e}, starting empty", self.path.display());
            ConversationContext::default()
        })
    }

    async fn append(&self, turn: Turn) -> Result<(), StoreError> {
        let cap = self.cap;
        let turns = self
            .locked(LockMode::Exclusive, move |path| {
                let mut context = read_document(path);
                context.push_capped(turn, cap);
                write_document(path, &context)?;
                Ok(context.len())
            })
            .await?;
        tracing::debug!(turns, cap, "Context appended");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.locked(LockMode::Exclusive, |path| {
            write_document(path, &ConversationContext::default())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn turn(i: usize) -> Turn {
        Turn::new(format!("q{i}"), format!("a{i}"))
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonContextStore::new(dir.path().join("context.json"), 10);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("context.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = JsonContextStore::new(&path, 10);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_append_round_trips() {
        let dir = tempdir().unwrap();
        let store = JsonContextStore::new(dir.path().join("context.json"), 10);

        store.append(turn(0)).await.unwrap();
        store.append(turn(1)).await.unwrap();

        let reopened = JsonContextStore::new(dir.path().join("context.json"), 10);
        assert_eq!(reopened.load().await.turns(), &[turn(0), turn(1)]);
    }

    #[tokio::test]
    async fn test_cap_keeps_last_turns_in_order() {
        let dir = tempdir().unwrap();
        let store = JsonContextStore::new(dir.path().join("context.json"), 3);

        for i in 0..7 {
            store.append(turn(i)).await.unwrap();
            assert!(store.load().await.len() <= 3);
        }
        assert_eq!(store.load().await.turns(), &[turn(4), turn(5), turn(6)]);
    }

    #[tokio::test]
    async fn test_document_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("context.json");
        let store = JsonContextStore::new(&path, 10);
        store.append(Turn::new("hi", "hello")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(raw["context"][0][0]["role"], "user");
        assert_eq!(raw["context"][0][0]["content"], "hi");
        assert_eq!(raw["context"][0][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_writes_leave_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = JsonContextStore::new(dir.path().join("context.json"), 10);
        store.append(turn(0)).await.unwrap();
        store.clear().await.unwrap();
        store.append(turn(1)).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["context.json", "context.json.lock"]);
    }

    #[tokio::test]
    async fn test_clear_empties_history() {
        let dir = tempdir().unwrap();
        let store = JsonContextStore::new(dir.path().join("context.json"), 10);
        store.append(turn(0)).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let dir = tempdir().unwrap();
        let store = Arc::new(JsonContextStore::new(dir.path().join("context.json"), 100));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(turn(i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_separate_instances_on_one_file_lose_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("context.json");
        // Independent instances share nothing but the file, like two processes.
        let first = Arc::new(JsonContextStore::new(&path, 500));
        let second = Arc::new(JsonContextStore::new(&path, 500));

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = if i % 2 == 0 { first.clone() } else { second.clone() };
                tokio::spawn(async move { store.append(turn(i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let context = JsonContextStore::new(&path, 500).load().await;
        assert_eq!(context.len(), 100);
        let mut users: Vec<String> = context
            .turns()
            .iter()
            .map(|t| t.messages()[0].content.clone())
            .collect();
        users.sort();
        users.dedup();
        assert_eq!(users.len(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_separate_instances_respect_cap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("context.json");
        let first = Arc::new(JsonContextStore::new(&path, 5));
        let second = Arc::new(JsonContextStore::new(&path, 5));

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let store = if i % 2 == 0 { first.clone() } else { second.clone() };
                tokio::spawn(async move { store.append(turn(i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(first.load().await.len(), 5);
    }

    #[tokio::test]
    async fn test_creates_missing_data_dir() {
        let dir = tempdir().unwrap();
        let store = JsonContextStore::new(dir.path().join("nested").join("context.json"), 10);
        store.append(turn(0)).await.unwrap();
        assert_eq!(store.load().await.len(), 1);
    }
}
