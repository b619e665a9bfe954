//! Data directory layout.
//!
//! ```text
//! {data_dir}/
//!   config.toml   optional settings
//!   context.json  persisted conversation history
//!   context.json.lock  advisory lock shared by every parley process
//!   prompt.log    append-only transcript
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    // Last resort: current directory
    PathBuf::from(".parley")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

pub fn context_path(data_dir: &Path) -> PathBuf {
    data_dir.join("context.json")
}

pub fn prompt_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("prompt.log")
}

/// Create `path`'s parent directory if it is missing.
pub(crate) async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let root = Path::new("/data");
        assert_eq!(config_path(root), PathBuf::from("/data/config.toml"));
        assert_eq!(context_path(root), PathBuf::from("/data/context.json"));
        assert_eq!(prompt_log_path(root), PathBuf::from("/data/prompt.log"));
    }

    #[tokio::test]
    async fn test_ensure_parent_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a").join("b").join("context.json");
        ensure_parent(&file).await.unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
    }
}
