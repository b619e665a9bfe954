//! Reading command input from arguments, files or stdin.

use std::path::Path;

use anyhow::Context;
use tokio::io::AsyncReadExt;

/// The argument text, or stdin when it is missing or `-`.
pub async fn text_or_stdin(arg: Option<String>) -> anyhow::Result<String> {
    match arg {
        Some(text) if text != "-" => Ok(text),
        _ => read_stdin().await,
    }
}

/// The contents of the file at `arg`, or stdin when it is missing or `-`.
pub async fn file_or_stdin(arg: Option<String>) -> anyhow::Result<String> {
    match arg {
        Some(path) if path != "-" => read_file(Path::new(&path)).await,
        _ => read_stdin().await,
    }
}

async fn read_file(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("failed to read stdin")?;
    Ok(buf)
}
