//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`ParleyConfig`], then applies `PARLEY_*` environment overrides. Falls
//! back to defaults when the file is missing or malformed.

use std::path::Path;
use std::str::FromStr;

use secrecy::SecretString;

use parley_types::config::ParleyConfig;

use crate::filesystem::config_path;

/// Environment variable holding the completion API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Load configuration from `{data_dir}/config.toml` plus the process
/// environment.
///
/// - If the file does not exist, starts from [`ParleyConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   starts from the default.
pub async fn load_config(data_dir: &Path) -> ParleyConfig {
    let mut config = load_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn load_config_file(data_dir: &Path) -> ParleyConfig {
    let path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return ParleyConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ParleyConfig::default();
        }
    };

    match toml::from_str::<ParleyConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            ParleyConfig::default()
        }
    }
}

/// Apply `PARLEY_*` overrides looked up through `lookup`.
///
/// Values that fail to parse are skipped with a warning.
pub fn apply_env_overrides(config: &mut ParleyConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PARLEY_MODEL") {
        config.model = v;
    }
    if let Some(v) = lookup("PARLEY_LANGUAGE") {
        config.language = v;
    }
    if let Some(v) = lookup("PARLEY_API_BASE_URL") {
        config.api_base_url = v;
    }
    override_parsed(&lookup, "PARLEY_MAX_TOKENS", &mut config.max_tokens);
    override_parsed(&lookup, "PARLEY_TEMPERATURE", &mut config.temperature);
    override_parsed(
        &lookup,
        "PARLEY_PRIOR_CONVERSATION_SIZE",
        &mut config.prior_conversation_size,
    );
    override_parsed(
        &lookup,
        "PARLEY_CONTEXT_HISTORY_SIZE",
        &mut config.context_history_size,
    );
    override_parsed(&lookup, "PARLEY_CHUNK_SIZE", &mut config.chunk_size);
    override_parsed(
        &lookup,
        "PARLEY_MODEL_AUTO_SELECT",
        &mut config.model_auto_select,
    );
    override_parsed(
        &lookup,
        "PARLEY_TRANSLATE_USER_MESSAGE",
        &mut config.translate_user_message,
    );
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!(key, value = %raw, "Ignoring unparsable environment override"),
    }
}

/// Read the API key from `OPENAI_API_KEY`.
pub fn load_api_key() -> Option<SecretString> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}
