//! Client configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Connection settings for the hosted backend.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure
/// in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted backend (e.g. `https://xyz.backend.example`).
    pub base_url: String,
    /// Publishable API key; identity itself is established by the backend.
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Top-level studypath configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudypathConfig {
    /// Hosted backend connection.
    pub backend: BackendConfig,
    /// Subject the backend authenticated; scopes every per-user query.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Retries for read queries (writes never retry).
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    /// Delay between read retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Poll interval of the score change feed in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Directory for the local quiz-config cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_read_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    500
}
fn default_poll_interval() -> u64 {
    2000
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("./.studypath-cache")
}

impl Default for StudypathConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: String::new(),
                api_key: String::new(),
                timeout_secs: default_timeout_secs(),
            },
            user_id: None,
            read_retries: default_read_retries(),
            retry_delay_ms: default_retry_delay(),
            poll_interval_ms: default_poll_interval(),
            cache_dir: default_cache_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studypath.toml` in the current directory
/// 2. `~/.config/studypath/config.toml`
///
/// Environment variable overrides: `STUDYPATH_API_KEY`, `STUDYPATH_BASE_URL`,
/// `STUDYPATH_USER_ID`.
pub fn load_config() -> Result<StudypathConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudypathConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("studypath.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<StudypathConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StudypathConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("STUDYPATH_API_KEY") {
        config.backend.api_key = key;
    }
    if let Ok(url) = std::env::var("STUDYPATH_BASE_URL") {
        config.backend.base_url = url;
    }
    if let Ok(user) = std::env::var("STUDYPATH_USER_ID") {
        config.user_id = Some(user);
    }

    // Resolve env vars referenced from the file
    config.backend.base_url = resolve_env_vars(&config.backend.base_url);
    config.backend.api_key = resolve_env_vars(&config.backend.api_key);
    if let Some(user) = &config.user_id {
        config.user_id = Some(resolve_env_vars(user));
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studypath"))
}
