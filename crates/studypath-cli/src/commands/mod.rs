pub mod delete;
pub mod generate;
pub mod init;
pub mod pathway;
pub mod upload;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;

use studypath_client::config::StudypathConfig;
use studypath_client::{load_config_from, RestClient, StorageClient};

/// Load config and build the REST client with the configured retry policy.
pub fn connect(config_path: Option<&PathBuf>) -> Result<(StudypathConfig, RestClient)> {
    let config = load_config_from(config_path.map(PathBuf::as_path))?;
    anyhow::ensure!(
        !config.backend.base_url.is_empty(),
        "backend.base_url is not configured; run `studypath init` and edit studypath.toml"
    );
    tracing::debug!(base_url = %config.backend.base_url, "connecting to backend");
    let rest = RestClient::new(&config.backend).with_retries(
        config.read_retries,
        std::time::Duration::from_millis(config.retry_delay_ms),
    );
    Ok((config, rest))
}

/// Storage client for the configured backend.
pub fn storage(config: &StudypathConfig) -> StorageClient {
    StorageClient::new(&config.backend)
}

/// The user every per-user query is scoped to.
pub fn require_user(config: &StudypathConfig, flag: Option<String>) -> Result<String> {
    flag.or_else(|| config.user_id.clone()).ok_or_else(|| {
        anyhow::anyhow!("no user configured; set user_id in studypath.toml or pass --user")
    })
}
