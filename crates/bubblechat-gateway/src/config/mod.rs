//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use bubblechat_core::error::{ChatError, Result};

pub use schema::{ChatConfig, ChatSection, GatewaySection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "BUBBLECHAT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "bubblechat.yaml";

pub fn load_from_file(path: &str) -> Result<ChatConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ChatError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ChatConfig> {
    let cfg: ChatConfig = serde_yaml::from_str(s)
        .map_err(|e| ChatError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// `$BUBBLECHAT_CONFIG`, falling back to `bubblechat.yaml`.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
