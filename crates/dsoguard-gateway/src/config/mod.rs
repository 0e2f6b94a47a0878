//! Gateway config loading.
//!
//! Parsing is strict (`deny_unknown_fields` throughout) and every load runs
//! `validate()` before the config is handed out.

pub mod schema;

use std::fs;

use dsoguard_core::error::{GuardError, Result};

pub use schema::{AuthSection, CatalogSection, GatewayConfig, GatewaySection, SessionSeed};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "DSOGUARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "dsoguard.yaml";

/// Config path from `DSOGUARD_CONFIG`, falling back to `dsoguard.yaml`.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let raw = fs::read_to_string(path)
        .map_err(|e| GuardError::Internal(format!("read config {path}: {e}")))?;
    load_from_str(&raw)
}

pub fn load_from_str(raw: &str) -> Result<GatewayConfig> {
    let cfg = serde_yaml::from_str::<GatewayConfig>(raw)
        .map_err(|e| GuardError::BadRequest(format!("config yaml: {e}")))?;
    cfg.validate()?;
    tracing::debug!(
        entities = cfg.catalog.entities.len(),
        sessions = cfg.auth.sessions.len(),
        "config validated"
    );
    Ok(cfg)
}
