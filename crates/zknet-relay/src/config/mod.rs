//! Relay config loader (strict parsing).

pub mod schema;

use std::fs;

use zknet_core::{Result, ZknetError};

pub use schema::{ClientSection, RelayConfig, TransportSection};

pub fn load_from_file(path: &str) -> Result<RelayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ZknetError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    let cfg: RelayConfig = serde_yaml::from_str(s)
        .map_err(|e| ZknetError::BadMessage(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
