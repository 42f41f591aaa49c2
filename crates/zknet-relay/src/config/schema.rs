use std::time::Duration;

use serde::Deserialize;

use zknet_core::{Result, ZknetError};

use crate::transport::TransportConfig;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub transport: TransportSection,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ZknetError::BadMessage("unsupported config version".into()));
        }
        self.transport.validate()
    }
}

/// Where the local client process listens for RPC.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ClientSection {
    pub fn socket_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    7071
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSection {
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    #[serde(default = "default_backoff_floor_ms")]
    pub backoff_floor_ms: u64,

    #[serde(default = "default_backoff_ceiling_ms")]
    pub backoff_ceiling_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            backoff_floor_ms: default_backoff_floor_ms(),
            backoff_ceiling_ms: default_backoff_ceiling_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl TransportSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=120000).contains(&self.call_timeout_ms) {
            return Err(ZknetError::BadMessage(
                "transport.call_timeout_ms must be between 1000 and 120000".into(),
            ));
        }
        if self.backoff_floor_ms < 100 {
            return Err(ZknetError::BadMessage(
                "transport.backoff_floor_ms must be at least 100".into(),
            ));
        }
        if self.backoff_ceiling_ms < self.backoff_floor_ms {
            return Err(ZknetError::BadMessage(
                "transport.backoff_ceiling_ms must not be below the floor".into(),
            ));
        }
        if self.backoff_factor <= 1.0 {
            return Err(ZknetError::BadMessage(
                "transport.backoff_factor must be greater than 1.0".into(),
            ));
        }
        Ok(())
    }

    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            call_timeout: Duration::from_millis(self.call_timeout_ms),
            backoff_floor: Duration::from_millis(self.backoff_floor_ms),
            backoff_ceiling: Duration::from_millis(self.backoff_ceiling_ms),
            backoff_factor: self.backoff_factor,
        }
    }
}

fn default_call_timeout_ms() -> u64 {
    10000
}
fn default_backoff_floor_ms() -> u64 {
    1000
}
fn default_backoff_ceiling_ms() -> u64 {
    30000
}
fn default_backoff_factor() -> f64 {
    1.5
}
