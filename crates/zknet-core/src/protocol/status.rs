//! Remote client status snapshots and the derived client state.

use serde::{Deserialize, Serialize};

/// Status snapshot produced by the remote client process.
///
/// Received whole via `getStatus` results and `status` notifications and
/// replaced wholesale each time; never merged field-by-field. Field names
/// follow the remote's camelCase wire format; the schema is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteClientStatus {
    pub app: AppInfo,
    pub network: NetworkInfo,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppInfo {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkInfo {
    #[serde(rename = "isConnected")]
    pub is_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub walletshield: WalletshieldSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletshieldSettings {
    #[serde(rename = "listenAddress")]
    pub listen_address: String,
}

/// Reduced projection broadcast to UI surfaces.
///
/// `is_available` requires both an open transport and at least one status
/// snapshot since the last disconnect; `is_connected` mirrors the snapshot
/// and defaults to false when none is held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientState {
    #[serde(rename = "isAvailable")]
    pub is_available: bool,
    #[serde(rename = "isConnected")]
    pub is_connected: bool,
}

impl ClientState {
    /// The reduction rule applied after every transport event.
    pub fn derive(live: bool, status: Option<&RemoteClientStatus>) -> Self {
        Self {
            is_available: live && status.is_some(),
            is_connected: status.map(|s| s.network.is_connected).unwrap_or(false),
        }
    }
}
