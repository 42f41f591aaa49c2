//! Canonical client state, owned by the background context.
//!
//! One `StateSync` per background lifetime. It adopts whole status snapshots
//! from the transport (initial `getStatus` on open, `status` notifications
//! after), clears them on close, recomputes the reduced [`ClientState`] after
//! every change, and republishes it over the relay bus. Surfaces that attach
//! late pull the cache synchronously instead.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use zknet_core::protocol::map::BusEvent;
use zknet_core::protocol::status::{ClientState, RemoteClientStatus};
use zknet_core::{Result, ZknetError};

use crate::relay::RelayBus;
use crate::transport::{RpcSocket, TransportEvent};

/// Pulls a fresh status snapshot from the remote process.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn get_status(&self) -> Result<RemoteClientStatus>;
}

#[async_trait]
impl StatusSource for RpcSocket {
    async fn get_status(&self) -> Result<RemoteClientStatus> {
        let value = self.call("getStatus", None).await?;
        serde_json::from_value(value)
            .map_err(|e| ZknetError::BadMessage(format!("invalid status payload: {e}")))
    }
}

#[derive(Default)]
struct SyncState {
    live: bool,
    status: Option<RemoteClientStatus>,
    derived: ClientState,
}

/// State synchronizer. Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct StateSync {
    inner: Arc<RwLock<SyncState>>,
    bus: RelayBus,
}

impl StateSync {
    pub fn new(bus: RelayBus) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SyncState::default())),
            bus,
        }
    }

    /// Current state from cache; no round-trip. `{false, false}` until the
    /// first snapshot arrives.
    pub fn client_state(&self) -> ClientState {
        self.inner.read().map(|s| s.derived).unwrap_or_default()
    }

    /// Walletshield listener from the current snapshot, if any.
    pub fn walletshield_listen_address(&self) -> Option<String> {
        self.inner
            .read()
            .ok()?
            .status
            .as_ref()
            .map(|s| s.settings.walletshield.listen_address.clone())
    }

    /// Drive the synchronizer from the transport event stream until it ends.
    pub async fn run(
        self,
        source: Arc<dyn StatusSource>,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        while let Some(ev) = events.recv().await {
            match ev {
                TransportEvent::Opened => {
                    self.update(|s| s.live = true);
                    match source.get_status().await {
                        Ok(status) => self.update(|s| s.status = Some(status)),
                        // not fatal: a status notification will catch us up
                        Err(e) => tracing::debug!(error = %e, "initial getStatus failed"),
                    }
                }
                TransportEvent::Closed => {
                    self.update(|s| {
                        s.live = false;
                        s.status = None;
                    });
                }
                TransportEvent::Notification { method, params } if method == "status" => {
                    match serde_json::from_value::<RemoteClientStatus>(
                        params.unwrap_or(Value::Null),
                    ) {
                        Ok(status) => self.update(|s| s.status = Some(status)),
                        Err(e) => tracing::warn!(error = %e, "invalid status notification dropped"),
                    }
                }
                TransportEvent::Notification { method, .. } => {
                    tracing::debug!(%method, "unhandled notification");
                }
            }
        }
    }

    /// Apply a change, recompute the reduction, republish. Broadcast losses
    /// are swallowed: the popup may simply not be open.
    fn update(&self, f: impl FnOnce(&mut SyncState)) {
        let derived = match self.inner.write() {
            Ok(mut s) => {
                f(&mut s);
                s.derived = ClientState::derive(s.live, s.status.as_ref());
                s.derived
            }
            Err(_) => return,
        };
        self.bus.broadcast(BusEvent::State(derived));
    }
}
