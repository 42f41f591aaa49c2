//! Page-facing surface: native-shaped fetch and state queries over the bus.

use tokio::sync::watch;

use zknet_core::fetch_wire::{self, HttpResponse};
use zknet_core::protocol::map::{CallRequest, FetchRequest};
use zknet_core::protocol::status::ClientState;
use zknet_core::Result;

use crate::relay::RelayBus;

/// The object handed to page code.
pub struct ZknetPage {
    bus: RelayBus,
    ready: watch::Receiver<bool>,
}

/// Readiness signal held by whoever finishes the bridging setup.
pub struct ReadyFlag(watch::Sender<bool>);

impl ReadyFlag {
    /// Signal once; flips the flag and wakes everyone parked in `ready()`.
    pub fn set(&self) {
        let _ = self.0.send(true);
    }
}

impl ZknetPage {
    pub fn new(bus: RelayBus) -> (Self, ReadyFlag) {
        let (tx, rx) = watch::channel(false);
        (Self { bus, ready: rx }, ReadyFlag(tx))
    }

    /// Poll the readiness flag, for callers that started before the signal.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once the bridging layer finished wiring; immediately if that
    /// already happened.
    pub async fn ready(&self) {
        let mut rx = self.ready.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Fetch through the relay. A packed failure becomes the rebuilt error.
    pub async fn fetch(&self, req: FetchRequest) -> Result<HttpResponse> {
        let reply = self.bus.call(CallRequest::Fetch(req)).await?;
        fetch_wire::unpack(reply.into_fetch()?)
    }

    /// Current client state, answered from the background cache.
    pub async fn client_state(&self) -> Result<ClientState> {
        self.bus.call(CallRequest::GetState).await?.into_state()
    }
}
