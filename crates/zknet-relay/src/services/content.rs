//! Content hop: the relay between the page segment and the extension
//! segment.
//!
//! The hop implements nothing itself. Calls it receives are forwarded
//! verbatim to the extension bus and whatever comes back — reply or error —
//! is returned unchanged. State broadcasts are pumped the other way.

use std::sync::Arc;

use async_trait::async_trait;

use zknet_core::protocol::map::{CallRequest, CallReply, MessageName};
use zknet_core::Result;

use crate::relay::{CallHandler, RelayBus};

struct Forward {
    next: RelayBus,
}

#[async_trait]
impl CallHandler for Forward {
    async fn handle(&self, req: CallRequest) -> Result<CallReply> {
        self.next.call(req).await
    }
}

/// Wire the page bus to the extension bus. Spawns the broadcast pump.
pub fn wire(page: &RelayBus, ext: &RelayBus) {
    let fwd: Arc<dyn CallHandler> = Arc::new(Forward { next: ext.clone() });
    page.register(MessageName::Fetch, Arc::clone(&fwd));
    page.register(MessageName::GetState, fwd);

    let mut rx = ext.subscribe(MessageName::State);
    let page = page.clone();
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            page.broadcast(ev);
        }
    });
}
