//! One bus segment between two neighbouring contexts.
//!
//! Calls route to exactly one registered implementer and await one reply;
//! broadcasts fan out lossily to however many listeners currently exist.
//! A hop that implements nothing itself registers forwarding handlers that
//! relay calls verbatim onto the next segment (see `services::content`).

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use zknet_core::protocol::map::{BusEvent, CallRequest, CallReply, MessageName};
use zknet_core::{Result, ZknetError};

/// Listener queue depth. Broadcasts are advisory: a full queue drops.
const BROADCAST_QUEUE: usize = 16;

/// Implements one or more call names on a bus segment.
#[async_trait]
pub trait CallHandler: Send + Sync {
    async fn handle(&self, req: CallRequest) -> Result<CallReply>;
}

/// A single bus segment. Cheap to clone; all clones share the registry.
#[derive(Clone, Default)]
pub struct RelayBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    handlers: DashMap<MessageName, Arc<dyn CallHandler>>,
    listeners: DashMap<MessageName, Vec<mpsc::Sender<BusEvent>>>,
}

impl RelayBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the implementer for a call name (last registration wins).
    pub fn register(&self, name: MessageName, handler: Arc<dyn CallHandler>) {
        self.inner.handlers.insert(name, handler);
    }

    /// Route a call to its implementer and await the reply. Errors propagate
    /// to the caller; a reply whose shape does not answer the request is
    /// rejected at this boundary.
    pub async fn call(&self, req: CallRequest) -> Result<CallReply> {
        let name = req.name();
        let handler = self
            .inner
            .handlers
            .get(&name)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| ZknetError::NoListener(name.to_string()))?;

        let reply = handler.handle(req).await?;
        if reply.name() != name {
            return Err(ZknetError::BadMessage(format!(
                "reply shape {} does not answer {name}",
                reply.name()
            )));
        }
        Ok(reply)
    }

    /// Attach a listener for a broadcast name.
    pub fn subscribe(&self, name: MessageName) -> mpsc::Receiver<BusEvent> {
        let (tx, rx) = mpsc::channel(BROADCAST_QUEUE);
        self.inner.listeners.entry(name).or_default().push(tx);
        rx
    }

    /// Lossy fan-out. Zero listeners, a dropped receiver, or a full queue is
    /// not an error; the receiving context may simply not exist right now.
    pub fn broadcast(&self, ev: BusEvent) {
        let Some(mut entry) = self.inner.listeners.get_mut(&ev.name()) else {
            return;
        };
        entry.retain(|tx| !tx.is_closed());
        for tx in entry.iter() {
            let _ = tx.try_send(ev.clone());
        }
    }
}
