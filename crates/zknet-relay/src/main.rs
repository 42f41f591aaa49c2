//! zknet-relay demo binary.
//!
//! Wires the transport, synchronizer, both bus segments, and the services
//! against a locally running client, then logs connectivity transitions.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use zknet_core::protocol::map::{BusEvent, MessageName};
use zknet_relay::services::{content, BackgroundService, ZknetPage};
use zknet_relay::state::StateSync;
use zknet_relay::transport::RpcSocket;
use zknet_relay::{config, relay::RelayBus};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_from_file("zknet.yaml").expect("config load failed");

    let (socket, events) = RpcSocket::new(cfg.client.socket_url(), cfg.transport.to_transport_config());
    let socket = Arc::new(socket);

    let ext_bus = RelayBus::new();
    let page_bus = RelayBus::new();

    let sync = StateSync::new(ext_bus.clone());
    Arc::new(BackgroundService::new(sync.clone(), cfg.client.host.clone())).install(&ext_bus);

    let (page, ready) = ZknetPage::new(page_bus.clone());
    content::wire(&page_bus, &ext_bus);
    ready.set();

    tokio::spawn(async move {
        page.ready().await;
        match page.client_state().await {
            Ok(s) => tracing::info!(
                available = s.is_available,
                connected = s.is_connected,
                "page surface attached"
            ),
            Err(e) => tracing::warn!(error = %e, "page surface query failed"),
        }
    });

    let mut state_rx = ext_bus.subscribe(MessageName::State);
    tokio::spawn(async move {
        while let Some(BusEvent::State(s)) = state_rx.recv().await {
            tracing::info!(
                available = s.is_available,
                connected = s.is_connected,
                "client state"
            );
        }
    });

    tracing::info!(url = %cfg.client.socket_url(), "zknet relay starting");
    socket.connect();
    sync.run(socket, events).await;
}
