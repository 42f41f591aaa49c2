//! Background fetch service tests, from guard failures to a proxied request.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use zknet_core::fetch_wire::{self, PackedFetchResponse};
use zknet_core::protocol::map::{CallRequest, FetchInit, FetchRequest};
use zknet_core::protocol::status::RemoteClientStatus;
use zknet_core::ErrorKind;
use zknet_relay::relay::RelayBus;
use zknet_relay::services::background::{extract_port, BackgroundService};
use zknet_relay::services::{content, ZknetPage};
use zknet_relay::state::{StateSync, StatusSource};
use zknet_relay::transport::TransportEvent;

#[test]
fn extract_port_accepts_client_listen_formats() {
    assert_eq!(extract_port(":7070"), Some(7070));
    assert_eq!(extract_port("127.0.0.1:7070"), Some(7070));
    assert_eq!(extract_port("localhost:8080/"), Some(8080));
    assert_eq!(extract_port(":7070/path"), Some(7070));
    assert_eq!(extract_port(":7070?q=1"), Some(7070));
    assert_eq!(extract_port(":7070#frag"), Some(7070));
    assert_eq!(extract_port(":80"), Some(80));
}

#[test]
fn extract_port_rejects_everything_else() {
    assert_eq!(extract_port(""), None);
    assert_eq!(extract_port("nonsense"), None);
    assert_eq!(extract_port(":"), None);
    assert_eq!(extract_port(":abc"), None);
    assert_eq!(extract_port(":70x70"), None);
    assert_eq!(extract_port(":123456"), None); // six digits
    assert_eq!(extract_port(":65536"), None); // past u16
}

fn snapshot(connected: bool, listen: &str) -> RemoteClientStatus {
    serde_json::from_value(json!({
        "app": { "version": "v1.2.0" },
        "network": { "isConnected": connected },
        "settings": { "walletshield": { "listenAddress": listen } }
    }))
    .unwrap()
}

struct FixedSource(RemoteClientStatus);

#[async_trait::async_trait]
impl StatusSource for FixedSource {
    async fn get_status(&self) -> zknet_core::Result<RemoteClientStatus> {
        Ok(self.0.clone())
    }
}

/// Background wiring with the synchronizer driven to the given snapshot.
/// Pass `None` to leave the transport closed.
async fn installed_service(status: Option<RemoteClientStatus>) -> (RelayBus, StateSync) {
    let bus = RelayBus::new();
    let sync = StateSync::new(bus.clone());
    Arc::new(BackgroundService::new(sync.clone(), "127.0.0.1")).install(&bus);

    if let Some(status) = status {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(sync.clone().run(Arc::new(FixedSource(status)), rx));
        tx.send(TransportEvent::Opened).unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !sync.client_state().is_available {
            assert!(tokio::time::Instant::now() < deadline, "sync never caught up");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
    (bus, sync)
}

fn fetch_call(input: &str) -> CallRequest {
    CallRequest::Fetch(FetchRequest {
        input: input.into(),
        init: None,
    })
}

async fn packed_failure_kind(bus: &RelayBus, input: &str) -> String {
    let reply = bus.call(fetch_call(input)).await.unwrap();
    match reply.into_fetch().unwrap() {
        PackedFetchResponse::Failure { kind, .. } => kind,
        other => panic!("expected a packed failure, got {other:?}"),
    }
}

#[tokio::test]
async fn get_state_before_any_status_is_all_false() {
    let (bus, _sync) = installed_service(None).await;
    let state = bus
        .call(CallRequest::GetState)
        .await
        .unwrap()
        .into_state()
        .unwrap();
    assert!(!state.is_available);
    assert!(!state.is_connected);
}

#[tokio::test]
async fn fetch_while_client_is_down_packs_client_not_running() {
    let (bus, _sync) = installed_service(None).await;
    assert_eq!(packed_failure_kind(&bus, "/balance").await, "CLIENT_NOT_RUNNING");
}

#[tokio::test]
async fn fetch_while_network_is_down_packs_network_not_connected() {
    let (bus, _sync) = installed_service(Some(snapshot(false, ":7070"))).await;
    assert_eq!(
        packed_failure_kind(&bus, "/balance").await,
        "NETWORK_NOT_CONNECTED"
    );
}

#[tokio::test]
async fn fetch_with_an_unparseable_listener_packs_bad_listen_address() {
    let (bus, _sync) = installed_service(Some(snapshot(true, "nonsense"))).await;
    assert_eq!(
        packed_failure_kind(&bus, "/balance").await,
        "BAD_LISTEN_ADDRESS"
    );
}

/// One-shot HTTP endpoint serving a canned JSON reply.
async fn start_http() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let body = r#"{"balance":42}"#;
                let resp = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

#[tokio::test]
async fn fetch_proxies_to_the_walletshield_listener() {
    let addr = start_http().await;
    let listen = format!(":{}", addr.port());
    let (bus, _sync) = installed_service(Some(snapshot(true, &listen))).await;

    let reply = bus.call(fetch_call("/balance")).await.unwrap();
    let res = fetch_wire::unpack(reply.into_fetch().unwrap()).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.status_text, "OK");
    assert_eq!(res.content_type(), Some("application/json"));
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&res.body).unwrap(),
        json!({"balance": 42})
    );
}

#[tokio::test]
async fn page_surface_sees_rebuilt_errors_and_responses() {
    let addr = start_http().await;
    let listen = format!(":{}", addr.port());
    let (ext, _sync) = installed_service(Some(snapshot(true, &listen))).await;
    let page_bus = RelayBus::new();
    content::wire(&page_bus, &ext);

    let (page, flag) = ZknetPage::new(page_bus);
    assert!(!page.is_ready());
    flag.set();
    page.ready().await;
    assert!(page.is_ready());

    let state = page.client_state().await.unwrap();
    assert!(state.is_available && state.is_connected);

    let res = page
        .fetch(FetchRequest {
            // a leading slash is optional
            input: "balance".into(),
            init: Some(FetchInit {
                method: Some("GET".into()),
                ..FetchInit::default()
            }),
        })
        .await
        .unwrap();
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn page_fetch_failure_rebuilds_the_original_error() {
    let (ext, _sync) = installed_service(None).await;
    let page_bus = RelayBus::new();
    content::wire(&page_bus, &ext);
    let (page, flag) = ZknetPage::new(page_bus);
    flag.set();

    let err = page
        .fetch(FetchRequest {
            input: "/balance".into(),
            init: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientNotRunning);
}
