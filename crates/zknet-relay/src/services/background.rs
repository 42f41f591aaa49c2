//! Background-context handlers: the fetch executor and the state query.
//!
//! `zknet.fetch` proxies an HTTP request to the client's walletshield
//! listener. Every outcome crosses the relay packed — failures included —
//! so the bus never sees a thrown fetch error.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use zknet_core::fetch_wire::{self, HttpResponse};
use zknet_core::protocol::map::{CallReply, CallRequest, FetchRequest, MessageName};
use zknet_core::{Result, ZknetError};

use crate::relay::{CallHandler, RelayBus};
use crate::state::StateSync;

pub struct BackgroundService {
    sync: StateSync,
    http: Client,
    /// Host the client process listens on; the port comes from its status.
    client_host: String,
}

impl BackgroundService {
    pub fn new(sync: StateSync, client_host: impl Into<String>) -> Self {
        Self {
            sync,
            http: Client::new(),
            client_host: client_host.into(),
        }
    }

    /// Register both background call names on the extension bus.
    pub fn install(self: Arc<Self>, bus: &RelayBus) {
        bus.register(MessageName::Fetch, Arc::clone(&self) as Arc<dyn CallHandler>);
        bus.register(MessageName::GetState, self);
    }

    async fn fetch(&self, req: &FetchRequest) -> Result<HttpResponse> {
        let state = self.sync.client_state();
        if !state.is_available {
            return Err(ZknetError::ClientNotRunning);
        }
        if !state.is_connected {
            return Err(ZknetError::NetworkNotConnected);
        }

        let listen = self
            .sync
            .walletshield_listen_address()
            .ok_or(ZknetError::ClientNotRunning)?;
        let port =
            extract_port(&listen).ok_or_else(|| ZknetError::BadListenAddress(listen.clone()))?;

        let input = req.input.as_str();
        let url = format!(
            "http://{}:{}{}{}",
            self.client_host,
            port,
            if input.starts_with('/') { "" } else { "/" },
            input
        );

        let init = req.init.clone().unwrap_or_default();
        let method = reqwest::Method::from_bytes(
            init.method.as_deref().unwrap_or("GET").as_bytes(),
        )
        .map_err(|e| ZknetError::Fetch(format!("invalid method: {e}")))?;

        let mut outgoing = self.http.request(method, &url);
        for (k, v) in &init.headers {
            outgoing = outgoing.header(k, v);
        }
        if let Some(body) = init.body {
            outgoing = outgoing.body(body);
        }

        let res = outgoing
            .send()
            .await
            .map_err(|e| ZknetError::Fetch(e.to_string()))?;

        let status = res.status();
        let mut headers = BTreeMap::new();
        for (name, value) in res.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_owned(), v.to_owned());
            }
        }
        let body = res
            .bytes()
            .await
            .map_err(|e| ZknetError::Fetch(e.to_string()))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_owned(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl CallHandler for BackgroundService {
    async fn handle(&self, req: CallRequest) -> Result<CallReply> {
        match req {
            CallRequest::Fetch(freq) => {
                let packed = match self.fetch(&freq).await {
                    Ok(res) => fetch_wire::pack(&res),
                    Err(err) => fetch_wire::pack_err(&err),
                };
                Ok(CallReply::Fetch(packed))
            }
            CallRequest::GetState => Ok(CallReply::State(self.sync.client_state())),
        }
    }
}

/// Port digits after the last `:`, terminated by end of string or `/ ? #`.
/// Mirrors how the client formats `listenAddress` (`":7070"`,
/// `"127.0.0.1:7070"`, optionally with a trailing path).
pub fn extract_port(listen: &str) -> Option<u16> {
    let idx = listen.rfind(':')?;
    let rest = &listen[idx + 1..];

    let digits = match rest.find(|c: char| !c.is_ascii_digit()) {
        Some(0) => return None,
        Some(end) => {
            let (digits, tail) = rest.split_at(end);
            if !matches!(tail.chars().next(), Some('/' | '?' | '#')) {
                return None;
            }
            digits
        }
        None if rest.is_empty() => return None,
        None => rest,
    };

    if digits.len() > 5 {
        return None;
    }
    digits.parse().ok()
}
