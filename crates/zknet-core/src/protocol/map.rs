//! The closed relay protocol map.
//!
//! Every message crossing a context boundary is one of these names with a
//! fixed request and reply shape, known to both ends at build time. There is
//! no runtime type negotiation: an unknown shape is rejected at the boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZknetError};
use crate::fetch_wire::PackedFetchResponse;
use crate::protocol::status::ClientState;

/// Registry of relay message names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageName {
    /// `zknet.fetch` — proxy an HTTP request through the local client.
    Fetch,
    /// `zknet.client.getState` — pull the cached client state.
    GetState,
    /// `zknet.client.state` — state broadcast, no reply.
    State,
}

impl MessageName {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageName::Fetch => "zknet.fetch",
            MessageName::GetState => "zknet.client.getState",
            MessageName::State => "zknet.client.state",
        }
    }
}

impl fmt::Display for MessageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable projection of a fetch `init` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchInit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// `zknet.fetch` request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchRequest {
    /// Path or URL, resolved against the client's walletshield listener.
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<FetchInit>,
}

/// A call crossing the bus (awaits exactly one reply).
#[derive(Debug, Clone)]
pub enum CallRequest {
    Fetch(FetchRequest),
    GetState,
}

impl CallRequest {
    pub fn name(&self) -> MessageName {
        match self {
            CallRequest::Fetch(_) => MessageName::Fetch,
            CallRequest::GetState => MessageName::GetState,
        }
    }
}

/// The reply to a call, shape fixed per name.
#[derive(Debug, Clone)]
pub enum CallReply {
    Fetch(PackedFetchResponse),
    State(ClientState),
}

impl CallReply {
    /// The call name this reply answers.
    pub fn name(&self) -> MessageName {
        match self {
            CallReply::Fetch(_) => MessageName::Fetch,
            CallReply::State(_) => MessageName::GetState,
        }
    }

    pub fn into_fetch(self) -> Result<PackedFetchResponse> {
        match self {
            CallReply::Fetch(p) => Ok(p),
            other => Err(ZknetError::BadMessage(format!(
                "expected a fetch reply, got {}",
                other.name()
            ))),
        }
    }

    pub fn into_state(self) -> Result<ClientState> {
        match self {
            CallReply::State(s) => Ok(s),
            other => Err(ZknetError::BadMessage(format!(
                "expected a state reply, got {}",
                other.name()
            ))),
        }
    }
}

/// A broadcast event (fire to zero-or-more listeners, no reply).
#[derive(Debug, Clone)]
pub enum BusEvent {
    State(ClientState),
}

impl BusEvent {
    pub fn name(&self) -> MessageName {
        match self {
            BusEvent::State(_) => MessageName::State,
        }
    }
}
