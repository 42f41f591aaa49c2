//! JSON-RPC 2.0 frame types (socket lane).
//!
//! Requests carry `{jsonrpc, method, params?, id}`; notifications are the
//! same minus `id`; replies carry either `result` or `error`. Incoming
//! frames are classified once and handed to the transport as typed values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ZknetError};

/// Protocol version tag on every frame.
pub const VERSION: &str = "2.0";

/// Outgoing request or notification frame.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl<'a> RpcRequest<'a> {
    /// A correlated call awaiting a reply.
    pub fn call(method: &'a str, params: Option<Value>, id: u64) -> Self {
        Self {
            jsonrpc: VERSION,
            method,
            params,
            id: Some(id),
        }
    }

    /// A fire-and-forget notification.
    pub fn notification(method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: VERSION,
            method,
            params,
            id: None,
        }
    }

    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ZknetError::Internal(format!("frame encode failed: {e}")))
    }
}

/// Remote-reported error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One classified incoming frame.
#[derive(Debug)]
pub enum Incoming {
    /// Correlated reply to one of our calls.
    Response {
        id: u64,
        outcome: std::result::Result<Value, RpcErrorObject>,
    },
    /// Server-initiated notification (no id).
    Notification {
        method: String,
        params: Option<Value>,
    },
}

/// Classify a raw text frame.
///
/// Malformed frames come back as `BadMessage` so the transport can log and
/// drop them without terminating the session.
pub fn classify(raw: &str) -> Result<Incoming> {
    let frame: Value =
        serde_json::from_str(raw).map_err(|e| ZknetError::BadMessage(format!("non-JSON frame: {e}")))?;
    let Some(obj) = frame.as_object() else {
        return Err(ZknetError::BadMessage("frame is not an object".into()));
    };

    if let Some(id) = obj.get("id") {
        let Some(id) = id.as_u64() else {
            return Err(ZknetError::BadMessage("non-numeric response id".into()));
        };
        if let Some(result) = obj.get("result") {
            return Ok(Incoming::Response {
                id,
                outcome: Ok(result.clone()),
            });
        }
        if let Some(error) = obj.get("error") {
            let err: RpcErrorObject = serde_json::from_value(error.clone())
                .map_err(|e| ZknetError::BadMessage(format!("malformed error body: {e}")))?;
            return Ok(Incoming::Response {
                id,
                outcome: Err(err),
            });
        }
        // server-initiated call (id plus method): we never answer these,
        // so it travels as a notification
        if let Some(method) = obj.get("method").and_then(Value::as_str) {
            return Ok(Incoming::Notification {
                method: method.to_owned(),
                params: obj.get("params").cloned(),
            });
        }
        return Err(ZknetError::BadMessage(
            "response carries neither result nor error".into(),
        ));
    }

    match obj.get("method").and_then(Value::as_str) {
        Some(method) => Ok(Incoming::Notification {
            method: method.to_owned(),
            params: obj.get("params").cloned(),
        }),
        None => Err(ZknetError::BadMessage("frame has neither id nor method".into())),
    }
}
