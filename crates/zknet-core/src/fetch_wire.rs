//! (De)serialization of fetch outcomes for relay between isolated contexts.
//!
//! A live HTTP response cannot cross a structured-clone boundary, so the
//! background context packs it into plain data and the page side rebuilds an
//! equivalent response. Packing borrows: the caller's response stays usable.
//!
//! Body classification is lossy on purpose. `application/json` packs as a
//! parsed JSON value, `text/*` as a string, and everything else collapses to
//! raw bytes. `unpack(pack(r))` reproduces status, status text, header set,
//! and body content for all three kinds.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ZknetError};

const CONTENT_TYPE: &str = "content-type";

/// Owned HTTP-style response crossing the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    /// Header names kept as received; lookup is case-insensitive.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }
}

/// Body classification tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Json,
    Text,
    Binary,
}

/// Packed body payload, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackedBody {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl PackedBody {
    pub fn kind(&self) -> BodyKind {
        match self {
            PackedBody::Json(_) => BodyKind::Json,
            PackedBody::Text(_) => BodyKind::Text,
            PackedBody::Binary(_) => BodyKind::Binary,
        }
    }
}

/// Transmissible fetch outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum PackedFetchResponse {
    Success {
        status: u16,
        #[serde(rename = "statusText")]
        status_text: String,
        headers: BTreeMap<String, String>,
        body: PackedBody,
    },
    Failure {
        kind: String,
        message: String,
    },
}

/// Pack a response. Borrows only; the caller keeps the original.
pub fn pack(res: &HttpResponse) -> PackedFetchResponse {
    let ct = res.content_type().unwrap_or("");

    let body = if ct.contains("application/json") {
        match serde_json::from_slice::<Value>(&res.body) {
            Ok(v) => PackedBody::Json(v),
            // mislabelled payload degrades to binary rather than failing
            Err(_) => PackedBody::Binary(res.body.to_vec()),
        }
    } else if ct.starts_with("text/") {
        match std::str::from_utf8(&res.body) {
            Ok(s) => PackedBody::Text(s.to_owned()),
            Err(_) => PackedBody::Binary(res.body.to_vec()),
        }
    } else {
        PackedBody::Binary(res.body.to_vec())
    };

    PackedFetchResponse::Success {
        status: res.status,
        status_text: res.status_text.clone(),
        headers: res.headers.clone(),
        body,
    }
}

/// Pack an error using its stable kind tag.
pub fn pack_err(err: &ZknetError) -> PackedFetchResponse {
    PackedFetchResponse::Failure {
        kind: err.kind().as_str().to_owned(),
        message: err.message(),
    }
}

/// Rebuild a response, or the originating error for packed failures.
///
/// Failures rebuild through the closed [`crate::ErrorKind`] mapping; an
/// unknown tag degrades to a generic error that still carries the message.
pub fn unpack(packed: PackedFetchResponse) -> Result<HttpResponse> {
    match packed {
        PackedFetchResponse::Failure { kind, message } => Err(ZknetError::from_tag(&kind, &message)),
        PackedFetchResponse::Success {
            status,
            status_text,
            mut headers,
            body,
        } => {
            let kind = body.kind();
            let bytes = match body {
                PackedBody::Json(v) => Bytes::from(
                    serde_json::to_vec(&v)
                        .map_err(|e| ZknetError::Internal(format!("body encode failed: {e}")))?,
                ),
                PackedBody::Text(s) => Bytes::from(s.into_bytes()),
                PackedBody::Binary(b) => Bytes::from(b),
            };

            // json/text only ever classify when the header was present, so
            // synthesis never disturbs a round-tripped header set; binary
            // stays untagged for the same reason.
            let has_ct = headers.keys().any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE));
            if !has_ct {
                match kind {
                    BodyKind::Json => {
                        headers.insert(CONTENT_TYPE.to_owned(), "application/json".to_owned());
                    }
                    BodyKind::Text => {
                        headers.insert(CONTENT_TYPE.to_owned(), "text/plain".to_owned());
                    }
                    BodyKind::Binary => {}
                }
            }

            Ok(HttpResponse {
                status,
                status_text,
                headers,
                body: bytes,
            })
        }
    }
}
