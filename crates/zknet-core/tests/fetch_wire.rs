//! Fetch wire codec round-trip tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{json, Value};

use zknet_core::fetch_wire::{pack, pack_err, unpack, HttpResponse, PackedBody, PackedFetchResponse};
use zknet_core::{ErrorKind, ZknetError};

fn response(content_type: Option<&str>, body: &[u8]) -> HttpResponse {
    let mut headers = BTreeMap::new();
    headers.insert("x-request-id".to_owned(), "abc123".to_owned());
    if let Some(ct) = content_type {
        headers.insert("content-type".to_owned(), ct.to_owned());
    }
    HttpResponse {
        status: 200,
        status_text: "OK".to_owned(),
        headers,
        body: Bytes::copy_from_slice(body),
    }
}

#[test]
fn json_round_trip() {
    let res = response(Some("application/json"), br#"{"balance":42,"unit":"zk"}"#);
    let packed = pack(&res);
    // original stays usable after packing
    assert_eq!(res.body.len(), 26);

    let back = unpack(packed).unwrap();
    assert_eq!(back.status, 200);
    assert_eq!(back.status_text, "OK");
    assert_eq!(back.headers, res.headers);
    let a: Value = serde_json::from_slice(&back.body).unwrap();
    let b: Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(a, b);
}

#[test]
fn json_with_charset_parameter_still_classifies_json() {
    let res = response(Some("application/json; charset=utf-8"), br#"{"ok":true}"#);
    match pack(&res) {
        PackedFetchResponse::Success { body, .. } => assert!(matches!(body, PackedBody::Json(_))),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn text_round_trip() {
    let res = response(Some("text/plain; charset=utf-8"), b"hello relay");
    let back = unpack(pack(&res)).unwrap();
    assert_eq!(back.headers, res.headers);
    assert_eq!(back.body, res.body);
}

#[test]
fn unknown_content_type_collapses_to_binary() {
    let res = response(Some("application/octet-stream"), &[0x00, 0xFF, 0x10]);
    let packed = pack(&res);
    match &packed {
        PackedFetchResponse::Success { body, .. } => {
            assert!(matches!(body, PackedBody::Binary(_)))
        }
        other => panic!("unexpected: {other:?}"),
    }
    let back = unpack(packed).unwrap();
    assert_eq!(back.body, res.body);
    assert_eq!(back.headers, res.headers);
}

#[test]
fn missing_content_type_round_trips_header_set_unchanged() {
    let res = response(None, &[1, 2, 3]);
    let back = unpack(pack(&res)).unwrap();
    // binary never synthesizes a content-type
    assert_eq!(back.headers, res.headers);
    assert!(back.content_type().is_none());
}

#[test]
fn mislabelled_json_degrades_to_binary() {
    let res = response(Some("application/json"), b"not json at all");
    let back = unpack(pack(&res)).unwrap();
    assert_eq!(back.body, res.body);
}

#[test]
fn hand_built_packet_without_content_type_gets_one_synthesized() {
    let packed = PackedFetchResponse::Success {
        status: 200,
        status_text: "OK".to_owned(),
        headers: BTreeMap::new(),
        body: PackedBody::Json(json!({"a": 1})),
    };
    let back = unpack(packed).unwrap();
    assert_eq!(back.content_type(), Some("application/json"));
}

#[test]
fn error_round_trip_preserves_kind_and_message() {
    let err = ZknetError::NetworkNotConnected;
    let packed = pack_err(&err);
    let back = unpack(packed).unwrap_err();
    assert_eq!(back.kind(), ErrorKind::NetworkNotConnected);
    assert_eq!(back.to_string(), err.to_string());

    let err = ZknetError::Fetch("connection refused".to_owned());
    let back = unpack(pack_err(&err)).unwrap_err();
    assert_eq!(back.kind(), ErrorKind::Fetch);
    assert_eq!(back.message(), "connection refused");
}

#[test]
fn unknown_error_kind_falls_back_but_keeps_message() {
    let packed = PackedFetchResponse::Failure {
        kind: "SOMETHING_NEW".to_owned(),
        message: "the future happened".to_owned(),
    };
    let back = unpack(packed).unwrap_err();
    assert_eq!(back.kind(), ErrorKind::Internal);
    assert_eq!(back.message(), "the future happened");
}

#[test]
fn packed_form_survives_serde() {
    let res = response(Some("application/json"), br#"{"n":7}"#);
    let packed = pack(&res);
    let wire = serde_json::to_string(&packed).unwrap();
    assert!(wire.contains(r#""tag":"success""#));
    let parsed: PackedFetchResponse = serde_json::from_str(&wire).unwrap();
    assert_eq!(parsed, packed);
}
