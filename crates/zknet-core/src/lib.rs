//! zknet core: transport-agnostic protocol primitives, error types, and the
//! fetch wire codec.
//!
//! This crate defines the JSON-RPC frame shapes, the closed relay protocol
//! map, the remote status / client state data model, and the pack/unpack
//! codec shared by every relay hop. It intentionally carries no transport or
//! runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ZknetError`/`Result` so a relay
//! context never dies on malformed input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod fetch_wire;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorKind, Result, ZknetError};
