//! zknet relay: the runtime half of the cross-context RPC relay.
//!
//! - `transport` — JSON-RPC 2.0 client over a persistent WebSocket with
//!   automatic reconnection.
//! - `relay` — named, typed bus segments between isolated contexts.
//! - `state` — canonical client state derived from transport events.
//! - `services` — background fetch/state handlers, the content hop, and the
//!   page-facing surface.
//! - `config` — strict YAML configuration.

pub mod config;
pub mod relay;
pub mod services;
pub mod state;
pub mod transport;
