//! RPC transport: persistent JSON-RPC socket client.

mod rpc;

pub use rpc::{RpcSocket, TransportConfig, TransportEvent};
