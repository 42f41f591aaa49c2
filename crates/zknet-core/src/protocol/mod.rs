//! Wire-level contracts: JSON-RPC frames, the relay protocol map, and the
//! client status/state data model.

pub mod map;
pub mod rpc;
pub mod status;
