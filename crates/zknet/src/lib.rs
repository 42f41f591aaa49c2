//! Top-level facade crate for zknet.
//!
//! Re-exports core types and the relay library so users can depend on a single crate.

pub mod core {
    pub use zknet_core::*;
}

pub mod relay {
    pub use zknet_relay::*;
}
