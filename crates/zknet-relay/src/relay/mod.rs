//! Relay bus: named, typed channels between isolated contexts.

mod bus;

pub use bus::{CallHandler, RelayBus};
