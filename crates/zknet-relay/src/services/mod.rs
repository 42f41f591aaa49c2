//! Context services: the background executor, the content hop, and the
//! page-facing surface.

pub mod background;
pub mod content;
pub mod page;

pub use background::BackgroundService;
pub use page::{ReadyFlag, ZknetPage};
