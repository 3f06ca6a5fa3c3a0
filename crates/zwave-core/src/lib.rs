//! Core domain types for the Z-Wave notification bridge.
//!
//! Everything in this crate is plain data: identifiers, typed values, node and
//! scene records, the notification records emitted by the driver, and the
//! compile-time controller command table. The concurrent machinery lives in
//! `zwave-bridge`; the driver seam lives in `zwave-driver`.

pub mod command;
pub mod constants;
pub mod error;
pub mod node;
pub mod notification;
pub mod scene;
pub mod types;

pub use command::{ControllerCommand, ControllerError, ControllerState};
pub use error::{Error, Result};
pub use node::{NodeCapabilities, NodeMetadata, NodeRecord};
pub use notification::{NotificationCode, NotificationKind, NotificationPayload, NotificationRecord};
pub use scene::{SceneEntry, SceneId, SceneRecord};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
