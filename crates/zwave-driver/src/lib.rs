//! Network driver abstraction layer for the Z-Wave notification bridge.
//!
//! This crate defines the seam between the bridge and the protocol stack
//! that actually talks to a Z-Wave controller. The bridge forwards requests
//! through the [`NetworkDriver`] trait and receives everything the network
//! reports through a [`NotificationWatcher`] callback that the driver calls
//! from its own thread.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All requests are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: [`AnyNetworkDriver`] provides concrete dispatch since
//!   async traits are not object-safe.
//! - **Thread-safe**: Drivers require `Send + Sync` for use with Tokio.
//! - **Fire-and-forget**: A successful request only means the driver accepted
//!   it; its effects arrive later as notification records.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zwave_driver::traits::NetworkDriver;
//! use zwave_driver::mock::MockDriver;
//!
//! #[tokio::main]
//! async fn main() -> zwave_driver::Result<()> {
//!     let (driver, _handle) = MockDriver::new();
//!
//!     driver
//!         .connect("/dev/ttyACM0", Arc::new(|record| {
//!             println!("{} on node {}", record.kind(), record.node_id);
//!         }))
//!         .await?;
//!
//!     driver.disconnect().await
//! }
//! ```
//!
//! # Mock Implementation
//!
//! [`MockDriver`] simulates a controller with a scripted set of nodes. Its
//! [`MockDriverHandle`] injects device-side events and records every request,
//! which is how the bridge's test suites exercise the full pipeline.

pub mod drivers;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use drivers::AnyNetworkDriver;
pub use error::{DriverError, Result};
pub use mock::{DriverCall, MockDriver, MockDriverHandle};
pub use traits::NetworkDriver;
pub use types::{ControllerInfo, NotificationWatcher};
