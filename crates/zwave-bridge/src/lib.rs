//! Notification bridge for Z-Wave networks.
//!
//! This crate turns the events a network driver emits from its own native
//! thread into ordered, named callbacks on a single tokio task, and keeps an
//! authoritative in-memory view of the network while doing so.
//!
//! # Architecture
//!
//! - [`NotificationQueue`](queue::NotificationQueue): mutex-guarded FIFO the
//!   driver's watcher appends to; wakes the consumer on the empty to
//!   non-empty transition.
//! - [`AsyncBridge`](bridge::AsyncBridge): the consumer task. Drains the
//!   queue, applies each record to the registries, then dispatches it.
//! - [`NodeRegistry`](nodes::NodeRegistry) and
//!   [`SceneRegistry`](scenes::SceneRegistry): independent locks, never held
//!   across a driver call or a listener.
//! - [`CommandDispatcher`](dispatcher::CommandDispatcher): validates
//!   controller command names and tracks the single in-flight command.
//! - [`ZWave`]: the context object tying it all to one driver connection.
//!
//! # Ordering
//!
//! Records are processed in the order the driver emitted them, and each
//! record's registry mutation happens before its listeners run. A listener
//! for `"value changed"` can therefore always look up the node it is about.

pub mod bridge;
pub mod dispatcher;
pub mod listeners;
pub mod nodes;
pub mod options;
pub mod queue;
pub mod scenes;
pub mod zwave;

// Re-export commonly used types for convenience
pub use bridge::{AsyncBridge, BridgeHandle, BridgeStats};
pub use dispatcher::CommandDispatcher;
pub use listeners::{Listener, Listeners};
pub use nodes::NodeRegistry;
pub use options::{ConfigurationWarning, DriverOptions, OptionType};
pub use queue::NotificationQueue;
pub use scenes::{EntryOutcome, SceneActivation, SceneRegistry};
pub use zwave::ZWave;
