//! Network driver trait definition.
//!
//! [`NetworkDriver`] is the narrow outbound interface between the bridge and
//! the device-network protocol stack. Requests go out through its methods;
//! everything the network reports comes back asynchronously through the
//! [`NotificationWatcher`] installed by [`NetworkDriver::connect`].
//!
//! All methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use zwave_core::{ControllerCommand, NetworkId, NodeId, NodeKey, Value, ValueId};

use crate::error::Result;
use crate::types::{ControllerInfo, NotificationWatcher};

/// Trait for Z-Wave network drivers.
///
/// A driver owns the connection to one controller. Requests are fire-and-
/// forget from the bridge's point of view: success means the driver accepted
/// the request, and its effect is observed later as notification records.
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// opaque futures. Use [`AnyNetworkDriver`](crate::drivers::AnyNetworkDriver)
/// for concrete dispatch.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use zwave_driver::traits::NetworkDriver;
/// use zwave_driver::Result;
///
/// async fn start<D: NetworkDriver>(driver: &D) -> Result<()> {
///     driver
///         .connect("/dev/ttyACM0", Arc::new(|record| println!("{:?}", record.kind())))
///         .await
/// }
/// ```
pub trait NetworkDriver: Send + Sync {
    /// Open the controller on `port` and start emitting notifications.
    ///
    /// The watcher is called from the driver's own thread for every event.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The driver is already connected
    /// - The controller cannot be opened
    async fn connect(&self, port: &str, watcher: NotificationWatcher) -> Result<()>;

    /// Close the controller and stop emitting notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver is not connected.
    async fn disconnect(&self) -> Result<()>;

    /// Request a new value for a node's value.
    async fn set_value(&self, node: NodeKey, value_id: ValueId, value: &Value) -> Result<()>;

    /// Start a controller command.
    ///
    /// Progress is reported through `ControllerCommand` notifications.
    async fn begin_controller_command(
        &self,
        command: ControllerCommand,
        node_id: NodeId,
        high_power: bool,
    ) -> Result<()>;

    /// Cancel the running controller command, if any.
    async fn cancel_controller_command(&self) -> Result<()>;

    async fn set_node_name(&self, node: NodeKey, name: &str) -> Result<()>;

    async fn set_node_location(&self, node: NodeKey, location: &str) -> Result<()>;

    async fn set_node_manufacturer_name(&self, node: NodeKey, name: &str) -> Result<()>;

    async fn set_node_product_name(&self, node: NodeKey, name: &str) -> Result<()>;

    /// Start polling a value with the given intensity.
    async fn enable_poll(&self, node: NodeKey, value_id: ValueId, intensity: u8) -> Result<()>;

    /// Change how often a value is polled, in polling passes.
    ///
    /// The driver keeps the intensity with the value whether or not it is
    /// currently polled.
    async fn set_poll_intensity(&self, node: NodeKey, value_id: ValueId, intensity: u8)
    -> Result<()>;

    /// Stop polling a value.
    async fn disable_poll(&self, node: NodeKey, value_id: ValueId) -> Result<()>;

    /// Set the time between two complete polling passes.
    async fn set_poll_interval(&self, interval: Duration) -> Result<()>;

    /// Re-run the full interview of a node.
    async fn refresh_node_info(&self, node: NodeKey) -> Result<()>;

    /// Request the dynamic state (values) of a node.
    async fn request_node_state(&self, node: NodeKey) -> Result<()>;

    async fn heal_network_node(&self, node: NodeKey, return_routes: bool) -> Result<()>;

    async fn heal_network(&self, network_id: NetworkId, return_routes: bool) -> Result<()>;

    /// Reset the controller without losing network configuration.
    async fn soft_reset(&self, network_id: NetworkId) -> Result<()>;

    /// Factory-reset the controller. Every node is forgotten.
    async fn hard_reset(&self, network_id: NetworkId) -> Result<()>;

    /// Query controller information.
    async fn controller_info(&self, network_id: NetworkId) -> Result<ControllerInfo>;
}
