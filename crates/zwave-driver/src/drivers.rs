//! Enum wrapper for network driver dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn NetworkDriver>`
//! is not an option. [`AnyNetworkDriver`] provides concrete dispatch over the
//! available backends instead, keeping the bridge free of generics.
//!
//! # Examples
//!
//! ```
//! use zwave_driver::drivers::AnyNetworkDriver;
//! use zwave_driver::mock::MockDriver;
//!
//! let (driver, _handle) = MockDriver::new();
//! let any_driver = AnyNetworkDriver::Mock(driver);
//! ```

use std::time::Duration;

use zwave_core::{ControllerCommand, NetworkId, NodeId, NodeKey, Value, ValueId};

use crate::mock::MockDriver;
use crate::traits::NetworkDriver;
use crate::{ControllerInfo, NotificationWatcher, Result};

/// Enum wrapper for network driver dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyNetworkDriver {
    /// Scriptable in-process driver for development and testing.
    Mock(MockDriver),
}

impl From<MockDriver> for AnyNetworkDriver {
    fn from(driver: MockDriver) -> Self {
        Self::Mock(driver)
    }
}

impl NetworkDriver for AnyNetworkDriver {
    async fn connect(&self, port: &str, watcher: NotificationWatcher) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.connect(port, watcher).await,
        }
    }

    async fn disconnect(&self) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.disconnect().await,
        }
    }

    async fn set_value(&self, node: NodeKey, value_id: ValueId, value: &Value) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_value(node, value_id, value).await,
        }
    }

    async fn begin_controller_command(
        &self,
        command: ControllerCommand,
        node_id: NodeId,
        high_power: bool,
    ) -> Result<()> {
        match self {
            Self::Mock(driver) => {
                driver
                    .begin_controller_command(command, node_id, high_power)
                    .await
            }
        }
    }

    async fn cancel_controller_command(&self) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.cancel_controller_command().await,
        }
    }

    async fn set_node_name(&self, node: NodeKey, name: &str) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_node_name(node, name).await,
        }
    }

    async fn set_node_location(&self, node: NodeKey, location: &str) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_node_location(node, location).await,
        }
    }

    async fn set_node_manufacturer_name(&self, node: NodeKey, name: &str) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_node_manufacturer_name(node, name).await,
        }
    }

    async fn set_node_product_name(&self, node: NodeKey, name: &str) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_node_product_name(node, name).await,
        }
    }

    async fn enable_poll(&self, node: NodeKey, value_id: ValueId, intensity: u8) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.enable_poll(node, value_id, intensity).await,
        }
    }

    async fn set_poll_intensity(
        &self,
        node: NodeKey,
        value_id: ValueId,
        intensity: u8,
    ) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_poll_intensity(node, value_id, intensity).await,
        }
    }

    async fn disable_poll(&self, node: NodeKey, value_id: ValueId) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.disable_poll(node, value_id).await,
        }
    }

    async fn set_poll_interval(&self, interval: Duration) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_poll_interval(interval).await,
        }
    }

    async fn refresh_node_info(&self, node: NodeKey) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.refresh_node_info(node).await,
        }
    }

    async fn request_node_state(&self, node: NodeKey) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.request_node_state(node).await,
        }
    }

    async fn heal_network_node(&self, node: NodeKey, return_routes: bool) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.heal_network_node(node, return_routes).await,
        }
    }

    async fn heal_network(&self, network_id: NetworkId, return_routes: bool) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.heal_network(network_id, return_routes).await,
        }
    }

    async fn soft_reset(&self, network_id: NetworkId) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.soft_reset(network_id).await,
        }
    }

    async fn hard_reset(&self, network_id: NetworkId) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.hard_reset(network_id).await,
        }
    }

    async fn controller_info(&self, network_id: NetworkId) -> Result<ControllerInfo> {
        match self {
            Self::Mock(driver) => driver.controller_info(network_id).await,
        }
    }
}
