//! The `ZWave` context object.
//!
//! [`ZWave`] owns everything one controller connection needs: the driver,
//! the notification queue and bridge task, the node and scene registries and
//! the command dispatcher. There is no global state; two contexts never
//! share a registry.
//!
//! # Lifecycle
//!
//! 1. [`ZWave::new`] with frozen [`DriverOptions`] and a driver.
//! 2. Register listeners with [`ZWave::on`] / [`ZWave::on_name`].
//! 3. [`ZWave::connect`] starts the bridge task and opens the controller.
//! 4. Call operations; observe their effects through listeners.
//! 5. [`ZWave::disconnect`] closes the controller, flushes the queue, stops
//!    the bridge and clears the registries.
//!
//! # Examples
//!
//! ```no_run
//! use zwave_bridge::{DriverOptions, ZWave};
//! use zwave_core::NotificationKind;
//! use zwave_driver::MockDriver;
//!
//! #[tokio::main]
//! async fn main() -> zwave_core::Result<()> {
//!     let (driver, _handle) = MockDriver::new();
//!     let mut zwave = ZWave::new(DriverOptions::default(), driver);
//!
//!     zwave.on(NotificationKind::NodeQueriesComplete, |record| {
//!         println!("node {} ready", record.node_id);
//!         Ok(())
//!     });
//!
//!     zwave.connect("/dev/ttyACM0").await?;
//!     zwave.begin_controller_command("AddDevice", zwave_core::NodeId::NONE, true).await?;
//!     zwave.disconnect().await
//! }
//! ```

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zwave_core::{
    ControllerCommand, Error, NetworkId, NodeCapabilities, NodeId, NodeKey, NodeMetadata,
    NodeRecord, NodeValue, NotificationKind, NotificationRecord, Result, SceneEntry, SceneId,
    SceneRecord, Value, ValueId,
};
use zwave_driver::{AnyNetworkDriver, ControllerInfo, NetworkDriver, NotificationWatcher};

use crate::bridge::{AsyncBridge, BridgeHandle, BridgeStats};
use crate::dispatcher::CommandDispatcher;
use crate::listeners::Listeners;
use crate::nodes::NodeRegistry;
use crate::options::DriverOptions;
use crate::queue::NotificationQueue;
use crate::scenes::{SceneActivation, SceneRegistry};

pub struct ZWave {
    options: DriverOptions,
    driver: AnyNetworkDriver,
    queue: Arc<NotificationQueue>,
    nodes: Arc<NodeRegistry>,
    scenes: SceneRegistry,
    dispatcher: Arc<CommandDispatcher>,
    listeners: Arc<Listeners>,
    bridge: AsyncBridge,
    running: Option<BridgeHandle>,
    /// Open while the watcher handed to the current connection may enqueue.
    session: Option<Arc<AtomicBool>>,
    poll_interval: Mutex<Duration>,
}

impl ZWave {
    pub fn new(options: DriverOptions, driver: impl Into<AnyNetworkDriver>) -> Self {
        let queue = Arc::new(NotificationQueue::new());
        let nodes = Arc::new(NodeRegistry::new());
        let dispatcher = Arc::new(CommandDispatcher::new());
        let listeners = Arc::new(Listeners::new());
        let bridge = AsyncBridge::new(
            Arc::clone(&queue),
            Arc::clone(&nodes),
            Arc::clone(&dispatcher),
            Arc::clone(&listeners),
        );
        let poll_interval = Mutex::new(options.poll_interval());

        Self {
            options,
            driver: driver.into(),
            queue,
            nodes,
            scenes: SceneRegistry::new(),
            dispatcher,
            listeners,
            bridge,
            running: None,
            session: None,
            poll_interval,
        }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start the bridge task and open the controller on `port`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns `Error::AlreadyConnected` if called twice, or the driver's error
    /// if the controller cannot be opened (the bridge is stopped again).
    pub async fn connect(&mut self, port: &str) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::AlreadyConnected);
        }

        let stale = self.queue.drain();
        if !stale.is_empty() {
            debug!(discarded = stale.len(), "dropping records left by a previous session");
        }

        let handle = self.bridge.clone().start();
        let session = Arc::new(AtomicBool::new(true));
        let watcher = session_watcher(Arc::clone(&self.queue), Arc::clone(&session));

        if let Err(error) = self.driver.connect(port, watcher).await {
            warn!(%port, %error, "failed to open controller");
            session.store(false, Ordering::Release);
            handle.shutdown().await;
            return Err(error.into());
        }

        info!(%port, "controller connected");
        self.running = Some(handle);
        self.session = Some(session);
        Ok(())
    }

    /// Close the controller, flush pending notifications and stop the bridge.
    ///
    /// Node registry, scene registry and the in-flight command are cleared
    /// even if the driver reports an error while closing.
    ///
    /// # Errors
    /// Returns `Error::NotConnected` if not connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        let handle = self.running.take().ok_or(Error::NotConnected)?;

        let closed = self.driver.disconnect().await;
        if let Err(error) = &closed {
            warn!(%error, "driver reported an error while closing");
        }
        // Records the driver delivers from here on belong to no session.
        if let Some(session) = self.session.take() {
            session.store(false, Ordering::Release);
        }

        let stats = handle.shutdown().await;
        self.nodes.clear();
        self.scenes.clear();
        self.dispatcher.clear();
        self.bridge.forget_network();

        info!(processed = stats.processed, "controller disconnected");
        closed.map_err(Into::into)
    }

    pub fn is_connected(&self) -> bool {
        self.running.is_some()
    }

    /// Network id reported by the driver once it is ready.
    pub fn network_id(&self) -> Option<NetworkId> {
        self.bridge.network_id()
    }

    fn require_network(&self) -> Result<NetworkId> {
        self.network_id().ok_or(Error::NotConnected)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a listener for one notification kind.
    pub fn on<F>(&self, kind: NotificationKind, listener: F)
    where
        F: Fn(&NotificationRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners.on(kind, listener);
    }

    /// Register a listener by event name, e.g. `"value changed"`.
    ///
    /// # Errors
    /// Returns `Error::UnknownEvent` for names outside the event surface.
    pub fn on_name<F>(&self, name: &str, listener: F) -> Result<()>
    where
        F: Fn(&NotificationRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let kind = NotificationKind::from_event_name(name)?;
        self.listeners.on(kind, listener);
        Ok(())
    }

    /// Register a listener for every notification kind.
    pub fn on_all<F>(&self, listener: F)
    where
        F: Fn(&NotificationRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners.on_all(listener);
    }

    /// Channel receiving every dispatched record.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<NotificationRecord> {
        self.listeners.subscribe()
    }

    pub fn stats(&self) -> BridgeStats {
        self.bridge.stats()
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    pub fn node(&self, node: NodeKey) -> Result<NodeRecord> {
        self.nodes.get(node)
    }

    pub fn nodes(&self) -> Vec<NodeRecord> {
        self.nodes.list()
    }

    pub fn node_metadata(&self, node: NodeKey) -> Result<NodeMetadata> {
        self.nodes.read(node, |n| n.metadata.clone())
    }

    pub fn node_capabilities(&self, node: NodeKey) -> Result<NodeCapabilities> {
        self.nodes.read(node, |n| n.capabilities)
    }

    pub fn is_node_ready(&self, node: NodeKey) -> Result<bool> {
        self.nodes.read(node, |n| n.ready)
    }

    fn metadata<R>(&self, node: NodeKey, f: impl FnOnce(&NodeMetadata) -> R) -> Result<R> {
        self.nodes.read(node, |n| f(&n.metadata))
    }

    fn capability<R>(&self, node: NodeKey, f: impl FnOnce(&NodeCapabilities) -> R) -> Result<R> {
        self.nodes.read(node, |n| f(&n.capabilities))
    }

    pub fn node_manufacturer_name(&self, node: NodeKey) -> Result<String> {
        self.metadata(node, |m| m.manufacturer_name.clone())
    }

    pub fn node_manufacturer_id(&self, node: NodeKey) -> Result<String> {
        self.metadata(node, |m| m.manufacturer_id.clone())
    }

    pub fn node_product_name(&self, node: NodeKey) -> Result<String> {
        self.metadata(node, |m| m.product_name.clone())
    }

    pub fn node_product_type(&self, node: NodeKey) -> Result<String> {
        self.metadata(node, |m| m.product_type.clone())
    }

    pub fn node_product_id(&self, node: NodeKey) -> Result<String> {
        self.metadata(node, |m| m.product_id.clone())
    }

    pub fn node_type(&self, node: NodeKey) -> Result<String> {
        self.metadata(node, |m| m.node_type.clone())
    }

    pub fn node_name(&self, node: NodeKey) -> Result<String> {
        self.metadata(node, |m| m.name.clone())
    }

    pub fn node_location(&self, node: NodeKey) -> Result<String> {
        self.metadata(node, |m| m.location.clone())
    }

    pub fn is_node_listening_device(&self, node: NodeKey) -> Result<bool> {
        self.capability(node, |c| c.listening)
    }

    pub fn is_node_frequent_listening_device(&self, node: NodeKey) -> Result<bool> {
        self.capability(node, |c| c.frequent_listening)
    }

    pub fn is_node_beaming_device(&self, node: NodeKey) -> Result<bool> {
        self.capability(node, |c| c.beaming)
    }

    pub fn is_node_routing_device(&self, node: NodeKey) -> Result<bool> {
        self.capability(node, |c| c.routing)
    }

    pub fn is_node_security_device(&self, node: NodeKey) -> Result<bool> {
        self.capability(node, |c| c.security_device)
    }

    pub fn node_max_baud_rate(&self, node: NodeKey) -> Result<u32> {
        self.capability(node, |c| c.max_baud_rate)
    }

    pub fn node_version(&self, node: NodeKey) -> Result<u8> {
        self.capability(node, |c| c.version)
    }

    pub fn node_security(&self, node: NodeKey) -> Result<u8> {
        self.capability(node, |c| c.security)
    }

    pub fn node_basic(&self, node: NodeKey) -> Result<u8> {
        self.capability(node, |c| c.basic)
    }

    pub fn node_generic(&self, node: NodeKey) -> Result<u8> {
        self.capability(node, |c| c.generic)
    }

    pub fn node_specific(&self, node: NodeKey) -> Result<u8> {
        self.capability(node, |c| c.specific)
    }

    /// Rename a node. The registry reflects the new name immediately.
    pub async fn set_node_name(&self, node: NodeKey, name: &str) -> Result<()> {
        self.nodes.read(node, |_| ())?;
        self.driver.set_node_name(node, name).await?;
        self.nodes.update(node, |n| n.metadata.name = name.to_string())
    }

    pub async fn set_node_location(&self, node: NodeKey, location: &str) -> Result<()> {
        self.nodes.read(node, |_| ())?;
        self.driver.set_node_location(node, location).await?;
        self.nodes
            .update(node, |n| n.metadata.location = location.to_string())
    }

    pub async fn set_node_manufacturer_name(&self, node: NodeKey, name: &str) -> Result<()> {
        self.nodes.read(node, |_| ())?;
        self.driver.set_node_manufacturer_name(node, name).await?;
        self.nodes
            .update(node, |n| n.metadata.manufacturer_name = name.to_string())
    }

    pub async fn set_node_product_name(&self, node: NodeKey, name: &str) -> Result<()> {
        self.nodes.read(node, |_| ())?;
        self.driver.set_node_product_name(node, name).await?;
        self.nodes
            .update(node, |n| n.metadata.product_name = name.to_string())
    }

    pub async fn refresh_node_info(&self, node: NodeKey) -> Result<()> {
        self.nodes.read(node, |_| ())?;
        Ok(self.driver.refresh_node_info(node).await?)
    }

    pub async fn request_node_state(&self, node: NodeKey) -> Result<()> {
        self.nodes.read(node, |_| ())?;
        Ok(self.driver.request_node_state(node).await?)
    }

    pub async fn heal_network_node(&self, node: NodeKey, return_routes: bool) -> Result<()> {
        self.nodes.read(node, |_| ())?;
        Ok(self.driver.heal_network_node(node, return_routes).await?)
    }

    pub async fn heal_network(&self, return_routes: bool) -> Result<()> {
        let network_id = self.require_network()?;
        Ok(self.driver.heal_network(network_id, return_routes).await?)
    }

    // ------------------------------------------------------------------
    // Values and polling
    // ------------------------------------------------------------------

    fn node_value(&self, node: NodeKey, value_id: ValueId) -> Result<NodeValue> {
        self.nodes
            .read(node, |n| n.value(value_id).cloned())?
            .ok_or(Error::ValueNotFound { node, value_id })
    }

    /// Current value as last reported by the driver.
    pub fn value(&self, node: NodeKey, value_id: ValueId) -> Result<Value> {
        self.node_value(node, value_id).map(|v| v.value)
    }

    /// Request a new value.
    ///
    /// The registry is not updated here; the driver reports the change back
    /// as a `ValueChanged` notification.
    ///
    /// # Errors
    /// `NodeNotFound`, `ValueNotFound`, `ReadOnlyValue` or
    /// `ValueTypeMismatch` before anything is sent; driver errors after.
    pub async fn set_value(&self, node: NodeKey, value_id: ValueId, value: Value) -> Result<()> {
        let current = self.node_value(node, value_id)?;
        if current.read_only {
            return Err(Error::ReadOnlyValue(value_id));
        }
        if current.value_type() != value.value_type() {
            return Err(Error::ValueTypeMismatch {
                value_id,
                expected: current.value_type(),
                actual: value.value_type(),
            });
        }

        debug!(%node, %value_id, %value, "set value");
        Ok(self.driver.set_value(node, value_id, &value).await?)
    }

    /// Start polling a value.
    pub async fn enable_poll(&self, node: NodeKey, value_id: ValueId, intensity: u8) -> Result<()> {
        self.node_value(node, value_id)?;
        self.driver.enable_poll(node, value_id, intensity).await?;
        self.nodes.update(node, |n| {
            n.polling.insert(value_id, intensity);
        })
    }

    pub async fn disable_poll(&self, node: NodeKey, value_id: ValueId) -> Result<()> {
        self.node_value(node, value_id)?;
        self.driver.disable_poll(node, value_id).await?;
        self.nodes.update(node, |n| {
            n.polling.remove(&value_id);
        })
    }

    pub fn is_polled(&self, node: NodeKey, value_id: ValueId) -> Result<bool> {
        self.node_value(node, value_id)?;
        self.nodes.read(node, |n| n.is_polled(value_id))
    }

    /// Poll intensity of a value, `None` if it is not polled.
    pub fn poll_intensity(&self, node: NodeKey, value_id: ValueId) -> Result<Option<u8>> {
        self.node_value(node, value_id)?;
        self.nodes
            .read(node, |n| n.polling.get(&value_id).copied())
    }

    /// Change the poll intensity of a value.
    ///
    /// The request always reaches the driver, which keeps the intensity for
    /// when polling is enabled. The value only reports an intensity here
    /// while it is polled; use [`enable_poll`](Self::enable_poll) to start
    /// polling.
    pub async fn set_poll_intensity(&self, node: NodeKey, value_id: ValueId, intensity: u8) -> Result<()> {
        self.node_value(node, value_id)?;
        self.driver
            .set_poll_intensity(node, value_id, intensity)
            .await?;
        self.nodes.update(node, |n| {
            if let Some(current) = n.polling.get_mut(&value_id) {
                *current = intensity;
            }
        })
    }

    pub fn poll_interval(&self) -> Duration {
        *self.poll_interval.lock()
    }

    pub async fn set_poll_interval(&self, interval: Duration) -> Result<()> {
        self.driver.set_poll_interval(interval).await?;
        *self.poll_interval.lock() = interval;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Controller
    // ------------------------------------------------------------------

    /// Start a controller command by name, e.g. `"AddDevice"`.
    pub async fn begin_controller_command(
        &self,
        name: &str,
        node_id: NodeId,
        high_power: bool,
    ) -> Result<ControllerCommand> {
        self.dispatcher
            .begin(&self.driver, name, node_id, high_power)
            .await
    }

    /// Cancel the running controller command. Safe to call when none is running.
    pub async fn cancel_controller_command(&self) -> Result<Option<ControllerCommand>> {
        self.dispatcher.cancel(&self.driver).await
    }

    pub fn active_controller_command(&self) -> Option<ControllerCommand> {
        self.dispatcher.active()
    }

    pub async fn controller_info(&self) -> Result<ControllerInfo> {
        let network_id = self.require_network()?;
        Ok(self.driver.controller_info(network_id).await?)
    }

    pub async fn soft_reset(&self) -> Result<()> {
        let network_id = self.require_network()?;
        Ok(self.driver.soft_reset(network_id).await?)
    }

    /// Factory-reset the controller. Every node of the network is forgotten
    /// once the driver reports the reset.
    pub async fn hard_reset(&self) -> Result<()> {
        let network_id = self.require_network()?;
        self.dispatcher.clear();
        warn!(network = %network_id, "hard reset requested");
        Ok(self.driver.hard_reset(network_id).await?)
    }

    // ------------------------------------------------------------------
    // Scenes
    // ------------------------------------------------------------------

    pub fn create_scene(&self, label: &str) -> SceneId {
        self.scenes.create(label)
    }

    pub fn remove_scene(&self, scene_id: SceneId) -> Result<()> {
        self.scenes.remove(scene_id).map(|_| ())
    }

    pub fn scenes(&self) -> Vec<SceneRecord> {
        self.scenes.list()
    }

    /// Add a node value to a scene.
    ///
    /// The value must exist on the node and `target` must have its type.
    pub fn add_scene_value(
        &self,
        scene_id: SceneId,
        node: NodeKey,
        value_id: ValueId,
        target: Value,
    ) -> Result<()> {
        let current = self.node_value(node, value_id)?;
        if current.value_type() != target.value_type() {
            return Err(Error::ValueTypeMismatch {
                value_id,
                expected: current.value_type(),
                actual: target.value_type(),
            });
        }
        self.scenes
            .add_value(scene_id, SceneEntry::new(node, value_id, target))
    }

    pub fn remove_scene_value(&self, scene_id: SceneId, node: NodeKey, value_id: ValueId) -> Result<()> {
        self.scenes.remove_value(scene_id, node, value_id).map(|_| ())
    }

    pub fn scene_values(&self, scene_id: SceneId) -> Result<Vec<SceneEntry>> {
        self.scenes.values(scene_id)
    }

    /// Send every value of a scene to the driver and report each outcome.
    pub async fn activate_scene(&self, scene_id: SceneId) -> Result<SceneActivation> {
        self.scenes.activate(scene_id, &self.driver).await
    }
}

impl std::fmt::Debug for ZWave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZWave")
            .field("network_id", &self.network_id())
            .field("connected", &self.is_connected())
            .field("nodes", &self.nodes.len())
            .field("scenes", &self.scenes.len())
            .finish()
    }
}

/// Watcher handed to the driver for one connection.
///
/// Records are dropped once `session` is closed, so a driver thread that
/// outlives `disconnect` cannot feed the next connection.
fn session_watcher(queue: Arc<NotificationQueue>, session: Arc<AtomicBool>) -> NotificationWatcher {
    Arc::new(move |record| {
        if session.load(Ordering::Acquire) {
            queue.enqueue(record);
        } else {
            debug!(kind = %record.kind(), "dropping record delivered after disconnect");
        }
    })
}
