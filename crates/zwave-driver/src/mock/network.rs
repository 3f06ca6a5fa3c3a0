//! Mock network driver implementation for testing and development.
//!
//! This module provides a simulated controller with a scripted set of nodes.
//! On connect it announces the network from its own background thread, the
//! same way a real driver does, and every outbound request is recorded so
//! tests can assert on what the bridge forwarded.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, trace};
use zwave_core::constants::DEFAULT_POLL_INTERVAL_MS;
use zwave_core::{
    ControllerCommand, ControllerError, ControllerState, NetworkId, NodeId, NodeKey,
    NodeRecord, NodeValue, NotificationPayload, NotificationRecord, Value, ValueId,
};

use crate::traits::NetworkDriver;
use crate::{ControllerInfo, DriverError, NotificationWatcher, Result};

/// Network id used by [`MockDriver::new`].
pub const DEFAULT_MOCK_NETWORK_ID: NetworkId = NetworkId::new(0x0184_2b6a);

/// Outbound request recorded by the mock driver.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Connect { port: String },
    Disconnect,
    SetValue { node: NodeKey, value_id: ValueId, value: Value },
    BeginControllerCommand { command: ControllerCommand, node_id: NodeId, high_power: bool },
    CancelControllerCommand,
    SetNodeName { node: NodeKey, name: String },
    SetNodeLocation { node: NodeKey, location: String },
    SetNodeManufacturerName { node: NodeKey, name: String },
    SetNodeProductName { node: NodeKey, name: String },
    EnablePoll { node: NodeKey, value_id: ValueId, intensity: u8 },
    SetPollIntensity { node: NodeKey, value_id: ValueId, intensity: u8 },
    DisablePoll { node: NodeKey, value_id: ValueId },
    SetPollInterval(Duration),
    RefreshNodeInfo(NodeKey),
    RequestNodeState(NodeKey),
    HealNetworkNode { node: NodeKey, return_routes: bool },
    HealNetwork { network_id: NetworkId, return_routes: bool },
    SoftReset(NetworkId),
    HardReset(NetworkId),
}

struct MockNetwork {
    network_id: NetworkId,
    controller: ControllerInfo,
    nodes: BTreeMap<NodeId, NodeRecord>,
    poll_interval: Duration,
}

struct Shared {
    watcher: Mutex<Option<NotificationWatcher>>,
    port: Mutex<Option<String>>,
    calls: Mutex<Vec<DriverCall>>,
    network: Mutex<MockNetwork>,
    failing_values: Mutex<HashSet<(NodeKey, ValueId)>>,
    running_command: Mutex<Option<ControllerCommand>>,
    reject_commands: AtomicBool,
    echo_values: AtomicBool,
    retain_watcher: AtomicBool,
}

impl Shared {
    fn record(&self, call: DriverCall) {
        trace!(?call, "mock driver call");
        self.calls.lock().push(call);
    }

    fn is_connected(&self) -> bool {
        self.port.lock().is_some()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DriverError::NotConnected)
        }
    }

    /// Deliver a record to the installed watcher. Returns `false` when disconnected.
    fn emit(&self, record: NotificationRecord) -> bool {
        let watcher = self.watcher.lock().clone();
        match watcher {
            Some(watcher) => {
                watcher(record);
                true
            }
            None => false,
        }
    }

    fn network_id(&self) -> NetworkId {
        self.network.lock().network_id
    }

    fn key(&self, node_id: NodeId) -> NodeKey {
        NodeKey::new(self.network_id(), node_id)
    }

    /// Apply `update` to a scripted node and emit `NodeNaming` with the result.
    fn rename(&self, node: NodeKey, update: impl FnOnce(&mut NodeRecord)) {
        let metadata = {
            let mut network = self.network.lock();
            network.nodes.get_mut(&node.node_id).map(|record| {
                update(record);
                record.metadata.clone()
            })
        };
        if let Some(metadata) = metadata {
            self.emit(NotificationRecord::for_node(
                node,
                NotificationPayload::NodeNaming(metadata),
            ));
        }
    }
}

/// Records the driver emits while interviewing a node.
fn interview(record: &NodeRecord) -> Vec<NotificationRecord> {
    let key = record.key();
    let mut records = vec![
        NotificationRecord::for_node(key, NotificationPayload::NodeAdded),
        NotificationRecord::for_node(
            key,
            NotificationPayload::NodeProtocolInfo(record.capabilities),
        ),
    ];
    records.extend(record.values.values().map(|value| {
        NotificationRecord::for_node(key, NotificationPayload::ValueAdded(value.clone()))
    }));
    records.push(NotificationRecord::for_node(
        key,
        NotificationPayload::NodeNaming(record.metadata.clone()),
    ));
    records.push(NotificationRecord::for_node(
        key,
        NotificationPayload::NodeQueriesComplete,
    ));
    records
}

/// Mock network driver for testing and development.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use zwave_core::{NodeId, NodeKey, NodeRecord};
/// use zwave_driver::mock::MockDriver;
/// use zwave_driver::traits::NetworkDriver;
///
/// #[tokio::main]
/// async fn main() -> zwave_driver::Result<()> {
///     let (driver, handle) = MockDriver::new();
///     handle.add_node(NodeRecord::new(NodeKey::new(
///         handle.network_id(),
///         NodeId::new(2).unwrap(),
///     )));
///
///     driver
///         .connect("/dev/ttyACM0", Arc::new(|record| println!("{}", record.kind())))
///         .await?;
///
///     assert!(handle.is_connected());
///     Ok(())
/// }
/// ```
pub struct MockDriver {
    shared: Arc<Shared>,
}

impl MockDriver {
    /// Create a new mock driver on the default network id.
    ///
    /// Returns a tuple of (MockDriver, MockDriverHandle) where the handle
    /// scripts the network and inspects recorded calls.
    pub fn new() -> (Self, MockDriverHandle) {
        Self::with_network_id(DEFAULT_MOCK_NETWORK_ID)
    }

    /// Create a new mock driver on a custom network id.
    pub fn with_network_id(network_id: NetworkId) -> (Self, MockDriverHandle) {
        let controller_id = NodeId::new(1).unwrap_or(NodeId::NONE);
        let shared = Arc::new(Shared {
            watcher: Mutex::new(None),
            port: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            network: Mutex::new(MockNetwork {
                network_id,
                controller: ControllerInfo::new(controller_id, "Z-Wave 4.54")
                    .with_suc_node_id(controller_id),
                nodes: BTreeMap::new(),
                poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            }),
            failing_values: Mutex::new(HashSet::new()),
            running_command: Mutex::new(None),
            reject_commands: AtomicBool::new(false),
            echo_values: AtomicBool::new(true),
            retain_watcher: AtomicBool::new(false),
        });

        let driver = Self {
            shared: Arc::clone(&shared),
        };
        let handle = MockDriverHandle { shared };

        (driver, handle)
    }
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("network_id", &self.shared.network_id())
            .field("connected", &self.shared.is_connected())
            .finish()
    }
}

impl NetworkDriver for MockDriver {
    async fn connect(&self, port: &str, watcher: NotificationWatcher) -> Result<()> {
        if port.is_empty() {
            return Err(DriverError::initialization_failed("empty controller port"));
        }
        {
            let mut current = self.shared.port.lock();
            if let Some(existing) = current.as_ref() {
                return Err(DriverError::already_connected(existing.clone()));
            }
            *current = Some(port.to_string());
        }
        *self.shared.watcher.lock() = Some(watcher);
        self.shared.record(DriverCall::Connect {
            port: port.to_string(),
        });

        let (network_id, nodes) = {
            let network = self.shared.network.lock();
            (
                network.network_id,
                network.nodes.values().cloned().collect::<Vec<_>>(),
            )
        };
        info!(%port, %network_id, nodes = nodes.len(), "mock controller opened");

        // Announce from a separate thread, like a real driver's event loop.
        let shared = Arc::clone(&self.shared);
        std::thread::Builder::new()
            .name("zwave-mock-driver".to_string())
            .spawn(move || {
                shared.emit(NotificationRecord::for_network(
                    network_id,
                    NotificationPayload::DriverReady,
                ));
                for node in &nodes {
                    for record in interview(node) {
                        if !shared.emit(record) {
                            return;
                        }
                    }
                }
                shared.emit(NotificationRecord::for_network(
                    network_id,
                    NotificationPayload::AllNodesQueried,
                ));
                debug!(%network_id, "mock network announced");
            })?;

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::Disconnect);
        self.shared.emit(NotificationRecord::for_network(
            self.shared.network_id(),
            NotificationPayload::DriverRemoved,
        ));
        if !self.shared.retain_watcher.load(Ordering::SeqCst) {
            *self.shared.watcher.lock() = None;
        }
        *self.shared.port.lock() = None;
        self.shared.running_command.lock().take();
        info!("mock controller closed");
        Ok(())
    }

    async fn set_value(&self, node: NodeKey, value_id: ValueId, value: &Value) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::SetValue {
            node,
            value_id,
            value: value.clone(),
        });

        if self.shared.failing_values.lock().contains(&(node, value_id)) {
            return Err(DriverError::rejected(format!(
                "node {node} did not accept value {value_id}"
            )));
        }

        let updated = {
            let mut network = self.shared.network.lock();
            network
                .nodes
                .get_mut(&node.node_id)
                .and_then(|record| record.values.get_mut(&value_id))
                .map(|current| {
                    current.value = value.clone();
                    current.clone()
                })
        };
        let Some(updated) = updated else {
            return Err(DriverError::rejected(format!(
                "node {node} has no value {value_id}"
            )));
        };

        if self.shared.echo_values.load(Ordering::SeqCst) {
            self.shared.emit(NotificationRecord::for_node(
                node,
                NotificationPayload::ValueChanged(updated),
            ));
        }
        Ok(())
    }

    async fn begin_controller_command(
        &self,
        command: ControllerCommand,
        node_id: NodeId,
        high_power: bool,
    ) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::BeginControllerCommand {
            command,
            node_id,
            high_power,
        });
        if self.shared.reject_commands.load(Ordering::SeqCst) {
            return Err(DriverError::rejected(format!(
                "controller refused {command}"
            )));
        }
        *self.shared.running_command.lock() = Some(command);
        self.shared.emit(NotificationRecord::for_network(
            self.shared.network_id(),
            NotificationPayload::ControllerCommand {
                state: ControllerState::Starting,
                error: ControllerError::None,
            },
        ));
        Ok(())
    }

    async fn cancel_controller_command(&self) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::CancelControllerCommand);
        // Only a running command reports a terminal state.
        if let Some(command) = self.shared.running_command.lock().take() {
            debug!(%command, "mock controller command cancelled");
            self.shared.emit(NotificationRecord::for_network(
                self.shared.network_id(),
                NotificationPayload::ControllerCommand {
                    state: ControllerState::Cancel,
                    error: ControllerError::None,
                },
            ));
        }
        Ok(())
    }

    async fn set_node_name(&self, node: NodeKey, name: &str) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::SetNodeName {
            node,
            name: name.to_string(),
        });
        self.shared
            .rename(node, |record| record.metadata.name = name.to_string());
        Ok(())
    }

    async fn set_node_location(&self, node: NodeKey, location: &str) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::SetNodeLocation {
            node,
            location: location.to_string(),
        });
        self.shared
            .rename(node, |record| record.metadata.location = location.to_string());
        Ok(())
    }

    async fn set_node_manufacturer_name(&self, node: NodeKey, name: &str) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::SetNodeManufacturerName {
            node,
            name: name.to_string(),
        });
        self.shared
            .rename(node, |record| record.metadata.manufacturer_name = name.to_string());
        Ok(())
    }

    async fn set_node_product_name(&self, node: NodeKey, name: &str) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::SetNodeProductName {
            node,
            name: name.to_string(),
        });
        self.shared
            .rename(node, |record| record.metadata.product_name = name.to_string());
        Ok(())
    }

    async fn enable_poll(&self, node: NodeKey, value_id: ValueId, intensity: u8) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::EnablePoll {
            node,
            value_id,
            intensity,
        });
        self.shared.emit(NotificationRecord::for_node(
            node,
            NotificationPayload::PollingEnabled(value_id),
        ));
        Ok(())
    }

    async fn set_poll_intensity(
        &self,
        node: NodeKey,
        value_id: ValueId,
        intensity: u8,
    ) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::SetPollIntensity {
            node,
            value_id,
            intensity,
        });
        Ok(())
    }

    async fn disable_poll(&self, node: NodeKey, value_id: ValueId) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::DisablePoll { node, value_id });
        self.shared.emit(NotificationRecord::for_node(
            node,
            NotificationPayload::PollingDisabled(value_id),
        ));
        Ok(())
    }

    async fn set_poll_interval(&self, interval: Duration) -> Result<()> {
        self.shared.record(DriverCall::SetPollInterval(interval));
        self.shared.network.lock().poll_interval = interval;
        Ok(())
    }

    async fn refresh_node_info(&self, node: NodeKey) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::RefreshNodeInfo(node));
        let record = self.shared.network.lock().nodes.get(&node.node_id).cloned();
        if let Some(record) = record {
            for notification in interview(&record).into_iter().skip(1) {
                self.shared.emit(notification);
            }
        }
        Ok(())
    }

    async fn request_node_state(&self, node: NodeKey) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::RequestNodeState(node));
        let values: Vec<NodeValue> = self
            .shared
            .network
            .lock()
            .nodes
            .get(&node.node_id)
            .map(|record| record.values.values().cloned().collect())
            .unwrap_or_default();
        for value in values {
            self.shared.emit(NotificationRecord::for_node(
                node,
                NotificationPayload::ValueRefreshed(value),
            ));
        }
        Ok(())
    }

    async fn heal_network_node(&self, node: NodeKey, return_routes: bool) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::HealNetworkNode {
            node,
            return_routes,
        });
        Ok(())
    }

    async fn heal_network(&self, network_id: NetworkId, return_routes: bool) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::HealNetwork {
            network_id,
            return_routes,
        });
        Ok(())
    }

    async fn soft_reset(&self, network_id: NetworkId) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::SoftReset(network_id));
        Ok(())
    }

    async fn hard_reset(&self, network_id: NetworkId) -> Result<()> {
        self.shared.ensure_connected()?;
        self.shared.record(DriverCall::HardReset(network_id));
        self.shared.network.lock().nodes.clear();
        self.shared.emit(NotificationRecord::for_network(
            network_id,
            NotificationPayload::DriverReset,
        ));
        self.shared.emit(NotificationRecord::for_network(
            network_id,
            NotificationPayload::DriverReady,
        ));
        Ok(())
    }

    async fn controller_info(&self, network_id: NetworkId) -> Result<ControllerInfo> {
        self.shared.ensure_connected()?;
        let network = self.shared.network.lock();
        if network.network_id != network_id {
            return Err(DriverError::rejected(format!(
                "unknown network {network_id}"
            )));
        }
        Ok(network.controller.clone())
    }
}

/// Handle for scripting a mock driver.
///
/// The handle is cheap to clone and can be moved to other threads to play
/// the role of the driver's event-generation thread.
///
/// # Examples
///
/// ```
/// use zwave_core::{NodeId, NodeKey, NodeRecord, NodeValue, Value, ValueId};
/// use zwave_driver::mock::MockDriver;
///
/// let (_driver, handle) = MockDriver::new();
/// let key = NodeKey::new(handle.network_id(), NodeId::new(4).unwrap());
///
/// handle.add_node(NodeRecord::new(key).with_value(NodeValue::new(
///     ValueId::new(37, 1, 0),
///     "Switch",
///     Value::Bool(false),
/// )));
///
/// assert_eq!(handle.node_count(), 1);
/// ```
#[derive(Clone)]
pub struct MockDriverHandle {
    shared: Arc<Shared>,
}

impl MockDriverHandle {
    pub fn network_id(&self) -> NetworkId {
        self.shared.network_id()
    }

    /// Key of `node_id` on the mock network.
    ///
    /// # Panics
    ///
    /// Panics if `node_id` is outside 1-232. Intended for tests and demos.
    pub fn node_key(&self, node_id: u8) -> NodeKey {
        self.shared
            .key(NodeId::new(node_id).expect("mock node ids must be 1-232"))
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    /// Port passed to the last successful connect, while connected.
    pub fn port(&self) -> Option<String> {
        self.shared.port.lock().clone()
    }

    /// Add a node to the scripted network.
    ///
    /// While connected, the node is also included live: the driver emits
    /// `NodeNew` followed by the full interview.
    pub fn add_node(&self, record: NodeRecord) {
        let mut record = record;
        record.network_id = self.network_id();
        self.shared
            .network
            .lock()
            .nodes
            .insert(record.node_id, record.clone());

        if self.is_connected() {
            self.shared.emit(NotificationRecord::for_node(
                record.key(),
                NotificationPayload::NodeNew,
            ));
            for notification in interview(&record) {
                self.shared.emit(notification);
            }
        }
    }

    /// Remove a node from the scripted network, emitting `NodeRemoved` while connected.
    pub fn remove_node(&self, node_id: NodeId) -> Option<NodeRecord> {
        let removed = self.shared.network.lock().nodes.remove(&node_id);
        if removed.is_some() {
            self.shared.emit(NotificationRecord::for_node(
                self.shared.key(node_id),
                NotificationPayload::NodeRemoved,
            ));
        }
        removed
    }

    /// Report a value change originating at the device.
    pub fn report_value(&self, node_id: NodeId, value: NodeValue) -> bool {
        if let Some(record) = self.shared.network.lock().nodes.get_mut(&node_id) {
            record.put_value(value.clone());
        }
        self.shared.emit(NotificationRecord::for_node(
            self.shared.key(node_id),
            NotificationPayload::ValueChanged(value),
        ))
    }

    /// Report progress of the running controller command.
    ///
    /// A terminal state ends the command, so a later cancel reports nothing.
    pub fn report_controller_state(&self, state: ControllerState, error: ControllerError) -> bool {
        if state.is_terminal() {
            self.shared.running_command.lock().take();
        }
        self.shared.emit(NotificationRecord::for_network(
            self.network_id(),
            NotificationPayload::ControllerCommand { state, error },
        ))
    }

    /// Simulate the controller failing to start.
    pub fn fail_driver(&self) -> bool {
        self.shared.emit(NotificationRecord::for_network(
            self.network_id(),
            NotificationPayload::DriverFailed,
        ))
    }

    /// Deliver an arbitrary record to the watcher. Returns `false` when disconnected.
    pub fn emit(&self, record: NotificationRecord) -> bool {
        self.shared.emit(record)
    }

    /// Make `set_value` fail for one value.
    pub fn fail_value(&self, node: NodeKey, value_id: ValueId) {
        self.shared.failing_values.lock().insert((node, value_id));
    }

    /// Make `begin_controller_command` fail.
    pub fn reject_commands(&self, reject: bool) {
        self.shared.reject_commands.store(reject, Ordering::SeqCst);
    }

    /// Keep calling the old watcher after `disconnect`, like a driver whose
    /// event thread outlives the connection.
    pub fn retain_watcher(&self, retain: bool) {
        self.shared.retain_watcher.store(retain, Ordering::SeqCst);
    }

    /// Control whether accepted `set_value` requests echo back as `ValueChanged`.
    pub fn set_echo_values(&self, echo: bool) {
        self.shared.echo_values.store(echo, Ordering::SeqCst);
    }

    /// Every request the driver received, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.shared.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.shared.calls.lock().clear();
    }

    pub fn node_count(&self) -> usize {
        self.shared.network.lock().nodes.len()
    }

    pub fn poll_interval(&self) -> Duration {
        self.shared.network.lock().poll_interval
    }
}

impl fmt::Debug for MockDriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriverHandle")
            .field("network_id", &self.network_id())
            .field("connected", &self.is_connected())
            .finish()
    }
}
