//! Node registry.
//!
//! The authoritative in-memory view of every node the driver has reported,
//! keyed by `(network_id, node_id)`. The bridge task mutates it from
//! notification records; the `ZWave` context reads and patches it from
//! caller-facing operations. A single registry-wide lock guards the map and
//! is never held while calling into the driver or into listeners.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, trace};
use zwave_core::constants::DEFAULT_POLL_INTENSITY;
use zwave_core::{Error, NetworkId, NodeKey, NodeRecord, NotificationPayload, NotificationRecord, Result};

#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Mutex<BTreeMap<NodeKey, NodeRecord>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any record with the same key in place.
    ///
    /// Returns the replaced record.
    pub fn upsert(&self, record: NodeRecord) -> Option<NodeRecord> {
        self.nodes.lock().insert(record.key(), record)
    }

    /// Remove a node.
    ///
    /// # Errors
    /// Returns `Error::NodeNotFound` if the node is not registered.
    pub fn remove(&self, key: NodeKey) -> Result<NodeRecord> {
        self.nodes.lock().remove(&key).ok_or(Error::NodeNotFound(key))
    }

    /// Snapshot of one node.
    ///
    /// # Errors
    /// Returns `Error::NodeNotFound` if the node is not registered.
    pub fn get(&self, key: NodeKey) -> Result<NodeRecord> {
        self.read(key, NodeRecord::clone)
    }

    /// Snapshot of every node, ordered by key.
    pub fn list(&self) -> Vec<NodeRecord> {
        self.nodes.lock().values().cloned().collect()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.lock().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    /// Project a value out of one node without cloning the record.
    pub fn read<R>(&self, key: NodeKey, f: impl FnOnce(&NodeRecord) -> R) -> Result<R> {
        self.nodes
            .lock()
            .get(&key)
            .map(f)
            .ok_or(Error::NodeNotFound(key))
    }

    /// Mutate one node in place.
    pub fn update<R>(&self, key: NodeKey, f: impl FnOnce(&mut NodeRecord) -> R) -> Result<R> {
        self.nodes
            .lock()
            .get_mut(&key)
            .map(f)
            .ok_or(Error::NodeNotFound(key))
    }

    /// Drop every node of one network. Returns how many were removed.
    pub fn clear_network(&self, network_id: NetworkId) -> usize {
        let mut nodes = self.nodes.lock();
        let before = nodes.len();
        nodes.retain(|key, _| key.network_id != network_id);
        before - nodes.len()
    }

    pub fn clear(&self) {
        self.nodes.lock().clear();
    }

    /// Apply the registry mutation a notification implies.
    ///
    /// Records whose kind requires a node fail with `Error::NodeNotFound`
    /// when that node was never registered; the registry is left untouched
    /// in that case.
    pub fn apply(&self, record: &NotificationRecord) -> Result<()> {
        let key = record.node_key();
        let mut nodes = self.nodes.lock();
        if record.kind().requires_node() && !nodes.contains_key(&key) {
            return Err(Error::NodeNotFound(key));
        }

        match &record.payload {
            NotificationPayload::NodeNew => {
                nodes.entry(key).or_insert_with(|| NodeRecord::new(key));
                trace!(node = %key, "node discovered");
            }
            NotificationPayload::NodeAdded => {
                if nodes.insert(key, NodeRecord::new(key)).is_some() {
                    debug!(node = %key, "node re-added, previous record replaced");
                }
            }
            NotificationPayload::NodeRemoved => {
                nodes.remove(&key);
            }
            NotificationPayload::NodeNaming(metadata) => {
                with_node(&mut nodes, key, |node| node.metadata = metadata.clone());
            }
            NotificationPayload::NodeProtocolInfo(capabilities) => {
                with_node(&mut nodes, key, |node| node.capabilities = *capabilities);
            }
            NotificationPayload::NodeQueriesComplete => {
                with_node(&mut nodes, key, |node| node.ready = true);
            }
            NotificationPayload::ValueAdded(value)
            | NotificationPayload::ValueChanged(value)
            | NotificationPayload::ValueRefreshed(value) => {
                with_node(&mut nodes, key, |node| {
                    node.put_value(value.clone());
                });
            }
            NotificationPayload::ValueRemoved(value_id) => {
                with_node(&mut nodes, key, |node| {
                    node.remove_value(*value_id);
                });
            }
            NotificationPayload::PollingEnabled(value_id) => {
                with_node(&mut nodes, key, |node| {
                    node.polling
                        .entry(*value_id)
                        .or_insert(DEFAULT_POLL_INTENSITY);
                });
            }
            NotificationPayload::PollingDisabled(value_id) => {
                with_node(&mut nodes, key, |node| {
                    node.polling.remove(value_id);
                });
            }
            NotificationPayload::DriverReset => {
                drop(nodes);
                let dropped = self.clear_network(record.network_id);
                debug!(network = %record.network_id, dropped, "network reset");
            }
            NotificationPayload::NodeEvent(_)
            | NotificationPayload::SceneEvent(_)
            | NotificationPayload::Notification(_)
            | NotificationPayload::ControllerCommand { .. }
            | NotificationPayload::DriverReady
            | NotificationPayload::DriverFailed
            | NotificationPayload::DriverRemoved
            | NotificationPayload::AwakeNodesQueried
            | NotificationPayload::AllNodesQueried => {}
        }
        Ok(())
    }
}

fn with_node(nodes: &mut BTreeMap<NodeKey, NodeRecord>, key: NodeKey, f: impl FnOnce(&mut NodeRecord)) {
    if let Some(node) = nodes.get_mut(&key) {
        f(node);
    }
}
