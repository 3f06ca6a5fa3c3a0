//! Node records held by the node registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{NetworkId, NodeId, NodeKey, NodeValue, ValueId};

/// Descriptive metadata reported for a node.
///
/// Manufacturer and product ids are kept in the driver's `0x....` string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub manufacturer_name: String,
    pub manufacturer_id: String,
    pub product_name: String,
    pub product_type: String,
    pub product_id: String,
    pub node_type: String,
    pub name: String,
    pub location: String,
}

/// Protocol-level capabilities of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCapabilities {
    pub listening: bool,
    pub frequent_listening: bool,
    pub beaming: bool,
    pub routing: bool,
    pub security_device: bool,
    pub max_baud_rate: u32,
    pub version: u8,
    pub security: u8,
    pub basic: u8,
    pub generic: u8,
    pub specific: u8,
}

/// A discovered device and its current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub network_id: NetworkId,
    pub node_id: NodeId,
    pub metadata: NodeMetadata,
    pub capabilities: NodeCapabilities,

    /// Polled values and their poll intensity.
    pub polling: BTreeMap<ValueId, u8>,

    /// Set once the driver has finished querying the node.
    pub ready: bool,

    pub values: BTreeMap<ValueId, NodeValue>,
    pub discovered_at: DateTime<Utc>,
}

impl NodeRecord {
    /// Create an empty record for a freshly discovered node.
    #[must_use]
    pub fn new(key: NodeKey) -> Self {
        Self {
            network_id: key.network_id,
            node_id: key.node_id,
            metadata: NodeMetadata::default(),
            capabilities: NodeCapabilities::default(),
            polling: BTreeMap::new(),
            ready: false,
            values: BTreeMap::new(),
            discovered_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.network_id, self.node_id)
    }

    #[must_use]
    pub fn value(&self, id: ValueId) -> Option<&NodeValue> {
        self.values.get(&id)
    }

    /// Insert or replace a value. Returns `true` if the value was new.
    pub fn put_value(&mut self, value: NodeValue) -> bool {
        self.values.insert(value.id, value).is_none()
    }

    pub fn remove_value(&mut self, id: ValueId) -> Option<NodeValue> {
        self.polling.remove(&id);
        self.values.remove(&id)
    }

    #[must_use]
    pub fn is_polled(&self, id: ValueId) -> bool {
        self.polling.contains_key(&id)
    }

    /// Builder-style helper used by drivers and tests.
    pub fn with_value(mut self, value: NodeValue) -> Self {
        self.put_value(value);
        self
    }

    /// Builder-style helper used by drivers and tests.
    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builder-style helper used by drivers and tests.
    pub fn with_capabilities(mut self, capabilities: NodeCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}
