use crate::{
    Result,
    constants::{MAX_NODE_ID, MIN_NODE_ID, NO_NODE_ID},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identifier (the controller's home id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkId(u32);

impl NetworkId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        NetworkId(id)
    }

    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Node identifier within a network (1-232).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u8);

impl NodeId {
    /// Placeholder id carried by driver-level records.
    pub const NONE: NodeId = NodeId(NO_NODE_ID);

    /// Create a new node id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidNodeId` if the id is outside 1-232.
    pub fn new(id: u8) -> Result<Self> {
        if !(MIN_NODE_ID..=MAX_NODE_ID).contains(&id) {
            return Err(Error::InvalidNodeId(id));
        }
        Ok(NodeId(id))
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns `true` for the placeholder id used by driver-level records.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0 == NO_NODE_ID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidValueId(format!("invalid node id: {s}")))?;
        NodeId::new(id)
    }
}

/// Primary key of a node: (network id, node id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub network_id: NetworkId,
    pub node_id: NodeId,
}

impl NodeKey {
    #[must_use]
    pub const fn new(network_id: NetworkId, node_id: NodeId) -> Self {
        Self {
            network_id,
            node_id,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.network_id, self.node_id)
    }
}

/// Identifies one value exposed by a node.
///
/// Rendered as `class-instance-index`, e.g. `37-1-0` for the state of the
/// first binary switch instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ValueId {
    pub command_class: u8,
    pub instance: u8,
    pub index: u8,
}

impl ValueId {
    #[must_use]
    pub const fn new(command_class: u8, instance: u8, index: u8) -> Self {
        Self {
            command_class,
            instance,
            index,
        }
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}-{}", self.command_class, self.instance, self.index)
    }
}

impl std::str::FromStr for ValueId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidValueId(s.to_string());
        let mut parts = s.split('-');
        let mut next = || -> Result<u8> {
            parts
                .next()
                .ok_or_else(invalid)?
                .trim()
                .parse()
                .map_err(|_| invalid())
        };
        let id = ValueId::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(id)
    }
}

impl From<ValueId> for String {
    fn from(id: ValueId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ValueId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Byte,
    Short,
    Int,
    Decimal,
    String,
    List,
    Button,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Byte => "byte",
            ValueType::Short => "short",
            ValueType::Int => "int",
            ValueType::Decimal => "decimal",
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Button => "button",
        };
        write!(f, "{name}")
    }
}

/// A typed value as reported by, or written to, a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Decimal(f64),
    String(String),
    List { selected: String, items: Vec<String> },
    Button(bool),
}

impl Value {
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Byte(_) => ValueType::Byte,
            Value::Short(_) => ValueType::Short,
            Value::Int(_) => ValueType::Int,
            Value::Decimal(_) => ValueType::Decimal,
            Value::String(_) => ValueType::String,
            Value::List { .. } => ValueType::List,
            Value::Button(_) => ValueType::Button,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(v) | Value::Button(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::List { selected, .. } => write!(f, "{selected}"),
        }
    }
}

/// Snapshot of one value on a node, including its descriptive metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeValue {
    pub id: ValueId,
    pub label: String,
    pub units: String,
    pub read_only: bool,
    pub value: Value,
}

impl NodeValue {
    pub fn new(id: ValueId, label: impl Into<String>, value: Value) -> Self {
        Self {
            id,
            label: label.into(),
            units: String::new(),
            read_only: false,
            value,
        }
    }

    /// Set the units label.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Mark the value as read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }
}
