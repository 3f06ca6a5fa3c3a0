use thiserror::Error;

use crate::command::ControllerCommand;
use crate::scene::SceneId;
use crate::types::{NodeKey, ValueId, ValueType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Registry lookups
    #[error("Node {0} not found")]
    NodeNotFound(NodeKey),

    #[error("Value {value_id} not found on node {node}")]
    ValueNotFound { node: NodeKey, value_id: ValueId },

    #[error("Scene {0} not found")]
    SceneNotFound(SceneId),

    #[error("Scene {scene_id} has no value {value_id} for node {node}")]
    SceneValueNotFound {
        scene_id: SceneId,
        node: NodeKey,
        value_id: ValueId,
    },

    // Controller commands
    #[error("Unknown controller command: {0}")]
    UnknownCommand(String),

    #[error("Controller command {active} already in progress")]
    CommandInProgress { active: ControllerCommand },

    // Event surface
    #[error("Unknown event name: {0}")]
    UnknownEvent(String),

    #[error("Listener for '{event}' failed: {message}")]
    ListenerFailure { event: String, message: String },

    // Values
    #[error("Invalid node id: {0}")]
    InvalidNodeId(u8),

    #[error("Invalid value id: {0}")]
    InvalidValueId(String),

    #[error("Value {value_id} expects {expected}, got {actual}")]
    ValueTypeMismatch {
        value_id: ValueId,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("Value {0} is read-only")]
    ReadOnlyValue(ValueId),

    #[error("Scene {scene_id} value {value_id} on node {node} failed: {reason}")]
    SceneValueFailure {
        scene_id: SceneId,
        node: NodeKey,
        value_id: ValueId,
        reason: String,
    },

    // Driver lifecycle
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Driver already connected")]
    AlreadyConnected,

    #[error("Driver not connected")]
    NotConnected,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
