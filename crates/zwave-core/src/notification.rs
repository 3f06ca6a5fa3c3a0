//! Notification records emitted by the driver.
//!
//! The driver's event-generation thread produces one [`NotificationRecord`]
//! per event. Each record names the network and node it concerns and carries
//! a typed [`NotificationPayload`]; the payload variant determines the
//! record's [`NotificationKind`], so a kind can never arrive with the wrong
//! data attached.
//!
//! # Examples
//!
//! ```
//! use zwave_core::{NetworkId, NodeId, NotificationKind, NotificationPayload, NotificationRecord};
//!
//! let record = NotificationRecord::new(
//!     NetworkId::new(0x0184_2b6a),
//!     NodeId::new(5).unwrap(),
//!     NotificationPayload::NodeAdded,
//! );
//!
//! assert_eq!(record.kind(), NotificationKind::NodeAdded);
//! assert_eq!(record.kind().event_name(), "node added");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::command::{ControllerError, ControllerState};
use crate::node::{NodeCapabilities, NodeMetadata};
use crate::types::{NetworkId, NodeId, NodeKey, NodeValue, ValueId};
use crate::{Error, Result};

/// Kind of a notification, used to route records to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NodeNew,
    NodeAdded,
    NodeRemoved,
    NodeNaming,
    NodeProtocolInfo,
    NodeEvent,
    NodeQueriesComplete,
    ValueAdded,
    ValueChanged,
    ValueRefreshed,
    ValueRemoved,
    PollingEnabled,
    PollingDisabled,
    SceneEvent,
    Notification,
    ControllerCommand,
    DriverReady,
    DriverFailed,
    DriverReset,
    DriverRemoved,
    AwakeNodesQueried,
    AllNodesQueried,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 22] = [
        NotificationKind::NodeNew,
        NotificationKind::NodeAdded,
        NotificationKind::NodeRemoved,
        NotificationKind::NodeNaming,
        NotificationKind::NodeProtocolInfo,
        NotificationKind::NodeEvent,
        NotificationKind::NodeQueriesComplete,
        NotificationKind::ValueAdded,
        NotificationKind::ValueChanged,
        NotificationKind::ValueRefreshed,
        NotificationKind::ValueRemoved,
        NotificationKind::PollingEnabled,
        NotificationKind::PollingDisabled,
        NotificationKind::SceneEvent,
        NotificationKind::Notification,
        NotificationKind::ControllerCommand,
        NotificationKind::DriverReady,
        NotificationKind::DriverFailed,
        NotificationKind::DriverReset,
        NotificationKind::DriverRemoved,
        NotificationKind::AwakeNodesQueried,
        NotificationKind::AllNodesQueried,
    ];

    /// Event name listeners subscribe to.
    pub fn event_name(&self) -> &'static str {
        match self {
            NotificationKind::NodeNew => "node new",
            NotificationKind::NodeAdded => "node added",
            NotificationKind::NodeRemoved => "node removed",
            NotificationKind::NodeNaming => "node naming",
            NotificationKind::NodeProtocolInfo => "node protocol info",
            NotificationKind::NodeEvent => "node event",
            NotificationKind::NodeQueriesComplete => "node ready",
            NotificationKind::ValueAdded => "value added",
            NotificationKind::ValueChanged => "value changed",
            NotificationKind::ValueRefreshed => "value refreshed",
            NotificationKind::ValueRemoved => "value removed",
            NotificationKind::PollingEnabled => "polling enabled",
            NotificationKind::PollingDisabled => "polling disabled",
            NotificationKind::SceneEvent => "scene event",
            NotificationKind::Notification => "notification",
            NotificationKind::ControllerCommand => "controller command",
            NotificationKind::DriverReady => "driver ready",
            NotificationKind::DriverFailed => "driver failed",
            NotificationKind::DriverReset => "driver reset",
            NotificationKind::DriverRemoved => "driver removed",
            NotificationKind::AwakeNodesQueried => "awake nodes queried",
            NotificationKind::AllNodesQueried => "scan complete",
        }
    }

    /// Look up a kind by its event name.
    ///
    /// # Errors
    /// Returns `Error::UnknownEvent` for names outside the event surface.
    pub fn from_event_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.event_name() == name)
            .ok_or_else(|| Error::UnknownEvent(name.to_string()))
    }

    /// Returns `true` if records of this kind only make sense for a node
    /// already present in the node registry.
    pub fn requires_node(&self) -> bool {
        matches!(
            self,
            NotificationKind::NodeRemoved
                | NotificationKind::NodeNaming
                | NotificationKind::NodeProtocolInfo
                | NotificationKind::NodeEvent
                | NotificationKind::NodeQueriesComplete
                | NotificationKind::ValueAdded
                | NotificationKind::ValueChanged
                | NotificationKind::ValueRefreshed
                | NotificationKind::ValueRemoved
                | NotificationKind::PollingEnabled
                | NotificationKind::PollingDisabled
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Status codes carried by generic `Notification` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NotificationCode {
    MsgComplete = 0,
    Timeout = 1,
    NoOperation = 2,
    Awake = 3,
    Sleep = 4,
    Dead = 5,
    Alive = 6,
}

/// Data carried by a notification. The variant determines the record's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum NotificationPayload {
    NodeNew,
    NodeAdded,
    NodeRemoved,
    NodeNaming(NodeMetadata),
    NodeProtocolInfo(NodeCapabilities),
    NodeEvent(u8),
    NodeQueriesComplete,
    ValueAdded(NodeValue),
    ValueChanged(NodeValue),
    ValueRefreshed(NodeValue),
    ValueRemoved(ValueId),
    PollingEnabled(ValueId),
    PollingDisabled(ValueId),
    SceneEvent(u8),
    Notification(NotificationCode),
    ControllerCommand {
        state: ControllerState,
        error: ControllerError,
    },
    DriverReady,
    DriverFailed,
    DriverReset,
    DriverRemoved,
    AwakeNodesQueried,
    AllNodesQueried,
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::NodeNew => NotificationKind::NodeNew,
            NotificationPayload::NodeAdded => NotificationKind::NodeAdded,
            NotificationPayload::NodeRemoved => NotificationKind::NodeRemoved,
            NotificationPayload::NodeNaming(_) => NotificationKind::NodeNaming,
            NotificationPayload::NodeProtocolInfo(_) => NotificationKind::NodeProtocolInfo,
            NotificationPayload::NodeEvent(_) => NotificationKind::NodeEvent,
            NotificationPayload::NodeQueriesComplete => NotificationKind::NodeQueriesComplete,
            NotificationPayload::ValueAdded(_) => NotificationKind::ValueAdded,
            NotificationPayload::ValueChanged(_) => NotificationKind::ValueChanged,
            NotificationPayload::ValueRefreshed(_) => NotificationKind::ValueRefreshed,
            NotificationPayload::ValueRemoved(_) => NotificationKind::ValueRemoved,
            NotificationPayload::PollingEnabled(_) => NotificationKind::PollingEnabled,
            NotificationPayload::PollingDisabled(_) => NotificationKind::PollingDisabled,
            NotificationPayload::SceneEvent(_) => NotificationKind::SceneEvent,
            NotificationPayload::Notification(_) => NotificationKind::Notification,
            NotificationPayload::ControllerCommand { .. } => NotificationKind::ControllerCommand,
            NotificationPayload::DriverReady => NotificationKind::DriverReady,
            NotificationPayload::DriverFailed => NotificationKind::DriverFailed,
            NotificationPayload::DriverReset => NotificationKind::DriverReset,
            NotificationPayload::DriverRemoved => NotificationKind::DriverRemoved,
            NotificationPayload::AwakeNodesQueried => NotificationKind::AwakeNodesQueried,
            NotificationPayload::AllNodesQueried => NotificationKind::AllNodesQueried,
        }
    }
}

/// One driver event, immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub network_id: NetworkId,
    pub node_id: NodeId,
    pub payload: NotificationPayload,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(network_id: NetworkId, node_id: NodeId, payload: NotificationPayload) -> Self {
        Self {
            network_id,
            node_id,
            payload,
            created_at: Utc::now(),
        }
    }

    /// Record about a single node.
    pub fn for_node(key: NodeKey, payload: NotificationPayload) -> Self {
        Self::new(key.network_id, key.node_id, payload)
    }

    /// Driver-level record not tied to a node.
    pub fn for_network(network_id: NetworkId, payload: NotificationPayload) -> Self {
        Self::new(network_id, NodeId::NONE, payload)
    }

    pub fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }

    pub fn node_key(&self) -> NodeKey {
        NodeKey::new(self.network_id, self.node_id)
    }
}
