//! Common types shared across driver implementations.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zwave_core::{NodeId, NotificationRecord};

/// Callback the driver invokes, from its own thread, for every event.
///
/// The bridge installs a watcher that appends to its notification queue;
/// the callback must return quickly and must not block.
pub type NotificationWatcher = Arc<dyn Fn(NotificationRecord) + Send + Sync>;

/// Information about the controller a driver is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInfo {
    /// Node id of the controller itself.
    pub node_id: NodeId,

    /// Node id of the static update controller, if the network has one.
    pub suc_node_id: Option<NodeId>,

    pub is_primary: bool,
    pub is_static_update: bool,
    pub is_bridge: bool,

    /// Controller library version string (e.g. "Z-Wave 4.54").
    pub library_version: String,

    /// Controller library type (e.g. "Static Controller").
    pub library_type_name: String,

    /// Messages waiting in the driver's send queue.
    pub send_queue_count: u32,
}

impl ControllerInfo {
    /// Create a new ControllerInfo for a primary controller.
    pub fn new(node_id: NodeId, library_version: impl Into<String>) -> Self {
        Self {
            node_id,
            suc_node_id: None,
            is_primary: true,
            is_static_update: false,
            is_bridge: false,
            library_version: library_version.into(),
            library_type_name: "Static Controller".to_string(),
            send_queue_count: 0,
        }
    }

    /// Set the static update controller node id.
    pub fn with_suc_node_id(mut self, suc: NodeId) -> Self {
        self.suc_node_id = Some(suc);
        self
    }

    /// Set the library type name.
    pub fn with_library_type_name(mut self, name: impl Into<String>) -> Self {
        self.library_type_name = name.into();
        self
    }
}
