//! Scene records held by the scene registry.
//!
//! A scene is a labelled, ordered list of target values across one or more
//! nodes. Each (node, value id) pair appears at most once in a scene; adding
//! the same pair again replaces its target in place.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{NodeKey, Value, ValueId};

/// Scene identifier, assigned by the scene registry and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SceneId(u32);

impl SceneId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        SceneId(id)
    }

    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One target value inside a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    pub node: NodeKey,
    pub value_id: ValueId,
    pub target: Value,
}

impl SceneEntry {
    pub fn new(node: NodeKey, value_id: ValueId, target: Value) -> Self {
        Self {
            node,
            value_id,
            target,
        }
    }

    fn matches(&self, node: NodeKey, value_id: ValueId) -> bool {
        self.node == node && self.value_id == value_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub id: SceneId,
    pub label: String,
    pub entries: Vec<SceneEntry>,
}

impl SceneRecord {
    pub fn new(id: SceneId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn entry(&self, node: NodeKey, value_id: ValueId) -> Option<&SceneEntry> {
        self.entries.iter().find(|e| e.matches(node, value_id))
    }

    /// Add an entry, or replace the target of an existing one keeping its position.
    pub fn put_entry(&mut self, entry: SceneEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.matches(entry.node, entry.value_id))
        {
            Some(existing) => existing.target = entry.target,
            None => self.entries.push(entry),
        }
    }

    /// Remove an entry. Returns the removed entry, if any.
    pub fn remove_entry(&mut self, node: NodeKey, value_id: ValueId) -> Option<SceneEntry> {
        let pos = self.entries.iter().position(|e| e.matches(node, value_id))?;
        Some(self.entries.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NetworkId, NodeId};

    fn node(id: u8) -> NodeKey {
        NodeKey::new(NetworkId::new(1), NodeId::new(id).unwrap())
    }

    #[test]
    fn test_put_entry_keeps_order_and_replaces() {
        let mut scene = SceneRecord::new(SceneId::new(1), "Evening");
        let a = ValueId::new(38, 1, 0);
        let b = ValueId::new(37, 1, 0);

        scene.put_entry(SceneEntry::new(node(2), a, Value::Byte(40)));
        scene.put_entry(SceneEntry::new(node(3), b, Value::Bool(true)));
        scene.put_entry(SceneEntry::new(node(2), a, Value::Byte(10)));

        assert_eq!(scene.entries.len(), 2);
        assert_eq!(scene.entries[0].target, Value::Byte(10));
        assert_eq!(scene.entries[1].node, node(3));
    }

    #[test]
    fn test_remove_entry() {
        let mut scene = SceneRecord::new(SceneId::new(7), "Away");
        let id = ValueId::new(37, 1, 0);
        scene.put_entry(SceneEntry::new(node(4), id, Value::Bool(false)));

        assert!(scene.remove_entry(node(5), id).is_none());
        assert!(scene.remove_entry(node(4), id).is_some());
        assert!(scene.entries.is_empty());
    }
}
