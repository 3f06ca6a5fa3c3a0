//! Scene registry.
//!
//! Scenes are user-defined presets: a label plus an ordered list of target
//! values. Ids are assigned from a monotonic counter and never recycled, even
//! after a scene is removed or the registry is cleared.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use zwave_core::{Error, NodeKey, Result, SceneEntry, SceneId, SceneRecord, ValueId};
use zwave_driver::NetworkDriver;

/// Outcome of sending one scene entry to the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryOutcome {
    pub entry: SceneEntry,
    pub result: Result<()>,
}

/// Per-entry report of a scene activation.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneActivation {
    pub scene_id: SceneId,
    pub outcomes: Vec<EntryOutcome>,
}

impl SceneActivation {
    /// Returns `true` if every entry was accepted by the driver.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    /// Errors of the entries the driver refused, in entry order.
    pub fn failures(&self) -> impl Iterator<Item = &Error> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err())
    }
}

#[derive(Debug)]
struct Inner {
    next_id: u32,
    scenes: BTreeMap<SceneId, SceneRecord>,
}

#[derive(Debug)]
pub struct SceneRegistry {
    inner: Mutex<Inner>,
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                scenes: BTreeMap::new(),
            }),
        }
    }
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene and return its id.
    pub fn create(&self, label: impl Into<String>) -> SceneId {
        let mut inner = self.inner.lock();
        let id = SceneId::new(inner.next_id);
        inner.next_id += 1;

        let scene = SceneRecord::new(id, label);
        debug!(scene = %id, label = %scene.label, "scene created");
        inner.scenes.insert(id, scene);
        id
    }

    /// Remove a scene.
    ///
    /// # Errors
    /// Returns `Error::SceneNotFound` if no scene has this id.
    pub fn remove(&self, id: SceneId) -> Result<SceneRecord> {
        self.inner
            .lock()
            .scenes
            .remove(&id)
            .ok_or(Error::SceneNotFound(id))
    }

    pub fn get(&self, id: SceneId) -> Result<SceneRecord> {
        self.inner
            .lock()
            .scenes
            .get(&id)
            .cloned()
            .ok_or(Error::SceneNotFound(id))
    }

    /// Add a target value to a scene, replacing the target if the same
    /// node value is already part of it.
    pub fn add_value(&self, id: SceneId, entry: SceneEntry) -> Result<()> {
        let mut inner = self.inner.lock();
        let scene = inner.scenes.get_mut(&id).ok_or(Error::SceneNotFound(id))?;
        scene.put_entry(entry);
        Ok(())
    }

    /// Remove one node value from a scene.
    ///
    /// # Errors
    /// Returns `Error::SceneNotFound` for an unknown scene and
    /// `Error::SceneValueNotFound` if the value is not part of it.
    pub fn remove_value(&self, id: SceneId, node: NodeKey, value_id: ValueId) -> Result<SceneEntry> {
        let mut inner = self.inner.lock();
        let scene = inner.scenes.get_mut(&id).ok_or(Error::SceneNotFound(id))?;
        scene
            .remove_entry(node, value_id)
            .ok_or(Error::SceneValueNotFound {
                scene_id: id,
                node,
                value_id,
            })
    }

    /// Snapshot of every scene, ordered by id.
    pub fn list(&self) -> Vec<SceneRecord> {
        self.inner.lock().scenes.values().cloned().collect()
    }

    /// Entries of one scene, in insertion order.
    pub fn values(&self, id: SceneId) -> Result<Vec<SceneEntry>> {
        self.get(id).map(|scene| scene.entries)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().scenes.is_empty()
    }

    /// Drop every scene. The id counter keeps running.
    pub fn clear(&self) {
        self.inner.lock().scenes.clear();
    }

    /// Send every entry of a scene to the driver, one set-value each.
    ///
    /// The entries are snapshotted first; the registry lock is not held
    /// while the driver is called. An entry the driver refuses does not stop
    /// the remaining ones.
    ///
    /// # Errors
    /// Returns `Error::SceneNotFound` for an unknown scene. Per-entry
    /// failures are reported in the returned [`SceneActivation`].
    pub async fn activate<D: NetworkDriver>(&self, id: SceneId, driver: &D) -> Result<SceneActivation> {
        let entries = self.values(id)?;
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in entries {
            let result = driver
                .set_value(entry.node, entry.value_id, &entry.target)
                .await
                .map_err(|error| {
                    warn!(scene = %id, node = %entry.node, value = %entry.value_id, %error, "scene value refused");
                    Error::SceneValueFailure {
                        scene_id: id,
                        node: entry.node,
                        value_id: entry.value_id,
                        reason: error.to_string(),
                    }
                });
            outcomes.push(EntryOutcome { entry, result });
        }

        let activation = SceneActivation {
            scene_id: id,
            outcomes,
        };
        info!(
            scene = %id,
            entries = activation.outcomes.len(),
            failed = activation.failures().count(),
            "scene activated"
        );
        Ok(activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zwave_core::{NetworkId, NodeId, Value};

    fn node(id: u8) -> NodeKey {
        NodeKey::new(NetworkId::new(1), NodeId::new(id).unwrap())
    }

    #[test]
    fn test_ids_are_never_recycled() {
        let scenes = SceneRegistry::new();
        let first = scenes.create("Morning");
        let second = scenes.create("Evening");
        scenes.remove(second).unwrap();
        scenes.clear();

        let third = scenes.create("Away");
        assert_eq!(first, SceneId::new(1));
        assert_eq!(second, SceneId::new(2));
        assert_eq!(third, SceneId::new(3));
    }

    #[test]
    fn test_add_two_remove_one() {
        let scenes = SceneRegistry::new();
        let id = scenes.create("Evening");
        let dimmer = ValueId::new(38, 1, 0);
        let switch = ValueId::new(37, 1, 0);

        scenes
            .add_value(id, SceneEntry::new(node(2), dimmer, Value::Byte(30)))
            .unwrap();
        scenes
            .add_value(id, SceneEntry::new(node(3), switch, Value::Bool(true)))
            .unwrap();
        scenes.remove_value(id, node(2), dimmer).unwrap();

        let listed = scenes.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].label, "Evening");
        assert_eq!(
            listed[0].entries,
            vec![SceneEntry::new(node(3), switch, Value::Bool(true))]
        );
    }

    #[test]
    fn test_unknown_scene_and_value() {
        let scenes = SceneRegistry::new();
        let missing = SceneId::new(42);
        assert_eq!(scenes.remove(missing), Err(Error::SceneNotFound(missing)));
        assert_eq!(scenes.values(missing), Err(Error::SceneNotFound(missing)));

        let id = scenes.create("Empty");
        let value_id = ValueId::new(37, 1, 0);
        assert_eq!(
            scenes.remove_value(id, node(2), value_id),
            Err(Error::SceneValueNotFound {
                scene_id: id,
                node: node(2),
                value_id,
            })
        );
        assert_eq!(scenes.len(), 1);
    }

    #[test]
    fn test_add_value_to_unknown_scene_is_rejected() {
        let scenes = SceneRegistry::new();
        let result = scenes.add_value(
            SceneId::new(9),
            SceneEntry::new(node(2), ValueId::new(37, 1, 0), Value::Bool(true)),
        );
        assert_eq!(result, Err(Error::SceneNotFound(SceneId::new(9))));
        assert!(scenes.is_empty());
    }
}
