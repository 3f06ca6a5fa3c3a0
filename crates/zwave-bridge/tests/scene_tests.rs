//! Integration tests for scenes through the `ZWave` context.

mod common;

use common::{DIMMER, SWITCH, TEMPERATURE, connected};
use zwave_core::{Error, SceneEntry, SceneId, Value, ValueType};
use zwave_driver::DriverCall;

#[tokio::test]
async fn test_create_add_remove_list() {
    let (zwave, handle) = connected(&[2, 3]).await;
    let (porch, hall) = (handle.node_key(2), handle.node_key(3));

    let scene = zwave.create_scene("Evening");
    zwave
        .add_scene_value(scene, porch, DIMMER, Value::Byte(30))
        .unwrap();
    zwave
        .add_scene_value(scene, hall, SWITCH, Value::Bool(true))
        .unwrap();
    zwave.remove_scene_value(scene, porch, DIMMER).unwrap();

    let scenes = zwave.scenes();
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].id, scene);
    assert_eq!(scenes[0].label, "Evening");
    assert_eq!(
        zwave.scene_values(scene).unwrap(),
        vec![SceneEntry::new(hall, SWITCH, Value::Bool(true))]
    );
}

#[tokio::test]
async fn test_scene_value_validation() {
    let (zwave, handle) = connected(&[2]).await;
    let node = handle.node_key(2);
    let scene = zwave.create_scene("Broken");

    assert_eq!(
        zwave.add_scene_value(scene, handle.node_key(40), SWITCH, Value::Bool(true)),
        Err(Error::NodeNotFound(handle.node_key(40)))
    );
    assert_eq!(
        zwave.add_scene_value(scene, node, SWITCH, Value::Byte(1)),
        Err(Error::ValueTypeMismatch {
            value_id: SWITCH,
            expected: ValueType::Bool,
            actual: ValueType::Byte,
        })
    );
    assert_eq!(
        zwave.add_scene_value(SceneId::new(77), node, SWITCH, Value::Bool(true)),
        Err(Error::SceneNotFound(SceneId::new(77)))
    );
    assert!(zwave.scene_values(scene).unwrap().is_empty());
}

#[tokio::test]
async fn test_activation_reports_each_entry() {
    let (zwave, handle) = connected(&[2, 3]).await;
    let (porch, hall) = (handle.node_key(2), handle.node_key(3));
    handle.fail_value(hall, SWITCH);

    let scene = zwave.create_scene("Away");
    zwave
        .add_scene_value(scene, porch, SWITCH, Value::Bool(true))
        .unwrap();
    zwave
        .add_scene_value(scene, hall, SWITCH, Value::Bool(false))
        .unwrap();
    zwave
        .add_scene_value(scene, porch, DIMMER, Value::Byte(80))
        .unwrap();
    handle.clear_calls();

    let activation = zwave.activate_scene(scene).await.unwrap();

    assert!(!activation.is_success());
    assert_eq!(activation.outcomes.len(), 3);
    assert!(activation.outcomes[0].result.is_ok());
    assert!(matches!(
        activation.outcomes[1].result,
        Err(Error::SceneValueFailure { node, value_id, .. }) if node == hall && value_id == SWITCH
    ));
    assert!(activation.outcomes[2].result.is_ok());
    assert_eq!(activation.failures().count(), 1);

    let sent: Vec<_> = handle
        .calls()
        .into_iter()
        .filter(|call| matches!(call, DriverCall::SetValue { .. }))
        .collect();
    assert_eq!(sent.len(), 3);
}

#[tokio::test]
async fn test_read_only_value_can_still_be_a_scene_target() {
    // Scene targets are type-checked only.
    let (zwave, handle) = connected(&[2]).await;
    let scene = zwave.create_scene("Sensors");

    zwave
        .add_scene_value(scene, handle.node_key(2), TEMPERATURE, Value::Decimal(19.0))
        .unwrap();
    assert_eq!(zwave.scene_values(scene).unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_unknown_scene() {
    let (zwave, _handle) = connected(&[]).await;
    let scene = zwave.create_scene("Temp");
    zwave.remove_scene(scene).unwrap();

    assert_eq!(zwave.remove_scene(scene), Err(Error::SceneNotFound(scene)));
    assert_eq!(
        zwave.activate_scene(scene).await.map(|_| ()),
        Err(Error::SceneNotFound(scene))
    );
    assert_ne!(zwave.create_scene("Next"), scene);
}
