//! Integration tests for the `ZWave` lifecycle and pass-through operations.

mod common;

use common::{DIMMER, PORT, SWITCH, TEMPERATURE, connected, next_of, wait_until};
use std::time::Duration;
use zwave_bridge::{DriverOptions, ZWave};
use zwave_core::{
    Error, NodeId, NotificationKind, NotificationPayload, NotificationRecord, Value, ValueId,
    ValueType,
};
use zwave_driver::{DriverCall, MockDriver};

#[tokio::test]
async fn test_connect_twice_is_rejected() {
    let (mut zwave, _handle) = connected(&[2]).await;

    assert_eq!(zwave.connect(PORT).await, Err(Error::AlreadyConnected));
    assert!(zwave.is_connected());
}

#[tokio::test]
async fn test_disconnect_without_connect() {
    let (driver, _handle) = MockDriver::new();
    let mut zwave = ZWave::new(DriverOptions::default(), driver);

    assert_eq!(zwave.disconnect().await, Err(Error::NotConnected));
}

#[tokio::test]
async fn test_failed_connect_leaves_context_disconnected() {
    let (driver, _handle) = MockDriver::new();
    let mut zwave = ZWave::new(DriverOptions::default(), driver);

    assert!(matches!(zwave.connect("").await, Err(Error::Driver(_))));
    assert!(!zwave.is_connected());
    zwave.connect(PORT).await.unwrap();
}

#[tokio::test]
async fn test_disconnect_clears_state() {
    let (mut zwave, handle) = connected(&[2, 3]).await;
    zwave.create_scene("Evening");
    zwave
        .begin_controller_command("AddDevice", NodeId::NONE, true)
        .await
        .unwrap();

    zwave.disconnect().await.unwrap();

    assert!(!zwave.is_connected());
    assert!(zwave.nodes().is_empty());
    assert!(zwave.scenes().is_empty());
    assert_eq!(zwave.active_controller_command(), None);
    assert_eq!(zwave.network_id(), None);
    assert!(!handle.is_connected());
}

#[tokio::test]
async fn test_reconnect_rediscovers_network() {
    let (mut zwave, _handle) = connected(&[2, 3]).await;
    zwave.disconnect().await.unwrap();

    let mut rx = zwave.subscribe();
    zwave.connect(PORT).await.unwrap();
    next_of(&mut rx, NotificationKind::AllNodesQueried).await;

    assert_eq!(zwave.nodes().len(), 2);
}

#[tokio::test]
async fn test_late_driver_records_do_not_reach_next_session() {
    let (mut zwave, handle) = connected(&[2, 3]).await;
    handle.retain_watcher(true);
    zwave.disconnect().await.unwrap();

    let ghost = handle.node_key(9);
    assert!(handle.emit(NotificationRecord::for_node(ghost, NotificationPayload::NodeAdded)));

    let mut rx = zwave.subscribe();
    zwave.connect(PORT).await.unwrap();
    next_of(&mut rx, NotificationKind::AllNodesQueried).await;

    assert_eq!(zwave.nodes().len(), 2);
    assert!(zwave.nodes().iter().all(|node| node.key() != ghost));
}

#[tokio::test]
async fn test_set_value_validation() {
    let (zwave, handle) = connected(&[2]).await;
    let node = handle.node_key(2);
    handle.clear_calls();

    assert_eq!(
        zwave.set_value(handle.node_key(50), SWITCH, Value::Bool(true)).await,
        Err(Error::NodeNotFound(handle.node_key(50)))
    );
    let missing = ValueId::new(112, 1, 3);
    assert_eq!(
        zwave.set_value(node, missing, Value::Int(1)).await,
        Err(Error::ValueNotFound {
            node,
            value_id: missing
        })
    );
    assert_eq!(
        zwave.set_value(node, TEMPERATURE, Value::Decimal(30.0)).await,
        Err(Error::ReadOnlyValue(TEMPERATURE))
    );
    assert_eq!(
        zwave.set_value(node, DIMMER, Value::Bool(true)).await,
        Err(Error::ValueTypeMismatch {
            value_id: DIMMER,
            expected: ValueType::Byte,
            actual: ValueType::Bool,
        })
    );
    assert!(handle.calls().is_empty());
}

#[tokio::test]
async fn test_set_value_is_reflected_through_queue() {
    let (zwave, handle) = connected(&[2]).await;
    let node = handle.node_key(2);

    zwave.set_value(node, DIMMER, Value::Byte(55)).await.unwrap();
    wait_until(|| zwave.value(node, DIMMER) == Ok(Value::Byte(55))).await;
}

#[tokio::test]
async fn test_node_metadata_setters() {
    let (zwave, handle) = connected(&[2]).await;
    let node = handle.node_key(2);

    zwave.set_node_name(node, "Porch light").await.unwrap();
    zwave.set_node_location(node, "Front door").await.unwrap();
    zwave.set_node_manufacturer_name(node, "Acme").await.unwrap();
    zwave.set_node_product_name(node, "Dimmer X").await.unwrap();

    assert_eq!(zwave.node_name(node).unwrap(), "Porch light");
    assert_eq!(zwave.node_location(node).unwrap(), "Front door");
    assert_eq!(zwave.node_manufacturer_name(node).unwrap(), "Acme");
    assert_eq!(zwave.node_product_name(node).unwrap(), "Dimmer X");
    assert_eq!(zwave.node_manufacturer_id(node).unwrap(), "0x0086");

    let unknown = handle.node_key(200);
    assert_eq!(
        zwave.set_node_name(unknown, "Ghost").await,
        Err(Error::NodeNotFound(unknown))
    );
    assert_eq!(zwave.node_type(unknown), Err(Error::NodeNotFound(unknown)));
    assert_eq!(zwave.node_generic(unknown), Err(Error::NodeNotFound(unknown)));
}

#[tokio::test]
async fn test_polling() {
    let (zwave, handle) = connected(&[2]).await;
    let node = handle.node_key(2);

    assert!(!zwave.is_polled(node, TEMPERATURE).unwrap());
    zwave.enable_poll(node, TEMPERATURE, 2).await.unwrap();
    assert!(zwave.is_polled(node, TEMPERATURE).unwrap());
    assert_eq!(zwave.poll_intensity(node, TEMPERATURE).unwrap(), Some(2));

    zwave.set_poll_intensity(node, TEMPERATURE, 5).await.unwrap();
    assert_eq!(zwave.poll_intensity(node, TEMPERATURE).unwrap(), Some(5));

    // Not polled: the driver still receives the intensity.
    handle.clear_calls();
    zwave.set_poll_intensity(node, SWITCH, 3).await.unwrap();
    assert_eq!(
        handle.calls(),
        vec![DriverCall::SetPollIntensity {
            node,
            value_id: SWITCH,
            intensity: 3,
        }]
    );
    assert_eq!(zwave.poll_intensity(node, SWITCH).unwrap(), None);
    assert_eq!(
        zwave.set_poll_intensity(node, ValueId::new(112, 1, 7), 3).await,
        Err(Error::ValueNotFound {
            node,
            value_id: ValueId::new(112, 1, 7)
        })
    );

    zwave.disable_poll(node, TEMPERATURE).await.unwrap();
    wait_until(|| zwave.is_polled(node, TEMPERATURE) == Ok(false)).await;
}

#[tokio::test]
async fn test_poll_interval() {
    let (driver, handle) = MockDriver::new();
    let (options, warnings) =
        DriverOptions::from_json_value(&serde_json::json!({ "PollInterval": 1_000 })).unwrap();
    assert!(warnings.is_empty());
    let mut zwave = ZWave::new(options, driver);
    zwave.connect(PORT).await.unwrap();

    assert_eq!(zwave.poll_interval(), Duration::from_secs(1));
    zwave
        .set_poll_interval(Duration::from_millis(250))
        .await
        .unwrap();
    assert_eq!(zwave.poll_interval(), Duration::from_millis(250));
    assert_eq!(handle.poll_interval(), Duration::from_millis(250));
}

#[tokio::test]
async fn test_hard_reset_forgets_nodes() {
    let (zwave, handle) = connected(&[2, 3, 4]).await;
    let mut rx = zwave.subscribe();

    zwave.hard_reset().await.unwrap();
    next_of(&mut rx, NotificationKind::DriverReset).await;

    assert!(zwave.nodes().is_empty());
    assert_eq!(zwave.network_id(), Some(handle.network_id()));
}

#[tokio::test]
async fn test_network_operations() {
    let (zwave, handle) = connected(&[2]).await;
    let node = handle.node_key(2);
    handle.clear_calls();

    zwave.heal_network_node(node, true).await.unwrap();
    zwave.heal_network(false).await.unwrap();
    zwave.soft_reset().await.unwrap();
    zwave.request_node_state(node).await.unwrap();

    assert_eq!(
        handle.calls(),
        vec![
            DriverCall::HealNetworkNode {
                node,
                return_routes: true
            },
            DriverCall::HealNetwork {
                network_id: handle.network_id(),
                return_routes: false
            },
            DriverCall::SoftReset(handle.network_id()),
            DriverCall::RequestNodeState(node),
        ]
    );

    let info = zwave.controller_info().await.unwrap();
    assert!(info.is_primary);
}

#[tokio::test]
async fn test_network_operations_need_ready_driver() {
    let (driver, _handle) = MockDriver::new();
    let zwave = ZWave::new(DriverOptions::default(), driver);

    assert_eq!(zwave.heal_network(true).await, Err(Error::NotConnected));
    assert_eq!(zwave.soft_reset().await, Err(Error::NotConnected));
    assert!(matches!(zwave.controller_info().await, Err(Error::NotConnected)));
}

#[tokio::test]
async fn test_refresh_node_info_reinterviews() {
    let (zwave, handle) = connected(&[2]).await;
    let mut rx = zwave.subscribe();

    zwave.refresh_node_info(handle.node_key(2)).await.unwrap();
    let record = next_of(&mut rx, NotificationKind::NodeQueriesComplete).await;

    assert_eq!(record.node_key(), handle.node_key(2));
    assert!(zwave.is_node_ready(handle.node_key(2)).unwrap());
}
