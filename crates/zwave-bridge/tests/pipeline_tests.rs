//! Integration tests for the driver → queue → bridge → listener pipeline.

mod common;

use common::{PORT, SWITCH, connected, demo_node, next_of, switch_value, wait_until};
use std::sync::{Arc, Mutex};
use zwave_bridge::{DriverOptions, ZWave};
use zwave_core::{
    Error, NodeId, NotificationKind, NotificationPayload, NotificationRecord, Value,
};
use zwave_driver::MockDriver;

#[tokio::test]
async fn test_initial_scan_populates_registry() {
    let (zwave, handle) = connected(&[2, 3, 7]).await;

    assert_eq!(zwave.network_id(), Some(handle.network_id()));
    let nodes = zwave.nodes();
    assert_eq!(nodes.len(), 3);
    assert!(nodes.iter().all(|node| node.ready));

    let key = handle.node_key(3);
    assert_eq!(zwave.node_product_name(key).unwrap(), "Smart Dimmer 6");
    assert!(zwave.is_node_listening_device(key).unwrap());
    assert_eq!(zwave.node_max_baud_rate(key).unwrap(), 40_000);
    assert_eq!(zwave.value(key, SWITCH).unwrap(), Value::Bool(false));
}

#[tokio::test]
async fn test_node_registered_before_value_listener_runs() {
    let (driver, handle) = MockDriver::new();
    let mut zwave = ZWave::new(DriverOptions::default(), driver);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut rx = zwave.subscribe();
    {
        let seen = Arc::clone(&seen);
        zwave.on(NotificationKind::ValueAdded, move |record| {
            seen.lock().unwrap().push(record.node_key());
            Ok(())
        });
    }
    zwave.connect(PORT).await.unwrap();
    next_of(&mut rx, NotificationKind::AllNodesQueried).await;

    // Live inclusion from the driver thread.
    let key = handle.node_key(12);
    handle.add_node(demo_node(key));
    next_of(&mut rx, NotificationKind::NodeQueriesComplete).await;

    assert_eq!(*seen.lock().unwrap(), vec![key, key, key]);
    assert!(zwave.node(key).is_ok());
}

#[tokio::test]
async fn test_value_listener_sees_node_in_registry() {
    let (zwave, handle) = connected(&[4]).await;
    let zwave = Arc::new(zwave);
    let observed = Arc::new(Mutex::new(None));
    {
        let observed = Arc::clone(&observed);
        let context = Arc::downgrade(&zwave);
        zwave.on_name("value changed", move |record| {
            let context = context.upgrade().expect("context alive");
            *observed.lock().unwrap() = Some(context.node(record.node_key()).is_ok());
            Ok(())
        })
        .unwrap();
    }

    handle.report_value(NodeId::new(4).unwrap(), switch_value(true));
    wait_until(|| observed.lock().unwrap().is_some()).await;

    assert_eq!(*observed.lock().unwrap(), Some(true));
    assert_eq!(
        zwave.value(handle.node_key(4), SWITCH).unwrap(),
        Value::Bool(true)
    );
}

#[tokio::test]
async fn test_orphan_value_is_dropped() {
    let (zwave, handle) = connected(&[2]).await;
    let dispatched = Arc::new(Mutex::new(0));
    {
        let dispatched = Arc::clone(&dispatched);
        zwave.on(NotificationKind::ValueChanged, move |_| {
            *dispatched.lock().unwrap() += 1;
            Ok(())
        });
    }

    let before = zwave.stats();
    handle.emit(NotificationRecord::for_node(
        handle.node_key(99),
        NotificationPayload::ValueChanged(switch_value(true)),
    ));
    wait_until(|| zwave.stats().orphaned == before.orphaned + 1).await;

    assert_eq!(*dispatched.lock().unwrap(), 0);
    assert_eq!(
        zwave.node(handle.node_key(99)),
        Err(Error::NodeNotFound(handle.node_key(99)))
    );
}

#[tokio::test]
async fn test_failing_listener_does_not_stop_pipeline() {
    let (zwave, handle) = connected(&[2]).await;
    zwave.on(NotificationKind::NodeEvent, |_| anyhow::bail!("listener exploded"));
    let mut rx = zwave.subscribe();

    handle.emit(NotificationRecord::for_node(
        handle.node_key(2),
        NotificationPayload::NodeEvent(99),
    ));
    handle.report_value(NodeId::new(2).unwrap(), switch_value(true));

    next_of(&mut rx, NotificationKind::ValueChanged).await;
    assert_eq!(zwave.stats().listener_failures, 1);
}

#[tokio::test]
async fn test_unknown_event_name_is_rejected() {
    let (driver, _handle) = MockDriver::new();
    let zwave = ZWave::new(DriverOptions::default(), driver);

    let result = zwave.on_name("node exploded", |_| Ok(()));
    assert_eq!(result, Err(Error::UnknownEvent("node exploded".to_string())));
}

#[tokio::test]
async fn test_records_per_node_arrive_in_emission_order() {
    let (zwave, handle) = connected(&[5]).await;
    let levels = Arc::new(Mutex::new(Vec::new()));
    {
        let levels = Arc::clone(&levels);
        zwave.on(NotificationKind::ValueChanged, move |record| {
            if let NotificationPayload::ValueChanged(value) = &record.payload
                && let Value::Byte(level) = value.value
            {
                levels.lock().unwrap().push(level);
            }
            Ok(())
        });
    }

    let producer = {
        let handle = handle.clone();
        std::thread::spawn(move || {
            for level in 0..=99 {
                handle.report_value(NodeId::new(5).unwrap(), common::dimmer_value(level));
            }
        })
    };
    producer.join().unwrap();
    wait_until(|| levels.lock().unwrap().len() == 100).await;

    let expected: Vec<u8> = (0..=99).collect();
    assert_eq!(*levels.lock().unwrap(), expected);
    assert_eq!(
        zwave.value(handle.node_key(5), common::DIMMER).unwrap(),
        Value::Byte(99)
    );
}

#[tokio::test]
async fn test_node_removed_drops_registry_entry() {
    let (zwave, handle) = connected(&[2, 3]).await;
    let mut rx = zwave.subscribe();

    handle.remove_node(NodeId::new(2).unwrap());
    next_of(&mut rx, NotificationKind::NodeRemoved).await;

    assert_eq!(zwave.nodes().len(), 1);
    assert!(zwave.node(handle.node_key(2)).is_err());
}
