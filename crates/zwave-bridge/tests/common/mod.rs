//! Common test utilities for integration tests.
//!
//! Builds a `ZWave` context on top of the mock driver with a small scripted
//! network, and provides helpers to wait for the bridge task to catch up.

#![allow(dead_code)]

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use zwave_bridge::{DriverOptions, ZWave};
use zwave_core::{
    NodeCapabilities, NodeKey, NodeMetadata, NodeRecord, NodeValue, NotificationKind,
    NotificationRecord, Value, ValueId,
};
use zwave_driver::{MockDriver, MockDriverHandle};

pub const PORT: &str = "/dev/ttyACM0";

pub const SWITCH: ValueId = ValueId::new(37, 1, 0);
pub const DIMMER: ValueId = ValueId::new(38, 1, 0);
pub const TEMPERATURE: ValueId = ValueId::new(49, 1, 1);

pub fn switch_value(on: bool) -> NodeValue {
    NodeValue::new(SWITCH, "Switch", Value::Bool(on))
}

pub fn dimmer_value(level: u8) -> NodeValue {
    NodeValue::new(DIMMER, "Level", Value::Byte(level))
}

pub fn temperature_value(celsius: f64) -> NodeValue {
    NodeValue::new(TEMPERATURE, "Temperature", Value::Decimal(celsius))
        .with_units("C")
        .read_only()
}

/// A mains-powered dimmer with a switch, a level and a temperature sensor.
pub fn demo_node(key: NodeKey) -> NodeRecord {
    NodeRecord::new(key)
        .with_metadata(NodeMetadata {
            manufacturer_name: "Aeotec".to_string(),
            manufacturer_id: "0x0086".to_string(),
            product_name: "Smart Dimmer 6".to_string(),
            product_type: "0x0103".to_string(),
            product_id: "0x004b".to_string(),
            node_type: "Multilevel Power Switch".to_string(),
            name: String::new(),
            location: String::new(),
        })
        .with_capabilities(NodeCapabilities {
            listening: true,
            routing: true,
            beaming: true,
            max_baud_rate: 40_000,
            version: 4,
            basic: 4,
            generic: 17,
            specific: 1,
            ..NodeCapabilities::default()
        })
        .with_value(switch_value(false))
        .with_value(dimmer_value(0))
        .with_value(temperature_value(21.5))
}

/// Wait for the next record of `kind` on a subscription.
pub async fn next_of(
    rx: &mut mpsc::UnboundedReceiver<NotificationRecord>,
    kind: NotificationKind,
) -> NotificationRecord {
    timeout(Duration::from_secs(5), async {
        loop {
            let record = rx.recv().await.expect("subscription closed");
            if record.kind() == kind {
                return record;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for '{kind}'"))
}

/// Poll `condition` until it holds, yielding to the bridge task in between.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Connect a fresh context to a mock network with the given nodes and wait
/// until the initial scan is complete.
pub async fn connected(node_ids: &[u8]) -> (ZWave, MockDriverHandle) {
    let (driver, handle) = MockDriver::new();
    for &id in node_ids {
        handle.add_node(demo_node(handle.node_key(id)));
    }

    let mut zwave = ZWave::new(DriverOptions::default(), driver);
    let mut rx = zwave.subscribe();
    zwave.connect(PORT).await.expect("connect");
    next_of(&mut rx, NotificationKind::AllNodesQueried).await;

    (zwave, handle)
}
