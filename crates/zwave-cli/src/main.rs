//! Z-Wave bridge demo
//!
//! Runs the notification bridge against the mock driver: scans a simulated
//! network, exercises values, scenes and a controller command, and prints
//! every dispatched notification as a JSON line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use zwave_bridge::{DriverOptions, ZWave};
use zwave_core::{
    ControllerError, ControllerState, NodeCapabilities, NodeId, NodeMetadata, NodeRecord,
    NodeValue, NotificationKind, Value, ValueId,
};
use zwave_driver::{MockDriver, MockDriverHandle};

const SWITCH: ValueId = ValueId::new(37, 1, 0);
const LEVEL: ValueId = ValueId::new(38, 1, 0);

/// Z-Wave notification bridge demo
#[derive(Parser, Debug)]
#[command(name = "zwave")]
#[command(about = "Run the Z-Wave notification bridge against a simulated network", long_about = None)]
struct Args {
    /// JSON file with driver options, e.g. {"PollInterval": 500}
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Controller serial port
    #[arg(short, long, default_value = "/dev/ttyACM0")]
    port: String,

    /// Number of simulated nodes besides the controller
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=230))]
    nodes: u8,

    /// Print notifications as JSON lines
    #[arg(long)]
    json: bool,

    /// Keep running until Ctrl+C after the demo sequence
    #[arg(long)]
    follow: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting zwave bridge demo v{}", zwave_core::VERSION);

    let options = match &args.options {
        Some(path) => {
            let (options, warnings) = DriverOptions::load(path)
                .with_context(|| format!("loading options from {}", path.display()))?;
            for warning in &warnings {
                warn!(%warning, "ignored driver option");
            }
            options
        }
        None => DriverOptions::default(),
    };

    let (driver, handle) = MockDriver::new();
    for id in 2..2 + args.nodes {
        handle.add_node(simulated_node(&handle, id)?);
    }

    let mut zwave = ZWave::new(options, driver);
    let json = args.json;
    zwave.on_all(move |record| {
        if json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{:<20} node {:>3}", record.kind().event_name(), record.node_id);
        }
        Ok(())
    });

    let mut events = zwave.subscribe();
    zwave.connect(&args.port).await?;
    wait_for(&mut events, NotificationKind::AllNodesQueried).await?;
    info!(nodes = zwave.nodes().len(), "network ready");

    run_demo(&zwave, &handle, &mut events).await?;

    if args.follow {
        info!("following notifications, press Ctrl+C to stop");
        tokio::signal::ctrl_c().await?;
    }

    let stats = zwave.stats();
    info!(
        processed = stats.processed,
        dispatched = stats.dispatched,
        orphaned = stats.orphaned,
        listener_failures = stats.listener_failures,
        "bridge statistics"
    );
    zwave.disconnect().await?;
    Ok(())
}

async fn run_demo(
    zwave: &ZWave,
    handle: &MockDriverHandle,
    events: &mut tokio::sync::mpsc::UnboundedReceiver<zwave_core::NotificationRecord>,
) -> Result<()> {
    let Some(first) = zwave.nodes().first().map(NodeRecord::key) else {
        info!("no simulated nodes, skipping demo sequence");
        return Ok(());
    };

    zwave.set_node_name(first, "Living room").await?;
    zwave.set_value(first, SWITCH, Value::Bool(true)).await?;
    zwave.enable_poll(first, LEVEL, 1).await?;

    let scene = zwave.create_scene("Evening");
    for node in zwave.nodes() {
        zwave.add_scene_value(scene, node.key(), LEVEL, Value::Byte(30))?;
    }
    let activation = zwave.activate_scene(scene).await?;
    info!(scene = %scene, failed = activation.failures().count(), "scene activated");

    // Include one more node while AddDevice runs.
    zwave
        .begin_controller_command("AddDevice", NodeId::NONE, true)
        .await?;
    let next_id = zwave
        .nodes()
        .last()
        .map_or(2, |node| node.node_id.as_u8().saturating_add(1));
    handle.add_node(simulated_node(handle, next_id)?);
    handle.report_controller_state(ControllerState::Completed, ControllerError::None);
    while zwave.active_controller_command().is_some() {
        wait_for(events, NotificationKind::ControllerCommand).await?;
    }

    Ok(())
}

fn simulated_node(handle: &MockDriverHandle, id: u8) -> Result<NodeRecord> {
    let node_id = NodeId::new(id)?;
    let key = zwave_core::NodeKey::new(handle.network_id(), node_id);

    Ok(NodeRecord::new(key)
        .with_metadata(NodeMetadata {
            manufacturer_name: "Aeotec".to_string(),
            manufacturer_id: "0x0086".to_string(),
            product_name: "Smart Dimmer 6".to_string(),
            product_type: "0x0103".to_string(),
            product_id: "0x004b".to_string(),
            node_type: "Multilevel Power Switch".to_string(),
            ..NodeMetadata::default()
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
        .with_value(NodeValue::new(SWITCH, "Switch", Value::Bool(false)))
        .with_value(NodeValue::new(LEVEL, "Level", Value::Byte(0)).with_units("%")))
}

async fn wait_for(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<zwave_core::NotificationRecord>,
    kind: NotificationKind,
) -> Result<()> {
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(record) = events.recv().await {
            if record.kind() == kind {
                return Ok(());
            }
        }
        anyhow::bail!("notification stream closed before '{kind}'")
    })
    .await
    .with_context(|| format!("timed out waiting for '{kind}'"))?
}
