//! Async bridge between the driver thread and listeners.
//!
//! The bridge is the single consumer of the [`NotificationQueue`]. It runs
//! as one tokio task that sleeps until the queue signals, drains every
//! queued record at once and, for each record in order:
//!
//! 1. applies the registry mutation the record implies, then
//! 2. invokes the listeners registered for its kind.
//!
//! Because both steps run in the same task, a node added by one record is
//! always in the registry before listeners see a later record about it.
//!
//! ```text
//! ┌──────────────┐  enqueue  ┌───────────────────┐  drain  ┌──────────────┐
//! │ driver thread│──────────►│ NotificationQueue │────────►│ bridge task  │
//! └──────────────┘           └───────────────────┘         └──────┬───────┘
//!                                                                 │
//!                               ┌──────────────┬──────────────────┤
//!                               ▼              ▼                  ▼
//!                         NodeRegistry  CommandDispatcher     Listeners
//! ```

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use zwave_core::{NetworkId, NotificationPayload, NotificationRecord};

use crate::dispatcher::CommandDispatcher;
use crate::listeners::Listeners;
use crate::nodes::NodeRegistry;
use crate::queue::NotificationQueue;

/// Counters kept by the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Records taken off the queue.
    pub processed: u64,

    /// Records handed to listeners.
    pub dispatched: u64,

    /// Records dropped because they named a node that was never registered.
    pub orphaned: u64,

    /// Listener invocations that returned an error or panicked.
    pub listener_failures: u64,

    /// Number of drains that returned at least one record.
    pub batches: u64,
}

#[derive(Debug, Default)]
struct Counters {
    processed: AtomicU64,
    dispatched: AtomicU64,
    orphaned: AtomicU64,
    listener_failures: AtomicU64,
    batches: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            processed: self.processed.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            orphaned: self.orphaned.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }
}

/// Consumer side of the notification pipeline.
///
/// Cloning is cheap; clones share the queue, registries and counters.
#[derive(Debug, Clone)]
pub struct AsyncBridge {
    queue: Arc<NotificationQueue>,
    nodes: Arc<NodeRegistry>,
    dispatcher: Arc<CommandDispatcher>,
    listeners: Arc<Listeners>,
    network_id: Arc<RwLock<Option<NetworkId>>>,
    counters: Arc<Counters>,
}

impl AsyncBridge {
    pub fn new(
        queue: Arc<NotificationQueue>,
        nodes: Arc<NodeRegistry>,
        dispatcher: Arc<CommandDispatcher>,
        listeners: Arc<Listeners>,
    ) -> Self {
        Self {
            queue,
            nodes,
            dispatcher,
            listeners,
            network_id: Arc::new(RwLock::new(None)),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot()
    }

    /// Network id announced by the last `DriverReady` record.
    pub fn network_id(&self) -> Option<NetworkId> {
        *self.network_id.read()
    }

    pub(crate) fn forget_network(&self) {
        self.network_id.write().take();
    }

    /// Drain the queue and process every record. Returns how many were processed.
    pub fn process_pending(&self) -> usize {
        let batch = self.queue.drain();
        if batch.is_empty() {
            return 0;
        }

        let count = batch.len();
        self.counters.batches.fetch_add(1, Ordering::Relaxed);
        trace!(count, "processing notification batch");

        for record in batch {
            self.process(record);
        }
        count
    }

    /// Apply one record to the registries and dispatch it to listeners.
    pub fn process(&self, record: NotificationRecord) {
        self.counters.processed.fetch_add(1, Ordering::Relaxed);
        self.observe(&record);

        if let Err(error) = self.nodes.apply(&record) {
            self.counters.orphaned.fetch_add(1, Ordering::Relaxed);
            warn!(event = %record.kind(), %error, "dropping notification for unregistered node");
            return;
        }

        let failures = self.listeners.dispatch(&record);
        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        for failure in &failures {
            warn!(error = %failure, "listener failed");
        }
        self.counters
            .listener_failures
            .fetch_add(failures.len() as u64, Ordering::Relaxed);
    }

    /// Driver-level bookkeeping that does not touch the node registry.
    fn observe(&self, record: &NotificationRecord) {
        match &record.payload {
            NotificationPayload::DriverReady => {
                *self.network_id.write() = Some(record.network_id);
                info!(network = %record.network_id, "driver ready");
            }
            NotificationPayload::DriverFailed => {
                error!(network = %record.network_id, "driver failed to start");
            }
            NotificationPayload::DriverRemoved => {
                info!(network = %record.network_id, "driver removed");
            }
            NotificationPayload::AllNodesQueried | NotificationPayload::AwakeNodesQueried => {
                info!(nodes = self.nodes.len(), event = %record.kind(), "network scan complete");
            }
            NotificationPayload::ControllerCommand { state, error } => {
                debug!(%state, ?error, "controller state");
                self.dispatcher.observe(*state);
            }
            _ => {}
        }
    }

    /// Spawn the bridge task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> BridgeHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let counters = Arc::clone(&self.counters);

        let task = tokio::spawn(async move {
            debug!("notification bridge started");
            loop {
                tokio::select! {
                    biased;
                    // Also fires when the handle is dropped.
                    _ = &mut shutdown_rx => break,
                    () = self.queue.wait() => {
                        self.process_pending();
                    }
                }
            }
            let flushed = self.process_pending();
            debug!(flushed, "notification bridge stopped");
        });

        BridgeHandle {
            shutdown: shutdown_tx,
            task,
            counters,
        }
    }
}

/// Handle to a running bridge task.
#[derive(Debug)]
pub struct BridgeHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl BridgeHandle {
    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the bridge after a final drain-and-dispatch pass.
    ///
    /// Records enqueued before this call are processed before it returns.
    pub async fn shutdown(self) -> BridgeStats {
        // The task may already be gone if it panicked.
        let _ = self.shutdown.send(());

        match Self::classify_task_result(self.task.await) {
            TaskTermination::Success => {}
            TaskTermination::Cancelled => debug!("notification bridge cancelled"),
            TaskTermination::Panic => error!("notification bridge panicked"),
        }

        let stats = self.counters.snapshot();
        info!(
            processed = stats.processed,
            dispatched = stats.dispatched,
            orphaned = stats.orphaned,
            listener_failures = stats.listener_failures,
            "notification bridge shut down"
        );
        stats
    }

    fn classify_task_result(result: std::result::Result<(), tokio::task::JoinError>) -> TaskTermination {
        match result {
            Ok(()) => TaskTermination::Success,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Cancelled,
    Panic,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use zwave_core::{
        ControllerError, ControllerState, NodeId, NodeKey, NodeValue, NotificationKind, Value,
        ValueId,
    };

    const NETWORK: NetworkId = NetworkId::new(0x0184_2b6a);

    fn key(node: u8) -> NodeKey {
        NodeKey::new(NETWORK, NodeId::new(node).unwrap())
    }

    fn bridge() -> AsyncBridge {
        AsyncBridge::new(
            Arc::new(NotificationQueue::new()),
            Arc::new(NodeRegistry::new()),
            Arc::new(CommandDispatcher::new()),
            Arc::new(Listeners::new()),
        )
    }

    fn value_changed(node: u8) -> NotificationRecord {
        NotificationRecord::for_node(
            key(node),
            NotificationPayload::ValueChanged(NodeValue::new(
                ValueId::new(37, 1, 0),
                "Switch",
                Value::Bool(true),
            )),
        )
    }

    #[test]
    fn test_node_visible_before_value_listener_runs() {
        let bridge = bridge();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let nodes = Arc::clone(&bridge.nodes);
            let seen = Arc::clone(&seen);
            bridge.listeners.on(NotificationKind::ValueChanged, move |record| {
                seen.lock().unwrap().push(nodes.contains(record.node_key()));
                Ok(())
            });
        }

        bridge
            .queue
            .enqueue(NotificationRecord::for_node(key(3), NotificationPayload::NodeAdded));
        bridge.queue.enqueue(value_changed(3));
        assert_eq!(bridge.process_pending(), 2);

        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_orphan_record_is_counted_not_dispatched() {
        let bridge = bridge();
        let mut rx = bridge.listeners.subscribe();

        bridge.process(value_changed(8));

        let stats = bridge.stats();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.orphaned, 1);
        assert_eq!(stats.dispatched, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_listener_failures_are_counted() {
        let bridge = bridge();
        bridge
            .listeners
            .on(NotificationKind::DriverReady, |_| anyhow::bail!("not today"));

        bridge.process(NotificationRecord::for_network(
            NETWORK,
            NotificationPayload::DriverReady,
        ));

        let stats = bridge.stats();
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.listener_failures, 1);
        assert_eq!(bridge.network_id(), Some(NETWORK));
    }

    #[tokio::test]
    async fn test_terminal_controller_state_clears_dispatcher() {
        let bridge = bridge();
        let (driver, _handle) = zwave_driver::MockDriver::new();
        zwave_driver::NetworkDriver::connect(&driver, "/dev/ttyACM0", Arc::new(|_| {}))
            .await
            .unwrap();
        bridge
            .dispatcher
            .begin(&driver, "AddDevice", NodeId::NONE, true)
            .await
            .unwrap();

        bridge.process(NotificationRecord::for_network(
            NETWORK,
            NotificationPayload::ControllerCommand {
                state: ControllerState::Completed,
                error: ControllerError::None,
            },
        ));
        assert_eq!(bridge.dispatcher.active(), None);
    }

    #[tokio::test]
    async fn test_task_processes_and_flushes_on_shutdown() {
        let bridge = bridge();
        let queue = Arc::clone(&bridge.queue);
        let nodes = Arc::clone(&bridge.nodes);
        let handle = bridge.start();
        assert!(handle.is_running());

        queue.enqueue(NotificationRecord::for_node(key(2), NotificationPayload::NodeAdded));
        queue.enqueue(NotificationRecord::for_node(key(3), NotificationPayload::NodeAdded));

        let stats = handle.shutdown().await;
        assert_eq!(stats.processed, 2);
        assert_eq!(nodes.len(), 2);
    }
}
