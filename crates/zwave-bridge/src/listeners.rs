//! Listener registration and dispatch.
//!
//! Listeners are registered per [`NotificationKind`] or for every kind.
//! Dispatch snapshots the relevant listeners under the lock and invokes them
//! with the lock released, so a listener may register further listeners or
//! call back into the bridge without deadlocking.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::mpsc;
use zwave_core::{Error, NotificationKind, NotificationRecord};

/// Callback invoked for each dispatched record.
pub type Listener = Arc<dyn Fn(&NotificationRecord) -> anyhow::Result<()> + Send + Sync>;

/// Registered listeners and channel subscribers.
#[derive(Default)]
pub struct Listeners {
    by_kind: RwLock<HashMap<NotificationKind, Vec<Listener>>>,
    catch_all: RwLock<Vec<Listener>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<NotificationRecord>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind.
    pub fn on<F>(&self, kind: NotificationKind, listener: F)
    where
        F: Fn(&NotificationRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.by_kind
            .write()
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Register a listener for every kind.
    pub fn on_all<F>(&self, listener: F)
    where
        F: Fn(&NotificationRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.catch_all.write().push(Arc::new(listener));
    }

    /// Open a channel that receives a copy of every dispatched record.
    ///
    /// The subscription ends when the receiver is dropped.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<NotificationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Invoke every listener registered for the record's kind, then the
    /// catch-all listeners, then forward to subscribers.
    ///
    /// Returns one [`Error::ListenerFailure`] per listener that returned an
    /// error or panicked. A failing listener never stops the others.
    pub fn dispatch(&self, record: &NotificationRecord) -> Vec<Error> {
        let kind = record.kind();
        let targets: Vec<Listener> = {
            let by_kind = self.by_kind.read();
            let catch_all = self.catch_all.read();
            by_kind
                .get(&kind)
                .into_iter()
                .flatten()
                .chain(catch_all.iter())
                .cloned()
                .collect()
        };

        let failures = targets
            .iter()
            .filter_map(|listener| invoke(listener, record).err())
            .collect();

        self.subscribers
            .lock()
            .retain(|tx| tx.send(record.clone()).is_ok());

        failures
    }
}

fn invoke(listener: &Listener, record: &NotificationRecord) -> Result<(), Error> {
    let event = record.kind().event_name().to_string();
    match catch_unwind(AssertUnwindSafe(|| listener(record))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(Error::ListenerFailure {
            event,
            message: format!("{error:#}"),
        }),
        Err(_) => Err(Error::ListenerFailure {
            event,
            message: "listener panicked".to_string(),
        }),
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("kinds", &self.by_kind.read().len())
            .field("catch_all", &self.catch_all.read().len())
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zwave_core::{NetworkId, NotificationPayload};

    fn driver_ready() -> NotificationRecord {
        NotificationRecord::for_network(NetworkId::new(1), NotificationPayload::DriverReady)
    }

    #[test]
    fn test_dispatch_by_kind() {
        let listeners = Listeners::new();
        let ready = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        {
            let ready = Arc::clone(&ready);
            listeners.on(NotificationKind::DriverReady, move |_| {
                ready.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        {
            let failed = Arc::clone(&failed);
            listeners.on(NotificationKind::DriverFailed, move |_| {
                failed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert!(listeners.dispatch(&driver_ready()).is_empty());
        assert_eq!(ready.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failing_listener_does_not_stop_others() {
        let listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));

        listeners.on(NotificationKind::DriverReady, |_| anyhow::bail!("boom"));
        listeners.on(NotificationKind::DriverReady, |_| panic!("listener bug"));
        {
            let calls = Arc::clone(&calls);
            listeners.on_all(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let failures = listeners.dispatch(&driver_ready());
        assert_eq!(failures.len(), 2);
        assert_eq!(
            failures[0],
            Error::ListenerFailure {
                event: "driver ready".to_string(),
                message: "boom".to_string(),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscriber_receives_copy_and_is_pruned() {
        let listeners = Listeners::new();
        let mut rx = listeners.subscribe();
        let dropped = listeners.subscribe();
        drop(dropped);

        listeners.dispatch(&driver_ready());

        assert_eq!(rx.try_recv().unwrap().kind(), NotificationKind::DriverReady);
        assert_eq!(listeners.subscribers.lock().len(), 1);
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let listeners = Arc::new(Listeners::new());
        {
            let inner = Arc::clone(&listeners);
            listeners.on(NotificationKind::DriverReady, move |_| {
                inner.on(NotificationKind::DriverReset, |_| Ok(()));
                Ok(())
            });
        }

        assert!(listeners.dispatch(&driver_ready()).is_empty());
        assert_eq!(
            listeners
                .by_kind
                .read()
                .get(&NotificationKind::DriverReset)
                .map_or(0, Vec::len),
            1
        );
    }
}
