//! Cross-thread notification queue.
//!
//! The driver calls its watcher from a native thread that must never block
//! on the consumer. Producers append under a short critical section and wake
//! the bridge task; the bridge drains everything queued in one step and
//! processes the batch with the lock released.
//!
//! ```text
//! driver thread ──enqueue──► [ VecDeque ] ──drain──► bridge task
//!                      │                      ▲
//!                      └──── Notify (empty → non-empty) ┘
//! ```

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;
use zwave_core::NotificationRecord;

/// FIFO of records waiting for the bridge.
///
/// The wake signal fires only when the queue goes from empty to non-empty,
/// so a burst of records produces a single wake. A permit stored by
/// [`Notify::notify_one`] survives until the consumer next waits, which means
/// a record enqueued between a drain and the following `wait` is never missed.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    records: Mutex<VecDeque<NotificationRecord>>,
    wake: Notify,
    enqueued: AtomicU64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Safe to call from any thread; never blocks on the consumer.
    pub fn enqueue(&self, record: NotificationRecord) {
        let was_empty = {
            let mut records = self.records.lock();
            let was_empty = records.is_empty();
            records.push_back(record);
            was_empty
        };
        self.enqueued.fetch_add(1, Ordering::Relaxed);

        if was_empty {
            self.wake.notify_one();
        }
    }

    /// Remove and return every queued record, oldest first.
    pub fn drain(&self) -> Vec<NotificationRecord> {
        let drained = std::mem::take(&mut *self.records.lock());
        drained.into()
    }

    /// Suspend until a producer signals that records are available.
    ///
    /// Wakes coalesce: callers must [`drain`](Self::drain) after waking and
    /// may find more records than the one that triggered the signal, or none.
    pub async fn wait(&self) {
        self.wake.notified().await;
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Total number of records ever enqueued.
    pub fn total_enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }
}
