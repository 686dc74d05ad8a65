//! Per-key mutual exclusion for authdb
//!
//! Document backends do not offer atomic read-modify-write, so the store
//! serializes all operations that target the same derived key. This crate
//! provides that discipline: a registry of per-key async mutexes with
//! first-come-first-served queuing and unbounded queue depth.
//!
//! ## Guarantees
//!
//! - At most one in-flight operation per distinct key at any time.
//! - Operations on different keys never wait on each other.
//! - Waiters on one key are served in arrival order (the fairness of
//!   `tokio::sync::Mutex` is FIFO).
//! - The lock releases when the operation future completes, whether it
//!   succeeded or failed; errors propagate untouched.
//!
//! A registry is constructed once per store instance and torn down with it.
//! Idle entries are removed as the last user of a key releases, so the
//! registry does not grow with the lifetime key set.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// A registry of per-key FIFO locks
///
/// Locking is keyed by opaque strings — in the store, the derived backend
/// key. Acquiring a contended key suspends the caller; acquiring an
/// uncontended key is a fast path through the shard map.
///
/// `with_lock` is not reentrant: nesting it on the same key from the same
/// task deadlocks, like any non-reentrant mutex.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` while holding the lock for `key`.
    ///
    /// Queues behind any in-flight operation on the same key and runs once
    /// the lock is granted. The lock is released when the returned future of
    /// `op` completes; its output — success or error — is returned as-is.
    pub async fn with_lock<F, Fut, T>(&self, key: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let output = {
            let _guard = lock.lock().await;
            op().await
        };

        // Drop the registry entry once no one else holds or awaits this
        // key. Our own clone is still alive here, so an entry with a
        // strong count of 2 has no other users; remove_if holds the shard
        // lock, which keeps a concurrent or_insert_with from racing us.
        self.locks
            .remove_if(key, |_, entry| Arc::strong_count(entry) <= 2);

        output
    }

    /// Number of keys currently tracked (held or queued)
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is currently tracked
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Mutex as AsyncMutex;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn test_runs_operation_and_returns_output() {
        let locks = KeyedLocks::new();
        let out = locks.with_lock("k", || async { 41 + 1 }).await;
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn test_mutual_exclusion_on_one_key() {
        let locks = Arc::new(KeyedLocks::new());
        let in_flight = Arc::new(AtomicBool::new(false));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let locks = locks.clone();
                let in_flight = in_flight.clone();
                let overlaps = overlaps.clone();
                tokio::spawn(async move {
                    locks
                        .with_lock("shared", || async {
                            if in_flight.swap(true, Ordering::SeqCst) {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            sleep(Duration::from_millis(2)).await;
                            in_flight.store(false, Ordering::SeqCst);
                        })
                        .await;
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_waiters_served_in_arrival_order() {
        let locks = Arc::new(KeyedLocks::new());
        let order = Arc::new(AsyncMutex::new(Vec::new()));

        // Hold the key, then enqueue waiters one at a time so their
        // arrival order is deterministic.
        let blocker = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks
                    .with_lock("k", || async {
                        sleep(Duration::from_millis(100)).await;
                    })
                    .await;
            })
        };
        sleep(Duration::from_millis(20)).await;

        let mut waiters = Vec::new();
        for i in 0..5 {
            let locks = locks.clone();
            let order = order.clone();
            waiters.push(tokio::spawn(async move {
                locks
                    .with_lock("k", || async {
                        order.lock().await.push(i);
                    })
                    .await;
            }));
            sleep(Duration::from_millis(10)).await;
        }

        blocker.await.unwrap();
        for waiter in waiters {
            waiter.await.unwrap();
        }
        assert_eq!(*order.lock().await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_wait_on_each_other() {
        let locks = Arc::new(KeyedLocks::new());
        let (tx_a, rx_a) = tokio::sync::oneshot::channel::<()>();
        let (tx_b, rx_b) = tokio::sync::oneshot::channel::<()>();

        // Each operation completes only after the other has started; if the
        // two keys shared a lock this would deadlock and trip the timeout.
        let task_a = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks
                    .with_lock("a", || async {
                        tx_a.send(()).unwrap();
                        rx_b.await.unwrap();
                    })
                    .await;
            })
        };
        let task_b = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks
                    .with_lock("b", || async {
                        tx_b.send(()).unwrap();
                        rx_a.await.unwrap();
                    })
                    .await;
            })
        };

        timeout(Duration::from_secs(1), async {
            task_a.await.unwrap();
            task_b.await.unwrap();
        })
        .await
        .expect("operations on distinct keys must proceed concurrently");
    }

    #[tokio::test]
    async fn test_lock_released_after_error() {
        let locks = KeyedLocks::new();

        let result: Result<(), &str> = locks.with_lock("k", || async { Err("boom") }).await;
        assert_eq!(result, Err("boom"));

        // A failed operation must not leave the key held.
        let ok: Result<i32, &str> = locks.with_lock("k", || async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));
    }

    #[tokio::test]
    async fn test_registry_drops_idle_entries() {
        let locks = Arc::new(KeyedLocks::new());

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let locks = locks.clone();
                tokio::spawn(async move {
                    locks
                        .with_lock(&format!("key-{i}"), || async {
                            sleep(Duration::from_millis(1)).await;
                        })
                        .await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_serializes_read_modify_write() {
        // The reason this crate exists: concurrent RMW sequences on one key
        // must not lose updates.
        let locks = Arc::new(KeyedLocks::new());
        let cell = Arc::new(AsyncMutex::new(0u32));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let locks = locks.clone();
                let cell = cell.clone();
                tokio::spawn(async move {
                    locks
                        .with_lock("counter", || async {
                            let current = *cell.lock().await;
                            sleep(Duration::from_micros(100)).await;
                            *cell.lock().await = current + 1;
                        })
                        .await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(*cell.lock().await, 32);
    }
}
