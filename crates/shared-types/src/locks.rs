//! # Keyed Locks
//!
//! A mutex per record key. Two messages touching the same process serialize;
//! messages for different processes run concurrently. Tokio mutexes are fair,
//! so waiters are served in arrival order.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of lazily created per-key async mutexes.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The guard owns its mutex, so it may be held across `.await` points and
    /// moved into spawned tasks.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        tracing::trace!(key, "lock acquired");
        guard
    }

    /// Drop entries nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(KeyedLocks::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = locks.acquire("negotiation:1").await;
        let locks2 = locks.clone();
        let order2 = order.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire("negotiation:1").await;
            order2.lock().await.push("second");
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        order.lock().await.push("first");
        drop(first);
        waiter.await.unwrap();

        assert_eq!(*order.lock().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.acquire("transfer:a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("transfer:b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_prune_removes_idle_entries() {
        let locks = KeyedLocks::new();
        let held = locks.acquire("held").await;
        drop(locks.acquire("idle").await);
        assert_eq!(locks.len(), 2);

        locks.prune();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }
}
