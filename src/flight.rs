//! Per-key locks that serialize concurrent misses on the same cache key.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub(crate) struct KeyLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held while one caller computes the value for `key`.
pub(crate) struct FlightGuard<'a> {
    owner: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyLocks {
    pub(crate) async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        // The guard exists before the wait starts, so a waiter that is dropped
        // mid-wait still runs the cleanup in `Drop`. It is declared before the
        // pending lock future and is therefore dropped after it, once the
        // future's reference to the mutex is gone.
        let mut flight = FlightGuard {
            owner: self,
            key: key.to_string(),
            guard: None,
        };

        // Clone the mutex out so no map shard lock is held across the await.
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        flight.guard = Some(lock.lock_owned().await);
        flight
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map still references the mutex once nobody is waiting.
        self.owner
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_entry_removed_after_release() {
        let locks = KeyLocks::default();
        {
            let _guard = locks.acquire("k").await;
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = KeyLocks::default();
        let first = locks.acquire("k").await;

        let second = locks.acquire("k");
        tokio::pin!(second);
        // Poll once so the waiter registers on the mutex.
        assert!(futures::poll!(second.as_mut()).is_pending());

        drop(first);
        assert_eq!(locks.len(), 1);

        let guard = second.await;
        drop(guard);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_removes_entry() {
        let locks = KeyLocks::default();
        let first = locks.acquire("k").await;

        let mut second = Box::pin(locks.acquire("k"));
        assert!(futures::poll!(second.as_mut()).is_pending());

        drop(first);
        assert_eq!(locks.len(), 1);

        drop(second);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_before_release() {
        let locks = KeyLocks::default();
        let first = locks.acquire("k").await;

        let mut second = Box::pin(locks.acquire("k"));
        assert!(futures::poll!(second.as_mut()).is_pending());
        drop(second);
        assert_eq!(locks.len(), 1);

        drop(first);
        assert_eq!(locks.len(), 0);
    }
}
