use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A mutex that allows locking based on a key (e.g., owner ID).
/// Hierarchy mutations of one user serialize; different users never contend.
#[derive(Debug)]
pub struct KeyedMutex<K: Eq + Hash> {
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedMutex<K> {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Acquires the lock for `key`; released when the guard is dropped.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        // The DashMap entry guard is dropped above, before awaiting.
        mutex.lock_owned().await
    }

    /// Removes locks that are not currently held or awaited by any task.
    pub fn cleanup(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedMutex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> Clone for KeyedMutex<K> {
    fn clone(&self) -> Self {
        Self {
            locks: self.locks.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks: KeyedMutex<i32> = KeyedMutex::new();
        let guard = locks.lock(&1).await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.lock(&1).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks: KeyedMutex<i32> = KeyedMutex::new();
        let _a = locks.lock(&1).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock(&2))
            .await
            .expect("lock on another key must not wait");
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_entries() {
        let locks: KeyedMutex<i32> = KeyedMutex::new();
        {
            let _g = locks.lock(&7).await;
            locks.cleanup();
            assert_eq!(locks.len(), 1);
        }
        locks.cleanup();
        assert!(locks.is_empty());
    }
}
