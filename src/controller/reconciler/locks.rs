//! # Resource Locks
//!
//! Keyed async mutexes giving at most one in-flight reconcile or prune per
//! `namespace/name`. Different resources proceed concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct ResourceLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ResourceLocks {
    /// Get or create the lock for a resource
    #[must_use]
    pub fn get(&self, resource_key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry(resource_key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Wait for exclusive access to a resource
    pub async fn acquire(&self, resource_key: &str) -> OwnedMutexGuard<()> {
        self.get(resource_key).lock_owned().await
    }

    /// Drop the lock entry of a resource that no longer exists
    ///
    /// The entry is kept while any task still holds or waits on it.
    pub fn forget(&self, resource_key: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(resource_key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(resource_key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
