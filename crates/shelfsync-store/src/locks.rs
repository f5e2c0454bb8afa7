//! Per-identity operation locks.
//!
//! Login and sync both relaunch a browser against the same profile
//! directory and mutate the same store entry, so operations for one
//! identity must not overlap. Each key maps to one async mutex; callers
//! agree on the login username as the key, so holding the guard serializes
//! every operation on that identity while leaving other identities free to
//! proceed. Entries with no outstanding guard are evicted on the next
//! acquire, keeping the registry bounded by in-flight operations.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of named async locks.
#[derive(Default)]
pub struct IdentityLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a key, waiting if another operation on the same
    /// key is in flight.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            // A strong count of 1 means the map holds the only reference:
            // no guard is live and nobody is waiting.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
