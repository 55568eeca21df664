//! Per-sale mutual exclusion.
//!
//! Operations on one sale id run one at a time; different ids never wait
//! on each other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per sale id.
#[derive(Debug, Default)]
pub struct SaleLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SaleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `sale_id`.
    ///
    /// The guard holds the lock until dropped.
    pub async fn acquire(&self, sale_id: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await
        let lock = self
            .locks
            .entry(sale_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops the entry for a sale that no longer exists.
    ///
    /// Only removes it when nobody else holds or waits on the lock.
    pub fn forget(&self, sale_id: &str) {
        self.locks
            .remove_if(sale_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of sale ids currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
