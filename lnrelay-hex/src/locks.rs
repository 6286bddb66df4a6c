//! Per-sender mutual exclusion.

use std::sync::Arc;

use dashmap::DashMap;
use lnrelay_types::WalletId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per sending wallet, created on first use.
///
/// Holding a sender's guard across the balance check and the settlement
/// keeps two transfers from the same wallet from both passing the check.
#[derive(Debug, Default)]
pub struct SenderLocks {
    locks: DashMap<WalletId, Arc<Mutex<()>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `sender`.
    pub async fn acquire(&self, sender: &WalletId) -> OwnedMutexGuard<()> {
        // Clone out of the map so no shard lock is held across the await.
        let lock = Arc::clone(self.locks.entry(sender.clone()).or_default().value());
        lock.lock_owned().await
    }

    /// Number of senders that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
