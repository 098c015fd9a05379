//! Per-address nonce serialization.
//!
//! One async mutex per sender address, created on first use and kept for the
//! life of the process. Holding the guard brackets the read-nonce-then-submit
//! critical section so two submissions for one address never see the same
//! pending nonce.

use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::Address;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::observability::metrics;

/// Held for the duration of one auto-nonce submission.
pub type NonceGuard = OwnedMutexGuard<()>;

#[derive(Clone, Debug, Default)]
pub struct NonceLockTable {
    locks: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl NonceLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `address`. Dropping the guard releases it.
    pub async fn acquire(&self, address: Address) -> NonceGuard {
        // Clone the Arc out so the shard lock is not held across the await.
        let lock = {
            let entry = self
                .locks
                .entry(address)
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };

        let started = Instant::now();
        let guard = lock.lock_owned().await;
        let waited = started.elapsed();
        metrics::record_nonce_lock_wait(waited);
        tracing::trace!(address = %address, waited_ms = waited.as_millis() as u64, "Nonce lock acquired");
        guard
    }

    /// Number of addresses that have ever been locked.
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
    async fn test_same_address_is_exclusive() {
        let table = NonceLockTable::new();
        let addr = Address::repeat_byte(0x11);

        let guard = table.acquire(addr).await;
        let contender = tokio::time::timeout(Duration::from_millis(50), table.acquire(addr)).await;
        assert!(contender.is_err(), "second acquire must wait while the first guard lives");

        drop(guard);
        let again = tokio::time::timeout(Duration::from_millis(50), table.acquire(addr)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_different_addresses_do_not_block() {
        let table = NonceLockTable::new();
        let _a = table.acquire(Address::repeat_byte(0x01)).await;
        let b = tokio::time::timeout(Duration::from_millis(50), table.acquire(Address::repeat_byte(0x02))).await;
        assert!(b.is_ok());
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_lock_is_reused_per_address() {
        let table = NonceLockTable::new();
        let addr = Address::repeat_byte(0x22);
        drop(table.acquire(addr).await);
        drop(table.acquire(addr).await);
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_serializes_read_modify_write() {
        let table = NonceLockTable::new();
        let addr = Address::repeat_byte(0x33);
        let counter = Arc::new(std::sync::Mutex::new(0u64));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let table = table.clone();
            let counter = counter.clone();
            let seen = seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = table.acquire(addr).await;
                let current = *counter.lock().unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
                seen.lock().unwrap().push(current);
                *counter.lock().unwrap() = current + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }
}
