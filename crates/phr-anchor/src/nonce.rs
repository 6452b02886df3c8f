//! Per-signer serialization of nonce acquisition and submission.
//!
//! Two live anchors from the same wallet must not read the same pending
//! nonce. Each signer address maps to one async mutex, held from the nonce
//! query until the node has accepted (or refused) the transaction. Anchors
//! from different signers do not contend.
//!
//! The registry is process-wide so that independently constructed
//! anchorers sharing a wallet still queue behind each other.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::address::Address;

static SIGNER_LOCKS: OnceLock<DashMap<Address, Arc<Mutex<()>>>> = OnceLock::new();

fn registry() -> &'static DashMap<Address, Arc<Mutex<()>>> {
    SIGNER_LOCKS.get_or_init(DashMap::new)
}

/// Wait for exclusive use of `signer`'s nonce sequence.
///
/// The returned guard releases the slot when dropped.
pub async fn lock_signer(signer: Address) -> OwnedMutexGuard<()> {
    let slot = registry()
        .entry(signer)
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    slot.lock_owned().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_signer_is_serialized() {
        let signer = Address::from_bytes([0x11; 20]);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = lock_signer(signer).await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_signers_do_not_block() {
        let _a = lock_signer(Address::from_bytes([0x22; 20])).await;
        let b = tokio::time::timeout(
            Duration::from_secs(1),
            lock_signer(Address::from_bytes([0x33; 20])),
        )
        .await;
        assert!(b.is_ok());
    }
}
