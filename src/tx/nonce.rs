//! Nonce management for reliable transaction submission
//!
//! Handles:
//! - Local optimistic nonce cache seeded from the pending transaction count
//! - Eviction after failed or rejected sends
//! - Per-address serialization of the whole send sequence

use crate::error::WalletResult;
use crate::network::{BlockTag, Network};

use alloy_primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// Cached next nonce for one address; `None` means refetch
type NonceSlot = Arc<Mutex<Option<u64>>>;

/// Hands out nonces per address.
///
/// Slots are never removed: a reset clears the cached value but keeps the
/// entry, so memory grows with the number of distinct senders. That is fine
/// for a process driving a handful of wallets, not for one serving arbitrary
/// addresses.
pub struct NonceCoordinator {
    /// Network used to seed empty slots
    network: Arc<dyn Network>,
    /// Per-address nonce state
    slots: DashMap<Address, NonceSlot>,
}

impl NonceCoordinator {
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self {
            network,
            slots: DashMap::new(),
        }
    }

    fn slot(&self, address: Address) -> NonceSlot {
        self.slots.entry(address).or_default().clone()
    }

    /// Next nonce for `address`, fetched from the network on a cache miss
    pub async fn get_nonce(&self, address: Address) -> WalletResult<u64> {
        let slot = self.slot(address);
        let mut cached = slot.lock().await;
        self.load(address, &mut cached).await
    }

    /// Record that the cached nonce was accepted by the network
    pub async fn advance(&self, address: Address) {
        let slot = self.slot(address);
        let mut cached = slot.lock().await;
        match *cached {
            Some(nonce) => {
                *cached = nonce.checked_add(1);
                debug!("Advanced nonce for {} to {:?}", address, *cached);
            }
            None => debug!("No cached nonce to advance for {}", address),
        }
    }

    /// Evict the cached nonce so the next lookup refetches it
    pub async fn reset(&self, address: Address) {
        let slot = self.slot(address);
        let mut cached = slot.lock().await;
        evict(address, &mut cached);
    }

    /// Lock `address` for a complete send. No other nonce operation on the
    /// address proceeds until the reservation is committed or released.
    pub async fn reserve(&self, address: Address) -> WalletResult<NonceReservation> {
        let mut guard = self.slot(address).lock_owned().await;
        let nonce = self.load(address, &mut guard).await?;
        debug!("Reserved nonce {} for {}", nonce, address);

        Ok(NonceReservation {
            address,
            nonce,
            guard: Some(guard),
        })
    }

    async fn load(&self, address: Address, cached: &mut Option<u64>) -> WalletResult<u64> {
        if let Some(nonce) = *cached {
            return Ok(nonce);
        }

        let nonce = self
            .network
            .get_transaction_count(address, BlockTag::Pending)
            .await?;
        *cached = Some(nonce);
        debug!("Fetched nonce {} for {}", nonce, address);
        Ok(nonce)
    }
}

fn evict(address: Address, cached: &mut Option<u64>) {
    if cached.take().is_some() {
        warn!("Reset cached nonce for {}", address);
        crate::metrics::record_nonce_reset();
    }
}

/// Exclusive hold on an address's nonce for the duration of one send.
/// Dropping it without `commit` evicts the cached value.
pub struct NonceReservation {
    address: Address,
    nonce: u64,
    guard: Option<OwnedMutexGuard<Option<u64>>>,
}

impl NonceReservation {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The transaction was accepted; the next send uses `nonce + 1`
    pub fn commit(mut self) {
        if let Some(mut guard) = self.guard.take() {
            *guard = self.nonce.checked_add(1);
            debug!("Committed nonce {} for {}", self.nonce, self.address);
        }
    }

    /// The send failed; force a refetch
    pub fn release(mut self) {
        self.evict();
    }

    fn evict(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            evict(self.address, &mut guard);
        }
    }
}

impl Drop for NonceReservation {
    fn drop(&mut self) {
        self.evict();
    }
}
