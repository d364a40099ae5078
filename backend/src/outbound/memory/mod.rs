//! In-memory marketplace store.
//!
//! One `tokio::sync::Mutex` guards every collection, and each port method
//! holds it for its whole body, so every call behaves as a serialisable
//! transaction. Used when no database is configured and by integration tests.

mod bookings;
mod mechanics;
mod proposals;
mod requests;
mod wallet;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use tokio::sync::{Mutex, MutexGuard};

use crate::domain::ports::WalletRepositoryError;
use crate::domain::{
    Booking, BookingId, BookingStatus, Mechanic, MechanicId, Proposal, ProposalId, RequestId,
    Review, ServiceRequest, Transaction, TransactionKind, WalletMovement,
};

#[derive(Debug, Default)]
struct MarketplaceState {
    requests: HashMap<RequestId, ServiceRequest>,
    mechanics: HashMap<MechanicId, Mechanic>,
    proposals: HashMap<ProposalId, Proposal>,
    bookings: HashMap<BookingId, Booking>,
    transactions: Vec<Transaction>,
    reviews: Vec<Review>,
}

impl MarketplaceState {
    /// Check and apply a wallet movement, appending its ledger entry.
    ///
    /// Nothing changes when an error is returned.
    fn apply_movement(
        &mut self,
        movement: WalletMovement,
    ) -> Result<Transaction, WalletRepositoryError> {
        let mechanic_id = movement.mechanic_id;
        let balance = self
            .mechanics
            .get(&mechanic_id)
            .map(Mechanic::diamond_balance)
            .ok_or_else(|| WalletRepositoryError::mechanic_not_found(mechanic_id))?;
        if movement.kind == TransactionKind::Purchase
            && let Some(reference) = movement.reference.as_deref()
            && self.transactions.iter().any(|entry| {
                entry.kind == TransactionKind::Purchase
                    && entry.reference.as_deref() == Some(reference)
            })
        {
            return Err(WalletRepositoryError::duplicate_reference(reference));
        }
        let balance_after = movement.apply_to(balance).ok_or_else(|| {
            if movement.kind == TransactionKind::Deduction {
                WalletRepositoryError::insufficient_balance(balance, movement.amount)
            } else {
                WalletRepositoryError::balance_overflow(balance)
            }
        })?;

        if let Some(mechanic) = self.mechanics.remove(&mechanic_id) {
            self.mechanics
                .insert(mechanic_id, mechanic.with_balance(balance_after));
        }
        let entry = movement.into_transaction(balance_after);
        self.transactions.push(entry.clone());
        Ok(entry)
    }

    fn ongoing_for_mechanic(&self, mechanic_id: MechanicId) -> Option<&Booking> {
        self.bookings.values().find(|booking| {
            booking.mechanic_id() == mechanic_id && booking.status() == BookingStatus::Ongoing
        })
    }

    fn ongoing_for_customer(&self, customer_id: crate::domain::CustomerId) -> Option<&Booking> {
        self.bookings.values().find(|booking| {
            booking.customer_id() == customer_id && booking.status() == BookingStatus::Ongoing
        })
    }
}

/// Marketplace store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryMarketplaceStore {
    state: Mutex<MarketplaceState>,
}

impl InMemoryMarketplaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock(&self) -> MutexGuard<'_, MarketplaceState> {
        self.state.lock().await
    }
}

/// Newest first, ties broken by id for a stable order.
fn newest_first<T, K: Ord>(
    items: &mut [T],
    created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
    id: impl Fn(&T) -> K,
) {
    items.sort_by(|a, b| {
        created_at(b)
            .cmp(&created_at(a))
            .then_with(|| id(b).cmp(&id(a)))
    });
}
