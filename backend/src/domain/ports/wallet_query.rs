//! Driving port for wallet reads.

use async_trait::async_trait;

use crate::domain::{Error, MechanicId, Transaction};

/// Driving port for wallet read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletQuery: Send + Sync {
    async fn balance(&self, mechanic_id: MechanicId) -> Result<u32, Error>;

    /// Ledger entries, newest first.
    async fn history(&self, mechanic_id: MechanicId) -> Result<Vec<Transaction>, Error>;
}
