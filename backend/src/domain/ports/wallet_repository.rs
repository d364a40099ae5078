//! Port for the diamond wallet: atomic balance changes plus the audit ledger.

use async_trait::async_trait;

use crate::domain::{MechanicId, Transaction, WalletMovement};

use super::define_port_error;

define_port_error! {
    /// Errors raised by wallet repository adapters.
    pub enum WalletRepositoryError {
        /// The wallet owner does not exist.
        MechanicNotFound { mechanic_id: MechanicId } =>
            "mechanic {mechanic_id} not found",
        /// A debit would leave the balance below zero.
        InsufficientBalance { balance: u32, requested: u32 } =>
            "insufficient diamonds: balance {balance}, requested {requested}",
        /// A credit would overflow the balance.
        BalanceOverflow { balance: u32 } =>
            "diamond balance {balance} cannot be increased further",
        /// The payment reference was already credited.
        DuplicateReference { reference: String } =>
            "payment reference {reference} was already credited",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "wallet repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "wallet repository query failed: {message}",
    }
}

/// Port for wallet balance changes.
///
/// `apply` must be atomic: the balance check, the balance write and the ledger
/// append happen in one unit so concurrent debits can never lose an update or
/// drive the balance negative.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// Apply a movement and return the appended ledger entry.
    async fn apply(&self, movement: WalletMovement) -> Result<Transaction, WalletRepositoryError>;

    /// Current balance; `None` when the mechanic is missing.
    async fn balance(&self, mechanic_id: MechanicId)
    -> Result<Option<u32>, WalletRepositoryError>;

    /// Ledger entries for a mechanic, newest first.
    async fn history(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Transaction>, WalletRepositoryError>;
}
