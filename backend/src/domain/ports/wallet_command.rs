//! Driving port for diamond wallet mutations.

use async_trait::async_trait;

use crate::domain::{Error, MechanicId, PaymentMethod, Transaction};

/// Credit diamonds bought through a payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditPurchaseRequest {
    pub mechanic_id: MechanicId,
    pub amount: u32,
    pub payment_method: PaymentMethod,
    /// Provider reference; crediting the same reference twice is rejected.
    pub payment_reference: String,
}

/// Return diamonds to a mechanic, for example after a cancelled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    pub mechanic_id: MechanicId,
    pub amount: u32,
    pub reason: Option<String>,
}

/// Deduct diamonds outside the proposal flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitRequest {
    pub mechanic_id: MechanicId,
    pub amount: u32,
    pub reason: Option<String>,
}

/// Driving port for wallet write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletCommand: Send + Sync {
    async fn credit_purchase(&self, request: CreditPurchaseRequest) -> Result<Transaction, Error>;

    async fn refund(&self, request: RefundRequest) -> Result<Transaction, Error>;

    /// Fails with `insufficient_balance` rather than going negative.
    async fn debit(&self, request: DebitRequest) -> Result<Transaction, Error>;
}
