//! Diamond wallet ledger entries.
//!
//! The balance lives on the mechanic and is only changed by stores through
//! atomic conditional updates. Each change appends one [`Transaction`] that
//! records the resulting balance, so the ledger can be replayed for audit.

use chrono::{DateTime, Utc};

use super::wire_enum::wire_enum;
use super::{MechanicId, TransactionId};

wire_enum! {
    /// Direction and cause of a wallet movement.
    pub enum TransactionKind as "transaction kind" {
        /// Diamonds bought through a verified payment.
        Purchase => "purchase",
        /// Diamonds spent, e.g. on a proposal.
        Deduction => "deduction",
        /// Diamonds returned by support staff.
        Refund => "refund",
    }
}

wire_enum! {
    /// How a purchase was paid for.
    pub enum PaymentMethod as "payment method" {
        Jazzcash => "jazzcash",
        Easypaisa => "easypaisa",
        Card => "card",
        /// Movements initiated by the platform itself.
        System => "system",
    }
}

/// An append-only wallet ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub mechanic_id: MechanicId,
    pub kind: TransactionKind,
    pub amount: u32,
    pub balance_after: u32,
    pub payment_method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A requested wallet movement, before the store has applied it.
///
/// Purchases carry the verified payment reference; stores reject a second
/// purchase with the same reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletMovement {
    pub id: TransactionId,
    pub mechanic_id: MechanicId,
    pub kind: TransactionKind,
    pub amount: u32,
    pub payment_method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WalletMovement {
    /// Balance after applying the movement, or `None` when a debit would
    /// drive it below zero or a credit would overflow.
    ///
    /// # Examples
    /// ```
    /// # use chrono::Utc;
    /// use marketplace::domain::{MechanicId, TransactionId, TransactionKind, WalletMovement};
    ///
    /// let debit = WalletMovement {
    ///     id: TransactionId::random(),
    ///     mechanic_id: MechanicId::random(),
    ///     kind: TransactionKind::Deduction,
    ///     amount: 1,
    ///     payment_method: None,
    ///     reference: None,
    ///     created_at: Utc::now(),
    /// };
    /// assert_eq!(debit.apply_to(5), Some(4));
    /// assert_eq!(debit.apply_to(0), None);
    /// ```
    #[must_use]
    pub fn apply_to(&self, balance: u32) -> Option<u32> {
        match self.kind {
            TransactionKind::Deduction => balance.checked_sub(self.amount),
            TransactionKind::Purchase | TransactionKind::Refund => {
                balance.checked_add(self.amount)
            }
        }
    }

    /// Ledger entry recording this movement at `balance_after`.
    #[must_use]
    pub fn into_transaction(self, balance_after: u32) -> Transaction {
        Transaction {
            id: self.id,
            mechanic_id: self.mechanic_id,
            kind: self.kind,
            amount: self.amount,
            balance_after,
            payment_method: self.payment_method,
            reference: self.reference,
            created_at: self.created_at,
        }
    }
}
