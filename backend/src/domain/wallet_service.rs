//! Diamond wallet domain services.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    CreditPurchaseRequest, DebitRequest, RefundRequest, WalletCommand, WalletQuery,
    WalletRepository, WalletRepositoryError,
};
use crate::domain::{
    Error, MechanicId, PaymentMethod, Transaction, TransactionId, TransactionKind, WalletMovement,
};

fn map_wallet_repository_error(error: WalletRepositoryError) -> Error {
    match error {
        WalletRepositoryError::MechanicNotFound { mechanic_id } => {
            Error::not_found(format!("mechanic {mechanic_id} not found"))
        }
        WalletRepositoryError::InsufficientBalance { balance, requested } => {
            Error::insufficient_balance(format!(
                "cannot deduct {requested} diamonds from a balance of {balance}"
            ))
        }
        WalletRepositoryError::BalanceOverflow { balance } => {
            Error::invalid_request(format!("diamond balance {balance} cannot grow further"))
        }
        WalletRepositoryError::DuplicateReference { reference } => {
            Error::conflict(format!("payment {reference} was already credited"))
        }
        WalletRepositoryError::Connection { message } => {
            Error::remote_failure(format!("wallet repository unavailable: {message}"))
        }
        WalletRepositoryError::Query { message } => {
            Error::internal(format!("wallet repository error: {message}"))
        }
    }
}

fn require_positive(amount: u32) -> Result<(), Error> {
    if amount == 0 {
        return Err(Error::invalid_request("amount must be greater than zero"));
    }
    Ok(())
}

/// Wallet service implementing the command driving port.
#[derive(Clone)]
pub struct WalletCommandService<W> {
    wallets: Arc<W>,
    clock: Arc<dyn Clock>,
}

impl<W> WalletCommandService<W> {
    pub fn new(wallets: Arc<W>, clock: Arc<dyn Clock>) -> Self {
        Self { wallets, clock }
    }
}

impl<W> WalletCommandService<W>
where
    W: WalletRepository,
{
    async fn apply(
        &self,
        mechanic_id: MechanicId,
        kind: TransactionKind,
        amount: u32,
        payment_method: Option<PaymentMethod>,
        reference: Option<String>,
    ) -> Result<Transaction, Error> {
        require_positive(amount)?;
        let entry = self
            .wallets
            .apply(WalletMovement {
                id: TransactionId::random(),
                mechanic_id,
                kind,
                amount,
                payment_method,
                reference,
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_wallet_repository_error)?;
        info!(
            %mechanic_id,
            %kind,
            amount,
            balance_after = entry.balance_after,
            "wallet updated"
        );
        Ok(entry)
    }
}

#[async_trait]
impl<W> WalletCommand for WalletCommandService<W>
where
    W: WalletRepository,
{
    async fn credit_purchase(&self, request: CreditPurchaseRequest) -> Result<Transaction, Error> {
        let reference = request.payment_reference.trim();
        if reference.is_empty() {
            return Err(Error::invalid_request("payment reference must not be empty"));
        }
        if request.payment_method == PaymentMethod::System {
            return Err(Error::invalid_request(
                "purchases must name an external payment method",
            ));
        }
        self.apply(
            request.mechanic_id,
            TransactionKind::Purchase,
            request.amount,
            Some(request.payment_method),
            Some(reference.to_owned()),
        )
        .await
    }

    async fn refund(&self, request: RefundRequest) -> Result<Transaction, Error> {
        self.apply(
            request.mechanic_id,
            TransactionKind::Refund,
            request.amount,
            Some(PaymentMethod::System),
            request.reason,
        )
        .await
    }

    async fn debit(&self, request: DebitRequest) -> Result<Transaction, Error> {
        self.apply(
            request.mechanic_id,
            TransactionKind::Deduction,
            request.amount,
            None,
            request.reason,
        )
        .await
    }
}

/// Wallet service implementing the query driving port.
#[derive(Clone)]
pub struct WalletQueryService<W> {
    wallets: Arc<W>,
}

impl<W> WalletQueryService<W> {
    pub fn new(wallets: Arc<W>) -> Self {
        Self { wallets }
    }
}

#[async_trait]
impl<W> WalletQuery for WalletQueryService<W>
where
    W: WalletRepository,
{
    async fn balance(&self, mechanic_id: MechanicId) -> Result<u32, Error> {
        self.wallets
            .balance(mechanic_id)
            .await
            .map_err(map_wallet_repository_error)?
            .ok_or_else(|| Error::not_found(format!("mechanic {mechanic_id} not found")))
    }

    async fn history(&self, mechanic_id: MechanicId) -> Result<Vec<Transaction>, Error> {
        self.wallets
            .history(mechanic_id)
            .await
            .map_err(map_wallet_repository_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockWalletRepository;
    use crate::test_support::{MutableClock, fixture_now};

    fn service(wallets: MockWalletRepository) -> WalletCommandService<MockWalletRepository> {
        WalletCommandService::new(
            Arc::new(wallets),
            Arc::new(MutableClock::new(fixture_now())),
        )
    }

    fn purchase(reference: &str) -> CreditPurchaseRequest {
        CreditPurchaseRequest {
            mechanic_id: MechanicId::random(),
            amount: 10,
            payment_method: PaymentMethod::Jazzcash,
            payment_reference: reference.to_owned(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn purchase_records_method_and_reference() {
        let mut wallets = MockWalletRepository::new();
        wallets
            .expect_apply()
            .times(1)
            .withf(|movement| {
                movement.kind == TransactionKind::Purchase
                    && movement.reference.as_deref() == Some("JC-1001")
                    && movement.payment_method == Some(PaymentMethod::Jazzcash)
            })
            .return_once(|movement| Ok(movement.into_transaction(15)));

        let entry = service(wallets)
            .credit_purchase(purchase(" JC-1001 "))
            .await
            .expect("credited");

        assert_eq!(entry.balance_after, 15);
    }

    #[rstest]
    #[tokio::test]
    async fn replayed_purchase_is_a_conflict() {
        let mut wallets = MockWalletRepository::new();
        wallets
            .expect_apply()
            .return_once(|_| Err(WalletRepositoryError::duplicate_reference("JC-1001")));

        let err = service(wallets)
            .credit_purchase(purchase("JC-1001"))
            .await
            .expect_err("replay");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn purchase_without_reference_is_rejected(#[case] reference: &str) {
        let mut wallets = MockWalletRepository::new();
        wallets.expect_apply().times(0);

        let err = service(wallets)
            .credit_purchase(purchase(reference))
            .await
            .expect_err("no reference");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn debit_beyond_balance_is_rejected_not_clamped() {
        let mut wallets = MockWalletRepository::new();
        wallets.expect_apply().return_once(|_| {
            Err(WalletRepositoryError::insufficient_balance(0_u32, 1_u32))
        });

        let err = service(wallets)
            .debit(DebitRequest {
                mechanic_id: MechanicId::random(),
                amount: 1,
                reason: None,
            })
            .await
            .expect_err("empty wallet");

        assert_eq!(err.code(), ErrorCode::InsufficientBalance);
    }

    #[rstest]
    #[tokio::test]
    async fn zero_amount_never_reaches_the_store() {
        let mut wallets = MockWalletRepository::new();
        wallets.expect_apply().times(0);

        let err = service(wallets)
            .refund(RefundRequest {
                mechanic_id: MechanicId::random(),
                amount: 0,
                reason: Some("cancelled job".to_owned()),
            })
            .await
            .expect_err("nothing to refund");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn balance_of_unknown_mechanic_is_not_found() {
        let mut wallets = MockWalletRepository::new();
        wallets.expect_balance().return_once(|_| Ok(None));

        let err = WalletQueryService::new(Arc::new(wallets))
            .balance(MechanicId::random())
            .await
            .expect_err("unknown mechanic");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
