//! PostgreSQL-backed `WalletRepository`.
//!
//! Balances change through a single conditional `UPDATE ... RETURNING`, so
//! concurrent debits serialise on the mechanic row and the balance can never
//! drop below zero. The ledger row is written in the same transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{WalletRepository, WalletRepositoryError};
use crate::domain::{MechanicId, Transaction, TransactionKind, WalletMovement};

use super::error_mapping::{self, TxError, violated_unique_constraint};
use super::models::{NewTransactionRow, TransactionRow, from_db_u32, to_db_i32};
use super::pool::{DbPool, PoolError};
use super::schema::{mechanics, wallet_transactions};

const PURCHASE_REFERENCE_KEY: &str = "wallet_transactions_purchase_reference_key";

/// Diesel-backed implementation of the `WalletRepository` port.
#[derive(Clone)]
pub struct DieselWalletRepository {
    pool: DbPool,
}

impl DieselWalletRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> WalletRepositoryError {
    error_mapping::map_pool_error(error, WalletRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> WalletRepositoryError {
    error_mapping::map_diesel_error(
        error,
        WalletRepositoryError::query,
        WalletRepositoryError::connection,
    )
}

fn rejected(message: String) -> TxError<WalletRepositoryError> {
    TxError::Rejected(WalletRepositoryError::query(message))
}

/// Explain why the conditional balance update matched no row.
async fn refused_movement(
    conn: &mut AsyncPgConnection,
    movement: &WalletMovement,
) -> Result<WalletRepositoryError, TxError<WalletRepositoryError>> {
    let current: Option<i32> = mechanics::table
        .find(movement.mechanic_id.as_uuid())
        .select(mechanics::diamond_balance)
        .first(conn)
        .await
        .optional()?;
    let Some(current) = current else {
        return Ok(WalletRepositoryError::mechanic_not_found(
            movement.mechanic_id,
        ));
    };
    let balance = from_db_u32(current, "mechanics.diamond_balance").map_err(rejected)?;
    Ok(match movement.kind {
        TransactionKind::Deduction => {
            WalletRepositoryError::insufficient_balance(balance, movement.amount)
        }
        TransactionKind::Purchase | TransactionKind::Refund => {
            WalletRepositoryError::balance_overflow(balance)
        }
    })
}

/// Apply `movement` on an open transaction and append its ledger row.
///
/// Shared with proposal submission so the fee debit commits or rolls back
/// together with the proposal.
pub(super) async fn apply_movement(
    conn: &mut AsyncPgConnection,
    movement: WalletMovement,
) -> Result<Transaction, TxError<WalletRepositoryError>> {
    let amount = to_db_i32(movement.amount, "amount").map_err(rejected)?;
    let owner = mechanics::table.filter(mechanics::id.eq(movement.mechanic_id.as_uuid()));

    let updated: Option<i32> = match movement.kind {
        TransactionKind::Deduction => diesel::update(
            owner.filter(mechanics::diamond_balance.ge(amount)),
        )
        .set(mechanics::diamond_balance.eq(mechanics::diamond_balance - amount))
        .returning(mechanics::diamond_balance)
        .get_result(conn)
        .await
        .optional()?,
        TransactionKind::Purchase | TransactionKind::Refund => diesel::update(
            owner.filter(mechanics::diamond_balance.le(i32::MAX - amount)),
        )
        .set(mechanics::diamond_balance.eq(mechanics::diamond_balance + amount))
        .returning(mechanics::diamond_balance)
        .get_result(conn)
        .await
        .optional()?,
    };
    let Some(balance_after) = updated else {
        return Err(TxError::Rejected(refused_movement(conn, &movement).await?));
    };

    let row = NewTransactionRow::from_movement(&movement, balance_after, amount);
    let inserted = diesel::insert_into(wallet_transactions::table)
        .values(&row)
        .execute(conn)
        .await;
    if let Err(error) = inserted {
        if violated_unique_constraint(&error).as_deref() == Some(PURCHASE_REFERENCE_KEY) {
            let reference = movement.reference.clone().unwrap_or_default();
            return Err(TxError::Rejected(
                WalletRepositoryError::duplicate_reference(reference),
            ));
        }
        return Err(error.into());
    }

    let balance_after =
        from_db_u32(balance_after, "mechanics.diamond_balance").map_err(rejected)?;
    Ok(movement.into_transaction(balance_after))
}

#[async_trait]
impl WalletRepository for DieselWalletRepository {
    async fn apply(&self, movement: WalletMovement) -> Result<Transaction, WalletRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| async move { apply_movement(conn, movement).await }.scope_boxed())
            .await
            .map_err(|error: TxError<WalletRepositoryError>| {
                error.into_port_error(map_diesel_error)
            })
    }

    async fn balance(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<u32>, WalletRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let balance: Option<i32> = mechanics::table
            .find(mechanic_id.as_uuid())
            .select(mechanics::diamond_balance)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        balance
            .map(|value| {
                from_db_u32(value, "mechanics.diamond_balance")
                    .map_err(WalletRepositoryError::query)
            })
            .transpose()
    }

    async fn history(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Transaction>, WalletRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let exists: Option<uuid::Uuid> = mechanics::table
            .find(mechanic_id.as_uuid())
            .select(mechanics::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        if exists.is_none() {
            return Err(WalletRepositoryError::mechanic_not_found(mechanic_id));
        }

        let rows: Vec<TransactionRow> = wallet_transactions::table
            .filter(wallet_transactions::mechanic_id.eq(mechanic_id.as_uuid()))
            .order((
                wallet_transactions::created_at.desc(),
                wallet_transactions::id.desc(),
            ))
            .select(TransactionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(WalletRepositoryError::query))
            .collect()
    }
}
