//! PostgreSQL-backed `ProposalRepository`.
//!
//! Submission locks the request row, inserts the proposal and debits the fee
//! in one transaction. The `(mechanic_id, request_id)` unique key turns a
//! concurrent double submission into a rejected duplicate.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{ProposalRepository, ProposalRepositoryError, WalletRepositoryError};
use crate::domain::{
    MechanicId, Proposal, ProposalId, RequestId, RequestStatus, Transaction, WalletMovement,
};

use super::diesel_wallet_repository::apply_movement;
use super::error_mapping::{self, TxError, violated_unique_constraint};
use super::models::{NewProposalRow, ProposalRow};
use super::pool::{DbPool, PoolError};
use super::schema::{proposals, service_requests};

const MECHANIC_REQUEST_KEY: &str = "proposals_mechanic_request_key";

/// Diesel-backed implementation of the `ProposalRepository` port.
#[derive(Clone)]
pub struct DieselProposalRepository {
    pool: DbPool,
}

impl DieselProposalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProposalRepositoryError {
    error_mapping::map_pool_error(error, ProposalRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProposalRepositoryError {
    error_mapping::map_diesel_error(
        error,
        ProposalRepositoryError::query,
        ProposalRepositoryError::connection,
    )
}

/// Translate a failed fee debit into the proposal port's vocabulary.
fn map_fee_error(error: WalletRepositoryError) -> ProposalRepositoryError {
    match error {
        WalletRepositoryError::InsufficientBalance { balance, .. } => {
            ProposalRepositoryError::insufficient_balance(balance)
        }
        WalletRepositoryError::MechanicNotFound { mechanic_id } => {
            ProposalRepositoryError::mechanic_not_found(mechanic_id)
        }
        WalletRepositoryError::Connection { message } => {
            ProposalRepositoryError::connection(message)
        }
        other => ProposalRepositoryError::query(other.to_string()),
    }
}

fn rows_into_domain(rows: Vec<ProposalRow>) -> Result<Vec<Proposal>, ProposalRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(ProposalRepositoryError::query))
        .collect()
}

#[async_trait]
impl ProposalRepository for DieselProposalRepository {
    async fn submit(
        &self,
        proposal: &Proposal,
        fee: WalletMovement,
    ) -> Result<Transaction, ProposalRepositoryError> {
        let row = NewProposalRow::from_domain(proposal).map_err(ProposalRepositoryError::query)?;
        let request_id = proposal.request_id();
        let mechanic_id = proposal.mechanic_id();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let status: Option<String> = service_requests::table
                    .find(request_id.as_uuid())
                    .select(service_requests::status)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if status.as_deref() != Some(RequestStatus::Pending.as_str()) {
                    return Err(TxError::Rejected(
                        ProposalRepositoryError::request_not_pending(request_id),
                    ));
                }

                let inserted = diesel::insert_into(proposals::table)
                    .values(&row)
                    .execute(conn)
                    .await;
                if let Err(error) = inserted {
                    if violated_unique_constraint(&error).as_deref() == Some(MECHANIC_REQUEST_KEY)
                    {
                        return Err(TxError::Rejected(ProposalRepositoryError::duplicate(
                            mechanic_id,
                            request_id,
                        )));
                    }
                    return Err(error.into());
                }

                apply_movement(conn, fee).await.map_err(|error| match error {
                    TxError::Diesel(error) => TxError::Diesel(error),
                    TxError::Rejected(error) => TxError::Rejected(map_fee_error(error)),
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(|error: TxError<ProposalRepositoryError>| {
            error.into_port_error(map_diesel_error)
        })
    }

    async fn find_by_id(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<Proposal>, ProposalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ProposalRow> = proposals::table
            .find(proposal_id.as_uuid())
            .select(ProposalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_domain().map_err(ProposalRepositoryError::query))
            .transpose()
    }

    async fn list_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<Proposal>, ProposalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProposalRow> = proposals::table
            .filter(proposals::request_id.eq(request_id.as_uuid()))
            .order((proposals::created_at.desc(), proposals::id.desc()))
            .select(ProposalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_into_domain(rows)
    }

    async fn list_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Proposal>, ProposalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProposalRow> = proposals::table
            .filter(proposals::mechanic_id.eq(mechanic_id.as_uuid()))
            .order((proposals::created_at.desc(), proposals::id.desc()))
            .select(ProposalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_into_domain(rows)
    }
}
