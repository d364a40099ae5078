//! Port for the proposal ledger.

use async_trait::async_trait;

use crate::domain::{
    MechanicId, Proposal, ProposalId, RequestId, Transaction, WalletMovement,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by proposal repository adapters.
    pub enum ProposalRepositoryError {
        /// The mechanic already has a proposal on this request.
        Duplicate { mechanic_id: MechanicId, request_id: RequestId } =>
            "mechanic {mechanic_id} already proposed on request {request_id}",
        /// The submission fee could not be debited.
        InsufficientBalance { balance: u32 } =>
            "insufficient diamonds: balance {balance}",
        /// The proposing mechanic does not exist.
        MechanicNotFound { mechanic_id: MechanicId } =>
            "mechanic {mechanic_id} not found",
        /// The request is missing or no longer pending.
        RequestNotPending { request_id: RequestId } =>
            "request {request_id} is not open for proposals",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "proposal repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "proposal repository query failed: {message}",
    }
}

/// Port for recording proposals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Record a proposal and charge its fee as one atomic unit.
    ///
    /// Adapters must reject a second proposal for the same mechanic and
    /// request, reject requests that are no longer pending, and debit the
    /// wallet with the same non-negative guarantee as
    /// [`super::WalletRepository::apply`]. Nothing is written on failure.
    async fn submit(
        &self,
        proposal: &Proposal,
        fee: WalletMovement,
    ) -> Result<Transaction, ProposalRepositoryError>;

    /// Find a proposal by id.
    async fn find_by_id(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<Proposal>, ProposalRepositoryError>;

    /// Proposals on a request, newest first.
    async fn list_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<Proposal>, ProposalRepositoryError>;

    /// Proposals submitted by a mechanic, newest first.
    async fn list_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Proposal>, ProposalRepositoryError>;
}
