//! Driving port for proposal submission and acceptance.

use async_trait::async_trait;

use crate::domain::{Booking, CustomerId, Error, MechanicId, Proposal, ProposalId, RequestId};

/// A mechanic's offer on a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitProposalRequest {
    pub mechanic_id: MechanicId,
    pub request_id: RequestId,
    pub price: u32,
    pub estimated_minutes: u32,
    pub message: Option<String>,
}

/// Recorded proposal plus the wallet balance left after paying its fee.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitProposalResponse {
    pub proposal: Proposal,
    pub diamond_balance: u32,
}

/// A customer picking one proposal on their request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptProposalRequest {
    pub customer_id: CustomerId,
    pub proposal_id: ProposalId,
}

/// Driving port for proposal write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProposalCommand: Send + Sync {
    /// Record an offer and charge the proposal fee atomically.
    ///
    /// Fails with `insufficient_balance` when the wallet cannot cover the fee
    /// and with `conflict` when the mechanic already proposed on the request.
    async fn submit_proposal(
        &self,
        request: SubmitProposalRequest,
    ) -> Result<SubmitProposalResponse, Error>;

    /// Turn a proposal into a booking, rejecting its siblings.
    async fn accept_proposal(&self, request: AcceptProposalRequest) -> Result<Booking, Error>;
}
