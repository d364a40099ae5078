//! Driving port for proposal reads.

use async_trait::async_trait;

use crate::domain::{Error, MechanicId, Proposal, RequestId};

/// Driving port for proposal read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProposalQuery: Send + Sync {
    /// Proposals on a request, newest first.
    async fn list_for_request(&self, request_id: RequestId) -> Result<Vec<Proposal>, Error>;

    /// A mechanic's own proposals, newest first.
    async fn list_for_mechanic(&self, mechanic_id: MechanicId) -> Result<Vec<Proposal>, Error>;
}
