use async_trait::async_trait;

use crate::domain::ports::{ProposalRepository, ProposalRepositoryError, WalletRepositoryError};
use crate::domain::{
    MechanicId, Proposal, ProposalId, RequestId, RequestStatus, Transaction, WalletMovement,
};

use super::{InMemoryMarketplaceStore, newest_first};

fn map_fee_error(error: WalletRepositoryError) -> ProposalRepositoryError {
    match error {
        WalletRepositoryError::MechanicNotFound { mechanic_id } => {
            ProposalRepositoryError::mechanic_not_found(mechanic_id)
        }
        WalletRepositoryError::InsufficientBalance { balance, .. } => {
            ProposalRepositoryError::insufficient_balance(balance)
        }
        other => ProposalRepositoryError::query(other.to_string()),
    }
}

#[async_trait]
impl ProposalRepository for InMemoryMarketplaceStore {
    async fn submit(
        &self,
        proposal: &Proposal,
        fee: WalletMovement,
    ) -> Result<Transaction, ProposalRepositoryError> {
        let mut state = self.lock().await;
        let request_id = proposal.request_id();
        let pending = state
            .requests
            .get(&request_id)
            .is_some_and(|request| request.status() == RequestStatus::Pending);
        if !pending {
            return Err(ProposalRepositoryError::request_not_pending(request_id));
        }
        if state.proposals.values().any(|existing| {
            existing.request_id() == request_id && existing.mechanic_id() == proposal.mechanic_id()
        }) {
            return Err(ProposalRepositoryError::duplicate(
                proposal.mechanic_id(),
                request_id,
            ));
        }
        let entry = state.apply_movement(fee).map_err(map_fee_error)?;
        state.proposals.insert(proposal.id(), proposal.clone());
        Ok(entry)
    }

    async fn find_by_id(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<Proposal>, ProposalRepositoryError> {
        Ok(self.lock().await.proposals.get(&proposal_id).cloned())
    }

    async fn list_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<Proposal>, ProposalRepositoryError> {
        let state = self.lock().await;
        let mut proposals: Vec<_> = state
            .proposals
            .values()
            .filter(|proposal| proposal.request_id() == request_id)
            .cloned()
            .collect();
        newest_first(&mut proposals, Proposal::created_at, Proposal::id);
        Ok(proposals)
    }

    async fn list_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Proposal>, ProposalRepositoryError> {
        let state = self.lock().await;
        let mut proposals: Vec<_> = state
            .proposals
            .values()
            .filter(|proposal| proposal.mechanic_id() == mechanic_id)
            .cloned()
            .collect();
        newest_first(&mut proposals, Proposal::created_at, Proposal::id);
        Ok(proposals)
    }
}
