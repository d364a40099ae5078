//! Proposal domain services.
//!
//! Submitting a proposal charges the mechanic one diamond in the same store
//! transaction that records the proposal. Accepting one creates the booking.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::booking_service::map_booking_repository_error;
use crate::domain::matching_service::map_mechanic_repository_error;
use crate::domain::ports::{
    AcceptProposalRequest, BookingRepository, MechanicRepository, NotificationSender,
    ProposalCommand, ProposalQuery, ProposalRepository, ProposalRepositoryError,
    RequestChanged, RequestEventBus, ServiceRequestRepository, SubmitProposalRequest,
    SubmitProposalResponse,
};
use crate::domain::service_request_service::map_request_repository_error;
use crate::domain::{
    Booking, BookingId, Error, MechanicId, Notification, PROPOSAL_COST_DIAMONDS, Proposal,
    ProposalDraft, ProposalId, ProposalStatus, RequestId, RequestStatus, TransactionId,
    TransactionKind, WalletMovement, distance_km,
};

pub(crate) fn map_proposal_repository_error(error: ProposalRepositoryError) -> Error {
    match error {
        ProposalRepositoryError::Duplicate {
            mechanic_id,
            request_id,
        } => Error::conflict(format!(
            "mechanic {mechanic_id} already submitted a proposal for request {request_id}"
        )),
        ProposalRepositoryError::InsufficientBalance { balance } => {
            Error::insufficient_balance(format!(
                "submitting a proposal costs {PROPOSAL_COST_DIAMONDS} diamond; balance is {balance}"
            ))
        }
        ProposalRepositoryError::MechanicNotFound { mechanic_id } => {
            Error::not_found(format!("mechanic {mechanic_id} not found"))
        }
        ProposalRepositoryError::RequestNotPending { request_id } => Error::invalid_state(
            format!("service request {request_id} is no longer accepting proposals"),
        ),
        ProposalRepositoryError::Connection { message } => {
            Error::remote_failure(format!("proposal repository unavailable: {message}"))
        }
        ProposalRepositoryError::Query { message } => {
            Error::internal(format!("proposal repository error: {message}"))
        }
    }
}

/// Repositories the proposal command service coordinates.
pub struct ProposalStores<P, R, M, B> {
    pub proposals: Arc<P>,
    pub requests: Arc<R>,
    pub mechanics: Arc<M>,
    pub bookings: Arc<B>,
}

impl<P, R, M, B> Clone for ProposalStores<P, R, M, B> {
    fn clone(&self) -> Self {
        Self {
            proposals: Arc::clone(&self.proposals),
            requests: Arc::clone(&self.requests),
            mechanics: Arc::clone(&self.mechanics),
            bookings: Arc::clone(&self.bookings),
        }
    }
}

/// Proposal service implementing the command driving port.
#[derive(Clone)]
pub struct ProposalCommandService<P, R, M, B> {
    stores: ProposalStores<P, R, M, B>,
    notifier: Arc<dyn NotificationSender>,
    events: Arc<dyn RequestEventBus>,
    clock: Arc<dyn Clock>,
}

impl<P, R, M, B> ProposalCommandService<P, R, M, B> {
    pub fn new(
        stores: ProposalStores<P, R, M, B>,
        notifier: Arc<dyn NotificationSender>,
        events: Arc<dyn RequestEventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            notifier,
            events,
            clock,
        }
    }

    async fn notify(&self, notification: Notification) {
        if let Err(err) = self.notifier.send(&notification).await {
            warn!(kind = %notification.kind, error = %err, "failed to send notification");
        }
    }
}

#[async_trait]
impl<P, R, M, B> ProposalCommand for ProposalCommandService<P, R, M, B>
where
    P: ProposalRepository,
    R: ServiceRequestRepository,
    M: MechanicRepository,
    B: BookingRepository,
{
    async fn submit_proposal(
        &self,
        request: SubmitProposalRequest,
    ) -> Result<SubmitProposalResponse, Error> {
        let service_request = self
            .stores
            .requests
            .find_by_id(request.request_id)
            .await
            .map_err(map_request_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("service request {} not found", request.request_id))
            })?;
        if service_request.status() != RequestStatus::Pending {
            return Err(Error::invalid_state(format!(
                "service request {} is {} and no longer accepting proposals",
                request.request_id,
                service_request.status()
            )));
        }
        let mechanic = self
            .stores
            .mechanics
            .find_by_id(request.mechanic_id)
            .await
            .map_err(map_mechanic_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("mechanic {} not found", request.mechanic_id))
            })?;
        if !mechanic.is_eligible_for(service_request.category()) {
            return Err(Error::forbidden(format!(
                "mechanic {} is not verified for {}",
                mechanic.id(),
                service_request.category()
            )));
        }

        let now = self.clock.utc();
        let proposal = Proposal::new(ProposalDraft {
            id: ProposalId::random(),
            request_id: service_request.id(),
            mechanic_id: mechanic.id(),
            price: request.price,
            estimated_minutes: request.estimated_minutes,
            message: request.message,
            distance_km: mechanic
                .location()
                .map(|at| distance_km(at, service_request.location().point())),
            status: ProposalStatus::Pending,
            created_at: now,
        })
        .map_err(|err| Error::invalid_request(format!("invalid proposal: {err}")))?;
        let fee = WalletMovement {
            id: TransactionId::random(),
            mechanic_id: mechanic.id(),
            kind: TransactionKind::Deduction,
            amount: PROPOSAL_COST_DIAMONDS,
            payment_method: None,
            reference: Some(format!("proposal:{}", proposal.id())),
            created_at: now,
        };

        let charged = self
            .stores
            .proposals
            .submit(&proposal, fee)
            .await
            .map_err(map_proposal_repository_error)?;
        info!(
            proposal_id = %proposal.id(),
            request_id = %proposal.request_id(),
            mechanic_id = %proposal.mechanic_id(),
            balance_after = charged.balance_after,
            "proposal submitted"
        );

        self.notify(Notification::new_proposal(
            service_request.customer_id(),
            &proposal,
        ))
        .await;

        Ok(SubmitProposalResponse {
            proposal,
            diamond_balance: charged.balance_after,
        })
    }

    async fn accept_proposal(&self, request: AcceptProposalRequest) -> Result<Booking, Error> {
        let proposal = self
            .stores
            .proposals
            .find_by_id(request.proposal_id)
            .await
            .map_err(map_proposal_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("proposal {} not found", request.proposal_id))
            })?;
        let service_request = self
            .stores
            .requests
            .find_by_id(proposal.request_id())
            .await
            .map_err(map_request_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("service request {} not found", proposal.request_id()))
            })?;
        if service_request.customer_id() != request.customer_id {
            return Err(Error::forbidden(
                "only the customer who posted the request may accept its proposals",
            ));
        }
        if proposal.status() != ProposalStatus::Pending {
            return Err(Error::invalid_state(format!(
                "proposal {} is {}",
                proposal.id(),
                proposal.status()
            )));
        }
        if service_request.status() != RequestStatus::Pending {
            return Err(Error::invalid_state(format!(
                "service request {} is {}",
                service_request.id(),
                service_request.status()
            )));
        }

        let booking = Booking::from_accepted_proposal(
            BookingId::random(),
            &service_request,
            &proposal,
            self.clock.utc(),
        );
        self.stores
            .bookings
            .accept_proposal(&booking)
            .await
            .map_err(map_booking_repository_error)?;
        info!(
            booking_id = %booking.id(),
            proposal_id = %proposal.id(),
            request_id = %service_request.id(),
            status = %booking.status(),
            "proposal accepted"
        );

        self.events.publish(RequestChanged {
            request_id: service_request.id(),
            category: service_request.category(),
            status: RequestStatus::Matched,
        });
        self.notify(Notification::proposal_accepted(&booking)).await;
        Ok(booking)
    }
}

/// Proposal service implementing the query driving port.
#[derive(Clone)]
pub struct ProposalQueryService<P> {
    proposals: Arc<P>,
}

impl<P> ProposalQueryService<P> {
    pub fn new(proposals: Arc<P>) -> Self {
        Self { proposals }
    }
}

#[async_trait]
impl<P> ProposalQuery for ProposalQueryService<P>
where
    P: ProposalRepository,
{
    async fn list_for_request(&self, request_id: RequestId) -> Result<Vec<Proposal>, Error> {
        self.proposals
            .list_for_request(request_id)
            .await
            .map_err(map_proposal_repository_error)
    }

    async fn list_for_mechanic(&self, mechanic_id: MechanicId) -> Result<Vec<Proposal>, Error> {
        self.proposals
            .list_for_mechanic(mechanic_id)
            .await
            .map_err(map_proposal_repository_error)
    }
}

#[cfg(test)]
#[path = "proposal_service_tests.rs"]
mod tests;
