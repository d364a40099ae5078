use async_trait::async_trait;

use crate::domain::ports::{BookingRepository, BookingRepositoryError};
use crate::domain::{
    Booking, BookingId, BookingStatus, CustomerId, MechanicId, ProposalStatus, RequestStatus,
    Review, ServiceRequest,
};

use super::{InMemoryMarketplaceStore, MarketplaceState, newest_first};

impl MarketplaceState {
    /// Reject a booking entering `ongoing` while either party is busy elsewhere.
    fn ensure_parties_free(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        if self
            .ongoing_for_mechanic(booking.mechanic_id())
            .is_some_and(|other| other.id() != booking.id())
        {
            return Err(BookingRepositoryError::mechanic_busy(booking.mechanic_id()));
        }
        if self
            .ongoing_for_customer(booking.customer_id())
            .is_some_and(|other| other.id() != booking.id())
        {
            return Err(BookingRepositoryError::customer_busy(booking.customer_id()));
        }
        Ok(())
    }

    fn bump_mechanic(
        &mut self,
        mechanic_id: MechanicId,
        update: impl FnOnce(crate::domain::Mechanic) -> crate::domain::Mechanic,
    ) -> Result<(), BookingRepositoryError> {
        let mechanic = self.mechanics.remove(&mechanic_id).ok_or_else(|| {
            BookingRepositoryError::query(format!("mechanic {mechanic_id} missing"))
        })?;
        self.mechanics.insert(mechanic_id, update(mechanic));
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for InMemoryMarketplaceStore {
    async fn accept_proposal(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut state = self.lock().await;
        let proposal_id = booking
            .proposal_id()
            .ok_or_else(|| BookingRepositoryError::query("booking carries no proposal"))?;
        let proposal_pending = state
            .proposals
            .get(&proposal_id)
            .is_some_and(|proposal| proposal.status() == ProposalStatus::Pending);
        if !proposal_pending {
            return Err(BookingRepositoryError::proposal_not_pending(proposal_id));
        }
        let request_id = booking.request_id();
        let request = state
            .requests
            .get(&request_id)
            .filter(|request| request.status() == RequestStatus::Pending)
            .cloned()
            .ok_or_else(|| BookingRepositoryError::request_not_pending(request_id))?;
        if booking.status() == BookingStatus::Ongoing {
            state.ensure_parties_free(booking)?;
        }

        for proposal in state.proposals.values_mut() {
            if proposal.request_id() != request_id {
                continue;
            }
            if proposal.id() == proposal_id {
                *proposal = proposal.clone().with_status(ProposalStatus::Accepted);
            } else if proposal.status() == ProposalStatus::Pending {
                *proposal = proposal.clone().with_status(ProposalStatus::Rejected);
            }
        }
        state.requests.insert(
            request_id,
            request.with_status(RequestStatus::Matched, booking.created_at()),
        );
        state.bookings.insert(booking.id(), booking.clone());
        Ok(())
    }

    async fn create_direct(
        &self,
        request: &ServiceRequest,
        booking: &Booking,
    ) -> Result<(), BookingRepositoryError> {
        let mut state = self.lock().await;
        if state.requests.contains_key(&request.id()) {
            return Err(BookingRepositoryError::request_not_pending(request.id()));
        }
        if booking.status() == BookingStatus::Ongoing {
            state.ensure_parties_free(booking)?;
        }
        state.requests.insert(request.id(), request.clone());
        state.bookings.insert(booking.id(), booking.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        Ok(self.lock().await.bookings.get(&booking_id).cloned())
    }

    async fn find_ongoing_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        Ok(self
            .lock()
            .await
            .ongoing_for_mechanic(mechanic_id)
            .cloned())
    }

    async fn find_ongoing_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        Ok(self
            .lock()
            .await
            .ongoing_for_customer(customer_id)
            .cloned())
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let state = self.lock().await;
        let mut bookings: Vec<_> = state
            .bookings
            .values()
            .filter(|booking| booking.customer_id() == customer_id)
            .cloned()
            .collect();
        newest_first(&mut bookings, Booking::created_at, Booking::id);
        Ok(bookings)
    }

    async fn list_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let state = self.lock().await;
        let mut bookings: Vec<_> = state
            .bookings
            .values()
            .filter(|booking| booking.mechanic_id() == mechanic_id)
            .cloned()
            .collect();
        newest_first(&mut bookings, Booking::created_at, Booking::id);
        Ok(bookings)
    }

    async fn save(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), BookingRepositoryError> {
        let mut state = self.lock().await;
        let current_status = state
            .bookings
            .get(&booking.id())
            .map(Booking::status)
            .filter(|status| *status == expected)
            .ok_or_else(|| BookingRepositoryError::status_conflict(booking.id()))?;
        let next_status = booking.status();
        if next_status == BookingStatus::Ongoing && current_status != BookingStatus::Ongoing {
            state.ensure_parties_free(booking)?;
        }
        if next_status == BookingStatus::Completed && current_status != BookingStatus::Completed {
            state.bump_mechanic(booking.mechanic_id(), |mechanic| {
                mechanic.with_completed_job()
            })?;
        }
        state.bookings.insert(booking.id(), booking.clone());
        Ok(())
    }

    async fn record_review(
        &self,
        booking: &Booking,
        review: &Review,
    ) -> Result<(), BookingRepositoryError> {
        let mut state = self.lock().await;
        let current = state
            .bookings
            .get(&booking.id())
            .ok_or_else(|| BookingRepositoryError::status_conflict(booking.id()))?;
        if current.is_reviewed()
            || state
                .reviews
                .iter()
                .any(|existing| existing.booking_id == booking.id())
        {
            return Err(BookingRepositoryError::already_reviewed(booking.id()));
        }
        if current.status() != BookingStatus::Completed {
            return Err(BookingRepositoryError::status_conflict(booking.id()));
        }
        let stars = review.rating.stars();
        state.bump_mechanic(booking.mechanic_id(), |mechanic| mechanic.with_review(stars))?;
        state.bookings.insert(booking.id(), booking.clone());
        state.reviews.push(review.clone());
        Ok(())
    }
}
