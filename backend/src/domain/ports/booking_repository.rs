//! Port for booking persistence.
//!
//! Every multi-entity write here is a single transaction in the adapter:
//! accepting a proposal, creating a direct booking, status writes and
//! reviews. The one-ongoing-booking rule is enforced at write time.

use async_trait::async_trait;

use crate::domain::{
    Booking, BookingId, BookingStatus, CustomerId, MechanicId, ProposalId, RequestId, Review,
    ServiceRequest,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        /// The request is missing or no longer pending.
        RequestNotPending { request_id: RequestId } =>
            "request {request_id} is no longer pending",
        /// The proposal is missing or no longer pending.
        ProposalNotPending { proposal_id: ProposalId } =>
            "proposal {proposal_id} is no longer pending",
        /// The mechanic already has an ongoing booking.
        MechanicBusy { mechanic_id: MechanicId } =>
            "mechanic {mechanic_id} already has an ongoing booking",
        /// The customer already has an ongoing booking.
        CustomerBusy { customer_id: CustomerId } =>
            "customer {customer_id} already has an ongoing booking",
        /// The booking changed since it was read.
        StatusConflict { booking_id: BookingId } =>
            "booking {booking_id} was modified concurrently",
        /// The booking already carries a review.
        AlreadyReviewed { booking_id: BookingId } =>
            "booking {booking_id} was already reviewed",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "booking repository query failed: {message}",
    }
}

/// Port for creating and updating bookings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Accept `booking.proposal_id()` and insert `booking` atomically.
    ///
    /// The proposal moves to accepted, every other pending proposal on the
    /// request moves to rejected and the request moves from pending to
    /// matched.
    async fn accept_proposal(&self, booking: &Booking) -> Result<(), BookingRepositoryError>;

    /// Insert an already matched request and its direct booking together.
    async fn create_direct(
        &self,
        request: &ServiceRequest,
        booking: &Booking,
    ) -> Result<(), BookingRepositoryError>;

    /// Find a booking by id.
    async fn find_by_id(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<Booking>, BookingRepositoryError>;

    /// The mechanic's ongoing booking, if any.
    async fn find_ongoing_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<Booking>, BookingRepositoryError>;

    /// The customer's ongoing booking, if any.
    async fn find_ongoing_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Booking>, BookingRepositoryError>;

    /// A customer's bookings, newest first.
    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// A mechanic's bookings, newest first.
    async fn list_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// Write `booking` if the stored status still equals `expected`.
    ///
    /// Entering `completed` increments the mechanic's completed job counter
    /// in the same transaction. Entering `ongoing` fails when either party
    /// already has another ongoing booking.
    async fn save(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), BookingRepositoryError>;

    /// Store the review, flag the booking reviewed and bump the mechanic's
    /// rating aggregate atomically.
    async fn record_review(
        &self,
        booking: &Booking,
        review: &Review,
    ) -> Result<(), BookingRepositoryError>;
}
