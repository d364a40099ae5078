//! Driving port for booking lifecycle operations.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{
    Booking, BookingId, CustomerId, Error, GeoPoint, Location, MechanicId, Party, Rating, Review,
    Schedule, ServiceCategory,
};

/// The authenticated side performing a booking action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingActor {
    Customer(CustomerId),
    Mechanic(MechanicId),
}

impl BookingActor {
    pub fn party(self) -> Party {
        match self {
            Self::Customer(_) => Party::Customer,
            Self::Mechanic(_) => Party::Mechanic,
        }
    }

    /// Whether this actor is one of the booking's two parties.
    pub fn is_party_to(self, booking: &Booking) -> bool {
        match self {
            Self::Customer(id) => booking.customer_id() == id,
            Self::Mechanic(id) => booking.mechanic_id() == id,
        }
    }
}

/// A pre-booked job with a chosen mechanic.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectBookingRequest {
    pub customer_id: CustomerId,
    pub mechanic_id: MechanicId,
    pub category: ServiceCategory,
    pub description: String,
    pub location: Location,
    pub schedule: Schedule,
    pub price: u32,
}

/// Result of a live location ping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveLocationUpdate {
    pub booking_id: BookingId,
    pub location: GeoPoint,
    /// Distance to the job location, two decimals.
    pub distance_km: f64,
    /// Whether the mechanic is within the arrival threshold.
    pub arrived: bool,
}

/// A customer's rating of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReviewRequest {
    pub customer_id: CustomerId,
    pub booking_id: BookingId,
    pub rating: Rating,
    pub comment: Option<String>,
}

/// Driving port for booking write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingCommand: Send + Sync {
    /// Create a scheduled booking without a proposal round.
    async fn book_directly(&self, request: DirectBookingRequest) -> Result<Booking, Error>;

    /// Mechanic confirms a scheduled booking.
    async fn confirm(&self, mechanic_id: MechanicId, booking_id: BookingId)
    -> Result<Booking, Error>;

    /// Mechanic starts the job.
    async fn start_job(
        &self,
        mechanic_id: MechanicId,
        booking_id: BookingId,
    ) -> Result<Booking, Error>;

    /// Mechanic finishes the job.
    async fn complete_job(
        &self,
        mechanic_id: MechanicId,
        booking_id: BookingId,
    ) -> Result<Booking, Error>;

    /// Either party cancels; the other side is notified.
    async fn cancel(
        &self,
        actor: BookingActor,
        booking_id: BookingId,
        reason: Option<String>,
    ) -> Result<Booking, Error>;

    /// Customer moves a pre-booked job to a new slot.
    async fn reschedule(
        &self,
        customer_id: CustomerId,
        booking_id: BookingId,
        schedule: Schedule,
    ) -> Result<Booking, Error>;

    /// Mechanic shares their position while the job is ongoing.
    async fn update_live_location(
        &self,
        mechanic_id: MechanicId,
        booking_id: BookingId,
        location: GeoPoint,
    ) -> Result<LiveLocationUpdate, Error>;

    /// Customer rates a completed job once.
    async fn submit_review(&self, request: SubmitReviewRequest) -> Result<Review, Error>;
}
