//! Driving port for booking reads and route estimates.

use async_trait::async_trait;

use crate::domain::{Booking, BookingId, CustomerId, Error, MechanicId};

use super::RouteEstimate;

/// Driving port for booking read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingQuery: Send + Sync {
    /// Fetch one booking.
    async fn get_booking(&self, booking_id: BookingId) -> Result<Booking, Error>;

    /// The mechanic's current ongoing job, if any.
    async fn ongoing_for_mechanic(&self, mechanic_id: MechanicId)
    -> Result<Option<Booking>, Error>;

    /// The customer's current ongoing job, if any.
    async fn ongoing_for_customer(&self, customer_id: CustomerId)
    -> Result<Option<Booking>, Error>;

    /// A customer's bookings, newest first.
    async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Booking>, Error>;

    /// A mechanic's bookings, newest first.
    async fn list_for_mechanic(&self, mechanic_id: MechanicId) -> Result<Vec<Booking>, Error>;

    /// Route from the mechanic's last known position to the job location.
    async fn route_to_job(&self, booking_id: BookingId) -> Result<RouteEstimate, Error>;
}
