//! Booking domain services.
//!
//! Every status write is a compare-and-set against the status the service
//! read, so two racing actors cannot both move the same booking.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::matching_service::map_mechanic_repository_error;
use crate::domain::ports::{
    BookingActor, BookingCommand, BookingQuery, BookingRepository, BookingRepositoryError,
    DirectBookingRequest, LiveLocationUpdate, MechanicRepository, NotificationSender,
    RouteEstimate, RouteEstimateSource, SubmitReviewRequest,
};
use crate::domain::{
    Booking, BookingId, BookingReview, BookingRuleError, BookingStatus, BookingTransition,
    CustomerId, Error, GeoPoint, MAX_COMMENT_CHARS, MechanicId, Notification, RequestId,
    RequestStatus, Review, ReviewId, Schedule, ServiceRequest, ServiceRequestDraft, Urgency,
    distance_km, has_arrived,
};

pub(crate) fn map_booking_repository_error(error: BookingRepositoryError) -> Error {
    match error {
        BookingRepositoryError::RequestNotPending { request_id } => {
            Error::conflict(format!("service request {request_id} is no longer pending"))
        }
        BookingRepositoryError::ProposalNotPending { proposal_id } => {
            Error::conflict(format!("proposal {proposal_id} is no longer pending"))
        }
        BookingRepositoryError::MechanicBusy { mechanic_id } => Error::conflict(format!(
            "mechanic {mechanic_id} already has an ongoing booking"
        )),
        BookingRepositoryError::CustomerBusy { customer_id } => Error::conflict(format!(
            "customer {customer_id} already has an ongoing booking"
        )),
        BookingRepositoryError::StatusConflict { booking_id } => {
            Error::conflict(format!("booking {booking_id} was modified concurrently"))
        }
        BookingRepositoryError::AlreadyReviewed { booking_id } => {
            Error::invalid_state(format!("booking {booking_id} was already reviewed"))
        }
        BookingRepositoryError::Connection { message } => {
            Error::remote_failure(format!("booking repository unavailable: {message}"))
        }
        BookingRepositoryError::Query { message } => {
            Error::internal(format!("booking repository error: {message}"))
        }
    }
}

fn map_rule_error(error: BookingRuleError) -> Error {
    Error::invalid_state(error.to_string())
}

fn ensure_future(schedule: Schedule, clock: &dyn Clock) -> Result<(), Error> {
    if schedule.starts_at() <= clock.utc().naive_utc() {
        return Err(Error::invalid_request("scheduled time must be in the future"));
    }
    Ok(())
}

fn normalise_comment(comment: Option<String>) -> Result<Option<String>, Error> {
    let comment = comment
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty());
    if let Some(text) = &comment
        && text.chars().count() > MAX_COMMENT_CHARS
    {
        return Err(Error::invalid_request(format!(
            "review comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(comment)
}

/// Booking service implementing the command driving port.
#[derive(Clone)]
pub struct BookingCommandService<B, M> {
    bookings: Arc<B>,
    mechanics: Arc<M>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
}

impl<B, M> BookingCommandService<B, M> {
    pub fn new(
        bookings: Arc<B>,
        mechanics: Arc<M>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            mechanics,
            notifier,
            clock,
        }
    }
}

impl<B, M> BookingCommandService<B, M>
where
    B: BookingRepository,
{
    async fn load_for(&self, actor: BookingActor, booking_id: BookingId) -> Result<Booking, Error> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await
            .map_err(map_booking_repository_error)?
            .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))?;
        if !actor.is_party_to(&booking) {
            return Err(Error::forbidden(format!(
                "booking {booking_id} belongs to another {}",
                actor.party()
            )));
        }
        Ok(booking)
    }

    async fn save(&self, next: &Booking, expected: BookingStatus) -> Result<(), Error> {
        self.bookings
            .save(next, expected)
            .await
            .map_err(map_booking_repository_error)
    }

    async fn transition(
        &self,
        actor: BookingActor,
        booking_id: BookingId,
        transition: BookingTransition,
    ) -> Result<Booking, Error> {
        let current = self.load_for(actor, booking_id).await?;
        let next = current
            .apply(transition, self.clock.utc())
            .map_err(map_rule_error)?;
        self.save(&next, current.status()).await?;
        info!(
            %booking_id,
            from = %current.status(),
            to = %next.status(),
            "booking transitioned"
        );
        Ok(next)
    }
}

#[async_trait]
impl<B, M> BookingCommand for BookingCommandService<B, M>
where
    B: BookingRepository,
    M: MechanicRepository,
{
    async fn book_directly(&self, request: DirectBookingRequest) -> Result<Booking, Error> {
        if request.price == 0 {
            return Err(Error::invalid_request("price must be greater than zero"));
        }
        ensure_future(request.schedule, self.clock.as_ref())?;
        let mechanic = self
            .mechanics
            .find_by_id(request.mechanic_id)
            .await
            .map_err(map_mechanic_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("mechanic {} not found", request.mechanic_id))
            })?;
        if !mechanic.is_eligible_for(request.category) {
            return Err(Error::invalid_request(format!(
                "mechanic {} is not verified for {}",
                mechanic.id(),
                request.category
            )));
        }

        let now = self.clock.utc();
        let service_request = ServiceRequest::new(ServiceRequestDraft {
            id: RequestId::random(),
            customer_id: request.customer_id,
            category: request.category,
            description: request.description,
            location: request.location,
            urgency: Urgency::Standard,
            schedule: Some(request.schedule),
            attachments: Vec::new(),
            status: RequestStatus::Matched,
            created_at: now,
            updated_at: now,
        })
        .map_err(|err| Error::invalid_request(format!("invalid booking request: {err}")))?;
        let booking = Booking::direct(
            BookingId::random(),
            &service_request,
            mechanic.id(),
            request.price,
            now,
        );

        self.bookings
            .create_direct(&service_request, &booking)
            .await
            .map_err(map_booking_repository_error)?;
        info!(
            booking_id = %booking.id(),
            mechanic_id = %booking.mechanic_id(),
            customer_id = %booking.customer_id(),
            "direct booking created"
        );
        Ok(booking)
    }

    async fn confirm(
        &self,
        mechanic_id: MechanicId,
        booking_id: BookingId,
    ) -> Result<Booking, Error> {
        self.transition(
            BookingActor::Mechanic(mechanic_id),
            booking_id,
            BookingTransition::Confirm,
        )
        .await
    }

    async fn start_job(
        &self,
        mechanic_id: MechanicId,
        booking_id: BookingId,
    ) -> Result<Booking, Error> {
        self.transition(
            BookingActor::Mechanic(mechanic_id),
            booking_id,
            BookingTransition::Start,
        )
        .await
    }

    async fn complete_job(
        &self,
        mechanic_id: MechanicId,
        booking_id: BookingId,
    ) -> Result<Booking, Error> {
        self.transition(
            BookingActor::Mechanic(mechanic_id),
            booking_id,
            BookingTransition::Complete,
        )
        .await
    }

    async fn cancel(
        &self,
        actor: BookingActor,
        booking_id: BookingId,
        reason: Option<String>,
    ) -> Result<Booking, Error> {
        let by = actor.party();
        let reason = reason
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        let cancelled = self
            .transition(actor, booking_id, BookingTransition::Cancel { by, reason })
            .await?;

        let notification = Notification::booking_cancelled(&cancelled, by);
        if let Err(err) = self.notifier.send(&notification).await {
            warn!(%booking_id, error = %err, "failed to notify cancellation");
        }
        Ok(cancelled)
    }

    async fn reschedule(
        &self,
        customer_id: CustomerId,
        booking_id: BookingId,
        schedule: Schedule,
    ) -> Result<Booking, Error> {
        ensure_future(schedule, self.clock.as_ref())?;
        let current = self
            .load_for(BookingActor::Customer(customer_id), booking_id)
            .await?;
        let next = current.reschedule(schedule).map_err(map_rule_error)?;
        self.save(&next, current.status()).await?;
        info!(%booking_id, "booking rescheduled");
        Ok(next)
    }

    async fn update_live_location(
        &self,
        mechanic_id: MechanicId,
        booking_id: BookingId,
        location: GeoPoint,
    ) -> Result<LiveLocationUpdate, Error> {
        let current = self
            .load_for(BookingActor::Mechanic(mechanic_id), booking_id)
            .await?;
        let next = current
            .with_live_location(location)
            .map_err(map_rule_error)?;
        self.save(&next, current.status()).await?;

        let destination = next.location().point();
        Ok(LiveLocationUpdate {
            booking_id,
            location,
            distance_km: distance_km(location, destination),
            arrived: has_arrived(location, destination),
        })
    }

    async fn submit_review(&self, request: SubmitReviewRequest) -> Result<Review, Error> {
        let comment = normalise_comment(request.comment)?;
        let current = self
            .load_for(BookingActor::Customer(request.customer_id), request.booking_id)
            .await?;
        let reviewed = current
            .with_review(BookingReview {
                rating: request.rating,
                comment: comment.clone(),
            })
            .map_err(map_rule_error)?;
        let review = Review {
            id: ReviewId::random(),
            booking_id: reviewed.id(),
            mechanic_id: reviewed.mechanic_id(),
            customer_id: reviewed.customer_id(),
            rating: request.rating,
            comment,
            created_at: self.clock.utc(),
        };

        self.bookings
            .record_review(&reviewed, &review)
            .await
            .map_err(map_booking_repository_error)?;
        info!(
            booking_id = %review.booking_id,
            mechanic_id = %review.mechanic_id,
            stars = review.rating.stars(),
            "review recorded"
        );
        Ok(review)
    }
}

/// Booking service implementing the query driving port.
#[derive(Clone)]
pub struct BookingQueryService<B, M> {
    bookings: Arc<B>,
    mechanics: Arc<M>,
    routes: Arc<dyn RouteEstimateSource>,
}

impl<B, M> BookingQueryService<B, M> {
    pub fn new(bookings: Arc<B>, mechanics: Arc<M>, routes: Arc<dyn RouteEstimateSource>) -> Self {
        Self {
            bookings,
            mechanics,
            routes,
        }
    }
}

#[async_trait]
impl<B, M> BookingQuery for BookingQueryService<B, M>
where
    B: BookingRepository,
    M: MechanicRepository,
{
    async fn get_booking(&self, booking_id: BookingId) -> Result<Booking, Error> {
        self.bookings
            .find_by_id(booking_id)
            .await
            .map_err(map_booking_repository_error)?
            .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))
    }

    async fn ongoing_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<Booking>, Error> {
        self.bookings
            .find_ongoing_for_mechanic(mechanic_id)
            .await
            .map_err(map_booking_repository_error)
    }

    async fn ongoing_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Booking>, Error> {
        self.bookings
            .find_ongoing_for_customer(customer_id)
            .await
            .map_err(map_booking_repository_error)
    }

    async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Booking>, Error> {
        self.bookings
            .list_for_customer(customer_id)
            .await
            .map_err(map_booking_repository_error)
    }

    async fn list_for_mechanic(&self, mechanic_id: MechanicId) -> Result<Vec<Booking>, Error> {
        self.bookings
            .list_for_mechanic(mechanic_id)
            .await
            .map_err(map_booking_repository_error)
    }

    async fn route_to_job(&self, booking_id: BookingId) -> Result<RouteEstimate, Error> {
        let booking = self.get_booking(booking_id).await?;
        if booking.status().is_terminal() {
            return Err(Error::invalid_state(format!(
                "booking {booking_id} is {}",
                booking.status()
            )));
        }
        let origin = match booking.mechanic_live_location() {
            Some(point) => point,
            None => self
                .mechanics
                .find_by_id(booking.mechanic_id())
                .await
                .map_err(map_mechanic_repository_error)?
                .and_then(|mechanic| mechanic.location())
                .ok_or_else(|| {
                    Error::invalid_state("the mechanic has not shared a location yet")
                })?,
        };

        self.routes
            .estimate(origin, booking.location().point())
            .await
            .map_err(|err| Error::remote_failure(format!("route estimate failed: {err}")))
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
