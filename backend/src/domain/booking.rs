//! Bookings and their lifecycle state machine.
//!
//! ```text
//! scheduled ──confirm──▶ confirmed ──start──▶ ongoing ──complete──▶ completed
//!     │                      │                   │
//!     └────────cancel────────┴───────cancel──────┴──▶ cancelled
//! ```
//!
//! `scheduled` may also start directly. `completed` and `cancelled` are
//! terminal. Every transition returns a new [`Booking`]; stores persist it
//! with a compare-and-set on the prior status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire_enum::wire_enum;
use super::{
    BookingId, CustomerId, GeoPoint, Location, MechanicId, Proposal, ProposalId, Rating,
    RequestId, Schedule, ServiceCategory, ServiceRequest,
};

wire_enum! {
    /// Booking lifecycle states.
    pub enum BookingStatus as "booking status" {
        Scheduled => "scheduled",
        Confirmed => "confirmed",
        Ongoing => "ongoing",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl BookingStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

wire_enum! {
    /// Which side of a booking acted.
    pub enum Party as "party" {
        Customer => "customer",
        Mechanic => "mechanic",
    }
}

/// A requested lifecycle move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingTransition {
    Confirm,
    Start,
    Complete,
    Cancel { by: Party, reason: Option<String> },
}

impl BookingTransition {
    const fn verb(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel { .. } => "cancel",
        }
    }
}

/// Rule violations raised by booking operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingRuleError {
    #[error("cannot {action} a booking that is {from}")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },
    #[error("only bookings with a scheduled slot can be rescheduled")]
    NotScheduled,
    #[error("cannot reschedule a booking that is {0}")]
    CannotReschedule(BookingStatus),
    #[error("only completed bookings can be reviewed")]
    NotCompleted,
    #[error("booking has already been reviewed")]
    AlreadyReviewed,
    #[error("live location can only be shared while the job is ongoing")]
    NotOngoing,
}

impl BookingStatus {
    /// Target state for `transition`, or an error when the move is not allowed.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::{BookingStatus, BookingTransition};
    ///
    /// assert_eq!(
    ///     BookingStatus::Scheduled.next(&BookingTransition::Start),
    ///     Ok(BookingStatus::Ongoing)
    /// );
    /// assert!(BookingStatus::Completed.next(&BookingTransition::Start).is_err());
    /// ```
    pub fn next(self, transition: &BookingTransition) -> Result<Self, BookingRuleError> {
        match (self, transition) {
            (Self::Scheduled, BookingTransition::Confirm) => Ok(Self::Confirmed),
            (Self::Scheduled | Self::Confirmed, BookingTransition::Start) => Ok(Self::Ongoing),
            (Self::Ongoing, BookingTransition::Complete) => Ok(Self::Completed),
            (
                Self::Scheduled | Self::Confirmed | Self::Ongoing,
                BookingTransition::Cancel { .. },
            ) => Ok(Self::Cancelled),
            (from, transition) => Err(BookingRuleError::InvalidTransition {
                from,
                action: transition.verb(),
            }),
        }
    }
}

/// Who cancelled, why and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub by: Party,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// The customer's review stored on the booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReview {
    pub rating: Rating,
    pub comment: Option<String>,
}

/// Every field of a [`Booking`], used by stores to rebuild one.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub mechanic_id: MechanicId,
    pub request_id: RequestId,
    pub proposal_id: Option<ProposalId>,
    pub category: ServiceCategory,
    pub price: u32,
    pub location: Location,
    pub status: BookingStatus,
    pub schedule: Option<Schedule>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancellation: Option<Cancellation>,
    pub review: Option<BookingReview>,
    pub mechanic_live_location: Option<GeoPoint>,
}

/// An agreed job between one customer and one mechanic.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    id: BookingId,
    customer_id: CustomerId,
    mechanic_id: MechanicId,
    request_id: RequestId,
    proposal_id: Option<ProposalId>,
    category: ServiceCategory,
    price: u32,
    location: Location,
    status: BookingStatus,
    schedule: Option<Schedule>,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    cancellation: Option<Cancellation>,
    review: Option<BookingReview>,
    mechanic_live_location: Option<GeoPoint>,
}

impl From<BookingDraft> for Booking {
    fn from(draft: BookingDraft) -> Self {
        Self {
            id: draft.id,
            customer_id: draft.customer_id,
            mechanic_id: draft.mechanic_id,
            request_id: draft.request_id,
            proposal_id: draft.proposal_id,
            category: draft.category,
            price: draft.price,
            location: draft.location,
            status: draft.status,
            schedule: draft.schedule,
            created_at: draft.created_at,
            confirmed_at: draft.confirmed_at,
            started_at: draft.started_at,
            completed_at: draft.completed_at,
            cancellation: draft.cancellation,
            review: draft.review,
            mechanic_live_location: draft.mechanic_live_location,
        }
    }
}

impl Booking {
    /// Booking created when a customer accepts a proposal.
    ///
    /// Immediate requests start `ongoing`; scheduled requests start
    /// `scheduled` and keep the slot.
    pub fn from_accepted_proposal(
        id: BookingId,
        request: &ServiceRequest,
        proposal: &Proposal,
        now: DateTime<Utc>,
    ) -> Self {
        let status = if request.is_scheduled() {
            BookingStatus::Scheduled
        } else {
            BookingStatus::Ongoing
        };
        Self::from(BookingDraft {
            id,
            customer_id: request.customer_id(),
            mechanic_id: proposal.mechanic_id(),
            request_id: request.id(),
            proposal_id: Some(proposal.id()),
            category: request.category(),
            price: proposal.price(),
            location: request.location().clone(),
            status,
            schedule: request.schedule(),
            created_at: now,
            confirmed_at: None,
            started_at: (status == BookingStatus::Ongoing).then_some(now),
            completed_at: None,
            cancellation: None,
            review: None,
            mechanic_live_location: None,
        })
    }

    /// Pre-booked job with a chosen mechanic and no proposal round.
    pub fn direct(
        id: BookingId,
        request: &ServiceRequest,
        mechanic_id: MechanicId,
        price: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self::from(BookingDraft {
            id,
            customer_id: request.customer_id(),
            mechanic_id,
            request_id: request.id(),
            proposal_id: None,
            category: request.category(),
            price,
            location: request.location().clone(),
            status: BookingStatus::Scheduled,
            schedule: request.schedule(),
            created_at: now,
            confirmed_at: None,
            started_at: None,
            completed_at: None,
            cancellation: None,
            review: None,
            mechanic_live_location: None,
        })
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn mechanic_id(&self) -> MechanicId {
        self.mechanic_id
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn proposal_id(&self) -> Option<ProposalId> {
        self.proposal_id
    }

    pub fn category(&self) -> ServiceCategory {
        self.category
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn schedule(&self) -> Option<Schedule> {
        self.schedule
    }

    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn cancellation(&self) -> Option<&Cancellation> {
        self.cancellation.as_ref()
    }

    pub fn review(&self) -> Option<&BookingReview> {
        self.review.as_ref()
    }

    pub fn is_reviewed(&self) -> bool {
        self.review.is_some()
    }

    pub fn mechanic_live_location(&self) -> Option<GeoPoint> {
        self.mechanic_live_location
    }

    /// Apply a lifecycle transition, stamping the matching timestamp.
    pub fn apply(
        &self,
        transition: BookingTransition,
        now: DateTime<Utc>,
    ) -> Result<Self, BookingRuleError> {
        let status = self.status.next(&transition)?;
        let mut next = Self {
            status,
            ..self.clone()
        };
        match transition {
            BookingTransition::Confirm => next.confirmed_at = Some(now),
            BookingTransition::Start => next.started_at = Some(now),
            BookingTransition::Complete => next.completed_at = Some(now),
            BookingTransition::Cancel { by, reason } => {
                next.cancellation = Some(Cancellation {
                    by,
                    reason,
                    at: now,
                });
            }
        }
        Ok(next)
    }

    /// Move a pre-booked job to a new slot without changing its state.
    pub fn reschedule(&self, schedule: Schedule) -> Result<Self, BookingRuleError> {
        if self.schedule.is_none() {
            return Err(BookingRuleError::NotScheduled);
        }
        if !matches!(
            self.status,
            BookingStatus::Scheduled | BookingStatus::Confirmed
        ) {
            return Err(BookingRuleError::CannotReschedule(self.status));
        }
        Ok(Self {
            schedule: Some(schedule),
            ..self.clone()
        })
    }

    /// Attach the customer's review to a completed booking.
    pub fn with_review(&self, review: BookingReview) -> Result<Self, BookingRuleError> {
        if self.status != BookingStatus::Completed {
            return Err(BookingRuleError::NotCompleted);
        }
        if self.review.is_some() {
            return Err(BookingRuleError::AlreadyReviewed);
        }
        Ok(Self {
            review: Some(review),
            ..self.clone()
        })
    }

    /// Record the mechanic's position while the job is underway.
    pub fn with_live_location(&self, point: GeoPoint) -> Result<Self, BookingRuleError> {
        if self.status != BookingStatus::Ongoing {
            return Err(BookingRuleError::NotOngoing);
        }
        Ok(Self {
            mechanic_live_location: Some(point),
            ..self.clone()
        })
    }
}
