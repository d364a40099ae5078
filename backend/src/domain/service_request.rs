//! Service requests posted by customers.
//!
//! A request is visible to mechanics while it is pending and either scheduled
//! for a future slot or still inside the live window. Requests are never
//! deleted; their status records how they left the feed.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire_enum::wire_enum;
use super::{CustomerId, Location, RequestId, ServiceCategory};

/// Longest accepted free-text description.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

wire_enum! {
    /// Lifecycle of a service request.
    pub enum RequestStatus as "request status" {
        /// Open for proposals.
        Pending => "pending",
        /// A proposal was accepted or a direct booking was made.
        Matched => "matched",
        /// Fell out of the live window without being matched.
        Expired => "expired",
        /// Withdrawn by the customer.
        Cancelled => "cancelled",
    }
}

impl RequestStatus {
    /// Whether a request may move from this status to `next`.
    ///
    /// Only pending requests move, and every move lands in a terminal status.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Matched | Self::Expired | Self::Cancelled)
        )
    }
}

wire_enum! {
    /// How quickly the customer needs help.
    pub enum Urgency as "urgency" {
        Standard => "standard",
        Urgent => "urgent",
        Emergency => "emergency",
    }
}

wire_enum! {
    /// Media attached to a request.
    pub enum AttachmentKind as "attachment kind" {
        Photo => "photo",
        Voice => "voice",
    }
}

/// Date and time slot for a pre-booked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Schedule {
    /// Wall-clock start of the slot.
    #[must_use]
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// A stored attachment reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub url: String,
}

/// Validation errors raised by [`ServiceRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceRequestValidationError {
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("address must not be empty")]
    EmptyAddress,
}

/// Input used to construct a [`ServiceRequest`].
#[derive(Debug, Clone)]
pub struct ServiceRequestDraft {
    pub id: RequestId,
    pub customer_id: CustomerId,
    pub category: ServiceCategory,
    pub description: String,
    pub location: Location,
    pub urgency: Urgency,
    pub schedule: Option<Schedule>,
    pub attachments: Vec<Attachment>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer's request for on-site work.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    id: RequestId,
    customer_id: CustomerId,
    category: ServiceCategory,
    description: String,
    location: Location,
    urgency: Urgency,
    schedule: Option<Schedule>,
    attachments: Vec<Attachment>,
    status: RequestStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// Validate a draft and build the request.
    pub fn new(draft: ServiceRequestDraft) -> Result<Self, ServiceRequestValidationError> {
        let description = draft.description.trim().to_owned();
        if description.is_empty() {
            return Err(ServiceRequestValidationError::EmptyDescription);
        }
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(ServiceRequestValidationError::DescriptionTooLong {
                max: MAX_DESCRIPTION_CHARS,
            });
        }
        if draft.location.address().trim().is_empty() {
            return Err(ServiceRequestValidationError::EmptyAddress);
        }

        Ok(Self {
            id: draft.id,
            customer_id: draft.customer_id,
            category: draft.category,
            description,
            location: draft.location,
            urgency: draft.urgency,
            schedule: draft.schedule,
            attachments: draft.attachments,
            status: draft.status,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn category(&self) -> ServiceCategory {
        self.category
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn schedule(&self) -> Option<Schedule> {
        self.schedule
    }

    /// Scheduled requests carry a slot and stay visible until matched.
    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True while an unscheduled request is younger than `window`.
    pub fn is_live(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.created_at > now - window
    }

    /// Whether mechanics may see and answer this request.
    ///
    /// # Examples
    /// ```
    /// # use chrono::{Duration, Utc};
    /// # use marketplace::domain::*;
    /// let now = Utc::now();
    /// let request = ServiceRequest::new(ServiceRequestDraft {
    ///     id: RequestId::random(),
    ///     customer_id: CustomerId::random(),
    ///     category: ServiceCategory::CarMechanic,
    ///     description: "Engine will not start".to_owned(),
    ///     location: Location::new(GeoPoint::new(33.68, 73.04).expect("point"), "Blue Area"),
    ///     urgency: Urgency::Urgent,
    ///     schedule: None,
    ///     attachments: Vec::new(),
    ///     status: RequestStatus::Pending,
    ///     created_at: now - Duration::minutes(11),
    ///     updated_at: now,
    /// })
    /// .expect("valid request");
    /// assert!(!request.is_visible_to_mechanics(now, Duration::minutes(10)));
    /// ```
    pub fn is_visible_to_mechanics(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.status == RequestStatus::Pending && (self.is_scheduled() || self.is_live(now, window))
    }

    /// Copy of the request with a new status.
    #[must_use]
    pub fn with_status(&self, status: RequestStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: at,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::GeoPoint;

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    fn draft(created_at: DateTime<Utc>, schedule: Option<Schedule>) -> ServiceRequestDraft {
        ServiceRequestDraft {
            id: RequestId::random(),
            customer_id: CustomerId::random(),
            category: ServiceCategory::CarMechanic,
            description: "  Flat battery  ".to_owned(),
            location: Location::new(
                GeoPoint::new(33.6844, 73.0479).expect("valid point"),
                "Jinnah Avenue",
            ),
            urgency: Urgency::Standard,
            schedule,
            attachments: Vec::new(),
            status: RequestStatus::Pending,
            created_at,
            updated_at: created_at,
        }
    }

    fn slot() -> Schedule {
        Schedule {
            date: NaiveDate::from_ymd_opt(2026, 3, 4).expect("valid date"),
            time: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
        }
    }

    #[rstest]
    fn new_trims_description(now: DateTime<Utc>) {
        let request = ServiceRequest::new(draft(now, None)).expect("valid request");
        assert_eq!(request.description(), "Flat battery");
    }

    #[rstest]
    #[case("   ", ServiceRequestValidationError::EmptyDescription)]
    fn new_rejects_blank_description(
        now: DateTime<Utc>,
        #[case] description: &str,
        #[case] expected: ServiceRequestValidationError,
    ) {
        let mut input = draft(now, None);
        input.description = description.to_owned();
        assert_eq!(ServiceRequest::new(input), Err(expected));
    }

    #[rstest]
    fn new_rejects_overlong_description(now: DateTime<Utc>) {
        let mut input = draft(now, None);
        input.description = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(matches!(
            ServiceRequest::new(input),
            Err(ServiceRequestValidationError::DescriptionTooLong { .. })
        ));
    }

    #[rstest]
    #[case(Duration::minutes(2), None, true)]
    #[case(Duration::minutes(10), None, false)]
    #[case(Duration::minutes(30), None, false)]
    #[case(Duration::days(3), Some(slot()), true)]
    fn visibility_follows_live_window_and_schedule(
        now: DateTime<Utc>,
        #[case] age: Duration,
        #[case] schedule: Option<Schedule>,
        #[case] expected: bool,
    ) {
        let request = ServiceRequest::new(draft(now - age, schedule)).expect("valid request");
        assert_eq!(
            request.is_visible_to_mechanics(now, Duration::minutes(10)),
            expected
        );
    }

    #[rstest]
    #[case(RequestStatus::Matched)]
    #[case(RequestStatus::Expired)]
    #[case(RequestStatus::Cancelled)]
    fn non_pending_requests_are_never_visible(now: DateTime<Utc>, #[case] status: RequestStatus) {
        let request = ServiceRequest::new(draft(now, Some(slot())))
            .expect("valid request")
            .with_status(status, now);
        assert!(!request.is_visible_to_mechanics(now, Duration::minutes(10)));
    }

    #[rstest]
    #[case(RequestStatus::Pending, RequestStatus::Matched, true)]
    #[case(RequestStatus::Pending, RequestStatus::Expired, true)]
    #[case(RequestStatus::Pending, RequestStatus::Cancelled, true)]
    #[case(RequestStatus::Pending, RequestStatus::Pending, false)]
    #[case(RequestStatus::Matched, RequestStatus::Pending, false)]
    #[case(RequestStatus::Expired, RequestStatus::Pending, false)]
    #[case(RequestStatus::Cancelled, RequestStatus::Pending, false)]
    #[case(RequestStatus::Matched, RequestStatus::Cancelled, false)]
    fn only_pending_requests_change_status(
        #[case] from: RequestStatus,
        #[case] to: RequestStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn schedule_starts_at_combines_date_and_time() {
        let starts_at = slot().starts_at();
        assert_eq!(starts_at.to_string(), "2026-03-04 09:30:00");
    }
}
