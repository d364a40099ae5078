//! Internal Diesel row structs and their conversions.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Reading a row that no longer satisfies the
//! domain rules yields a `String` describing the problem; repositories turn it
//! into a query error.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Attachment, Booking, BookingDraft, BookingId, BookingReview, Cancellation, CustomerId,
    GeoPoint, Location, Mechanic, MechanicDraft, MechanicId, Proposal, ProposalDraft, ProposalId,
    Rating, RatingAggregate, RequestId, Review, Schedule, ServiceRequest, ServiceRequestDraft,
    Transaction, TransactionId, WalletMovement,
};

use super::schema::{
    bookings, mechanics, proposals, reviews, service_requests, wallet_transactions,
};

pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|err| format!("column {column}: {err}"))
}

/// Narrow a stored non-negative integer into its domain type.
pub(crate) fn from_db_u32(value: i32, column: &str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("column {column} holds negative value {value}"))
}

/// Widen a domain counter into a storable integer.
pub(crate) fn to_db_i32(value: u32, column: &str) -> Result<i32, String> {
    i32::try_from(value).map_err(|_| format!("{column} value {value} exceeds storage range"))
}

fn point(latitude: f64, longitude: f64) -> Result<GeoPoint, String> {
    GeoPoint::new(latitude, longitude).map_err(|err| err.to_string())
}

fn optional_point(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<GeoPoint>, String> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => point(latitude, longitude).map(Some),
        (None, None) => Ok(None),
        _ => Err("half of a coordinate pair is missing".to_owned()),
    }
}

fn schedule(date: Option<NaiveDate>, time: Option<NaiveTime>) -> Option<Schedule> {
    match (date, time) {
        (Some(date), Some(time)) => Some(Schedule { date, time }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Mechanics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mechanics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MechanicRow {
    pub id: Uuid,
    pub name: String,
    pub categories: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub kyc_status: String,
    pub diamond_balance: i32,
    pub total_rating: i64,
    pub rating_count: i32,
    pub completed_jobs: i32,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
}

impl MechanicRow {
    pub(crate) fn into_domain(self) -> Result<Mechanic, String> {
        let categories = self
            .categories
            .iter()
            .map(|category| parse_column(category, "mechanics.categories"))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let total_rating = u64::try_from(self.total_rating)
            .map_err(|_| "column mechanics.total_rating is negative".to_owned())?;
        Mechanic::new(MechanicDraft {
            id: MechanicId::from_uuid(self.id),
            name: self.name,
            categories,
            location: optional_point(self.latitude, self.longitude)?,
            is_verified: self.is_verified,
            kyc_status: parse_column(&self.kyc_status, "mechanics.kyc_status")?,
            diamond_balance: from_db_u32(self.diamond_balance, "mechanics.diamond_balance")?,
            rating: RatingAggregate::new(
                total_rating,
                from_db_u32(self.rating_count, "mechanics.rating_count")?,
            ),
            completed_jobs: from_db_u32(self.completed_jobs, "mechanics.completed_jobs")?,
            is_online: self.is_online,
            created_at: self.created_at,
        })
        .map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mechanics)]
pub(crate) struct NewMechanicRow {
    pub id: Uuid,
    pub name: String,
    pub categories: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub kyc_status: &'static str,
    pub diamond_balance: i32,
    pub total_rating: i64,
    pub rating_count: i32,
    pub completed_jobs: i32,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
}

impl NewMechanicRow {
    pub(crate) fn from_domain(mechanic: &Mechanic) -> Result<Self, String> {
        let rating = mechanic.rating();
        Ok(Self {
            id: *mechanic.id().as_uuid(),
            name: mechanic.name().to_owned(),
            categories: mechanic
                .categories()
                .iter()
                .map(|category| category.as_str().to_owned())
                .collect(),
            latitude: mechanic.location().map(|point| point.latitude()),
            longitude: mechanic.location().map(|point| point.longitude()),
            is_verified: mechanic.is_verified(),
            kyc_status: mechanic.kyc_status().as_str(),
            diamond_balance: to_db_i32(mechanic.diamond_balance(), "diamond_balance")?,
            total_rating: i64::try_from(rating.total_rating())
                .map_err(|_| "total_rating exceeds storage range".to_owned())?,
            rating_count: to_db_i32(rating.rating_count(), "rating_count")?,
            completed_jobs: to_db_i32(mechanic.completed_jobs(), "completed_jobs")?,
            is_online: mechanic.is_online(),
            created_at: mechanic.created_at(),
        })
    }
}

// ---------------------------------------------------------------------------
// Service requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = service_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ServiceRequestRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub category: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub urgency: String,
    pub schedule_date: Option<NaiveDate>,
    pub schedule_time: Option<NaiveTime>,
    pub attachments: serde_json::Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequestRow {
    pub(crate) fn into_domain(self) -> Result<ServiceRequest, String> {
        let attachments: Vec<Attachment> = serde_json::from_value(self.attachments)
            .map_err(|err| format!("column service_requests.attachments: {err}"))?;
        ServiceRequest::new(ServiceRequestDraft {
            id: RequestId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            category: parse_column(&self.category, "service_requests.category")?,
            description: self.description,
            location: Location::new(point(self.latitude, self.longitude)?, self.address),
            urgency: parse_column(&self.urgency, "service_requests.urgency")?,
            schedule: schedule(self.schedule_date, self.schedule_time),
            attachments,
            status: parse_column(&self.status, "service_requests.status")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = service_requests)]
pub(crate) struct NewServiceRequestRow<'a> {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub category: &'static str,
    pub description: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub address: &'a str,
    pub urgency: &'static str,
    pub schedule_date: Option<NaiveDate>,
    pub schedule_time: Option<NaiveTime>,
    pub attachments: serde_json::Value,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewServiceRequestRow<'a> {
    pub(crate) fn from_domain(request: &'a ServiceRequest) -> Result<Self, String> {
        let location = request.location();
        Ok(Self {
            id: *request.id().as_uuid(),
            customer_id: *request.customer_id().as_uuid(),
            category: request.category().as_str(),
            description: request.description(),
            latitude: location.point().latitude(),
            longitude: location.point().longitude(),
            address: location.address(),
            urgency: request.urgency().as_str(),
            schedule_date: request.schedule().map(|slot| slot.date),
            schedule_time: request.schedule().map(|slot| slot.time),
            attachments: serde_json::to_value(request.attachments())
                .map_err(|err| format!("attachments: {err}"))?,
            status: request.status().as_str(),
            created_at: request.created_at(),
            updated_at: request.updated_at(),
        })
    }
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = proposals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProposalRow {
    pub id: Uuid,
    pub request_id: Uuid,
    pub mechanic_id: Uuid,
    pub price: i32,
    pub estimated_minutes: i32,
    pub message: Option<String>,
    pub distance_km: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ProposalRow {
    pub(crate) fn into_domain(self) -> Result<Proposal, String> {
        Proposal::new(ProposalDraft {
            id: ProposalId::from_uuid(self.id),
            request_id: RequestId::from_uuid(self.request_id),
            mechanic_id: MechanicId::from_uuid(self.mechanic_id),
            price: from_db_u32(self.price, "proposals.price")?,
            estimated_minutes: from_db_u32(self.estimated_minutes, "proposals.estimated_minutes")?,
            message: self.message,
            distance_km: self.distance_km,
            status: parse_column(&self.status, "proposals.status")?,
            created_at: self.created_at,
        })
        .map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = proposals)]
pub(crate) struct NewProposalRow<'a> {
    pub id: Uuid,
    pub request_id: Uuid,
    pub mechanic_id: Uuid,
    pub price: i32,
    pub estimated_minutes: i32,
    pub message: Option<&'a str>,
    pub distance_km: Option<f64>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewProposalRow<'a> {
    pub(crate) fn from_domain(proposal: &'a Proposal) -> Result<Self, String> {
        Ok(Self {
            id: *proposal.id().as_uuid(),
            request_id: *proposal.request_id().as_uuid(),
            mechanic_id: *proposal.mechanic_id().as_uuid(),
            price: to_db_i32(proposal.price(), "price")?,
            estimated_minutes: to_db_i32(proposal.estimated_minutes(), "estimated_minutes")?,
            message: proposal.message(),
            distance_km: proposal.distance_km(),
            status: proposal.status().as_str(),
            created_at: proposal.created_at(),
        })
    }
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub mechanic_id: Uuid,
    pub request_id: Uuid,
    pub proposal_id: Option<Uuid>,
    pub category: String,
    pub price: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub status: String,
    pub schedule_date: Option<NaiveDate>,
    pub schedule_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub is_reviewed: bool,
    pub rating: Option<i16>,
    pub review_comment: Option<String>,
    pub live_latitude: Option<f64>,
    pub live_longitude: Option<f64>,
}

impl BookingRow {
    pub(crate) fn into_domain(self) -> Result<Booking, String> {
        let cancellation = match (self.cancelled_at, self.cancelled_by.as_deref()) {
            (Some(at), Some(by)) => Some(Cancellation {
                by: parse_column(by, "bookings.cancelled_by")?,
                reason: self.cancellation_reason,
                at,
            }),
            (None, None) => None,
            _ => return Err("booking cancellation columns are inconsistent".to_owned()),
        };
        let review = match (self.is_reviewed, self.rating) {
            (true, Some(stars)) => {
                let stars = u8::try_from(stars)
                    .map_err(|_| format!("column bookings.rating holds {stars}"))?;
                Some(BookingReview {
                    rating: Rating::new(stars).map_err(|err| err.to_string())?,
                    comment: self.review_comment,
                })
            }
            (false, _) => None,
            (true, None) => return Err("reviewed booking has no rating".to_owned()),
        };
        Ok(Booking::from(BookingDraft {
            id: BookingId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            mechanic_id: MechanicId::from_uuid(self.mechanic_id),
            request_id: RequestId::from_uuid(self.request_id),
            proposal_id: self.proposal_id.map(ProposalId::from_uuid),
            category: parse_column(&self.category, "bookings.category")?,
            price: from_db_u32(self.price, "bookings.price")?,
            location: Location::new(point(self.latitude, self.longitude)?, self.address),
            status: parse_column(&self.status, "bookings.status")?,
            schedule: schedule(self.schedule_date, self.schedule_time),
            created_at: self.created_at,
            confirmed_at: self.confirmed_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            cancellation,
            review,
            mechanic_live_location: optional_point(self.live_latitude, self.live_longitude)?,
        }))
    }
}

/// Every mutable booking column; written in full on each save.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = bookings)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BookingChangeset<'a> {
    pub status: &'static str,
    pub schedule_date: Option<NaiveDate>,
    pub schedule_time: Option<NaiveTime>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<&'static str>,
    pub cancellation_reason: Option<&'a str>,
    pub is_reviewed: bool,
    pub rating: Option<i16>,
    pub review_comment: Option<&'a str>,
    pub live_latitude: Option<f64>,
    pub live_longitude: Option<f64>,
}

impl<'a> BookingChangeset<'a> {
    pub(crate) fn from_domain(booking: &'a Booking) -> Self {
        let cancellation = booking.cancellation();
        let review = booking.review();
        let live = booking.mechanic_live_location();
        Self {
            status: booking.status().as_str(),
            schedule_date: booking.schedule().map(|slot| slot.date),
            schedule_time: booking.schedule().map(|slot| slot.time),
            confirmed_at: booking.confirmed_at(),
            started_at: booking.started_at(),
            completed_at: booking.completed_at(),
            cancelled_at: cancellation.map(|cancel| cancel.at),
            cancelled_by: cancellation.map(|cancel| cancel.by.as_str()),
            cancellation_reason: cancellation.and_then(|cancel| cancel.reason.as_deref()),
            is_reviewed: review.is_some(),
            rating: review.map(|review| i16::from(review.rating.stars())),
            review_comment: review.and_then(|review| review.comment.as_deref()),
            live_latitude: live.map(|point| point.latitude()),
            live_longitude: live.map(|point| point.longitude()),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow<'a> {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub mechanic_id: Uuid,
    pub request_id: Uuid,
    pub proposal_id: Option<Uuid>,
    pub category: &'static str,
    pub price: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub address: &'a str,
    pub created_at: DateTime<Utc>,
    #[diesel(embed)]
    pub state: BookingChangeset<'a>,
}

impl<'a> NewBookingRow<'a> {
    pub(crate) fn from_domain(booking: &'a Booking) -> Result<Self, String> {
        let location = booking.location();
        Ok(Self {
            id: *booking.id().as_uuid(),
            customer_id: *booking.customer_id().as_uuid(),
            mechanic_id: *booking.mechanic_id().as_uuid(),
            request_id: *booking.request_id().as_uuid(),
            proposal_id: booking.proposal_id().map(Uuid::from),
            category: booking.category().as_str(),
            price: to_db_i32(booking.price(), "price")?,
            latitude: location.point().latitude(),
            longitude: location.point().longitude(),
            address: location.address(),
            created_at: booking.created_at(),
            state: BookingChangeset::from_domain(booking),
        })
    }
}

// ---------------------------------------------------------------------------
// Wallet ledger and reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = wallet_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub id: Uuid,
    pub mechanic_id: Uuid,
    pub kind: String,
    pub amount: i32,
    pub balance_after: i32,
    pub payment_method: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRow {
    pub(crate) fn into_domain(self) -> Result<Transaction, String> {
        Ok(Transaction {
            id: TransactionId::from_uuid(self.id),
            mechanic_id: MechanicId::from_uuid(self.mechanic_id),
            kind: parse_column(&self.kind, "wallet_transactions.kind")?,
            amount: from_db_u32(self.amount, "wallet_transactions.amount")?,
            balance_after: from_db_u32(self.balance_after, "wallet_transactions.balance_after")?,
            payment_method: self
                .payment_method
                .as_deref()
                .map(|method| parse_column(method, "wallet_transactions.payment_method"))
                .transpose()?,
            reference: self.reference,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallet_transactions)]
pub(crate) struct NewTransactionRow<'a> {
    pub id: Uuid,
    pub mechanic_id: Uuid,
    pub kind: &'static str,
    pub amount: i32,
    pub balance_after: i32,
    pub payment_method: Option<&'static str>,
    pub reference: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewTransactionRow<'a> {
    pub(crate) fn from_movement(
        movement: &'a WalletMovement,
        balance_after: i32,
        amount: i32,
    ) -> Self {
        Self {
            id: *movement.id.as_uuid(),
            mechanic_id: *movement.mechanic_id.as_uuid(),
            kind: movement.kind.as_str(),
            amount,
            balance_after,
            payment_method: movement.payment_method.map(|method| method.as_str()),
            reference: movement.reference.as_deref(),
            created_at: movement.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub(crate) struct NewReviewRow<'a> {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub mechanic_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub comment: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewReviewRow<'a> {
    pub(crate) fn from_domain(review: &'a Review) -> Self {
        Self {
            id: *review.id.as_uuid(),
            booking_id: *review.booking_id.as_uuid(),
            mechanic_id: *review.mechanic_id.as_uuid(),
            customer_id: *review.customer_id.as_uuid(),
            rating: i16::from(review.rating.stars()),
            comment: review.comment.as_deref(),
            created_at: review.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion edge cases that never touch a database.
    use rstest::rstest;

    use super::*;
    use crate::domain::{BookingStatus, KycStatus};
    use crate::test_support::{fixture_now, job_location};

    fn mechanic_row() -> MechanicRow {
        MechanicRow {
            id: Uuid::new_v4(),
            name: "Bilal Autos".to_owned(),
            categories: vec!["car_mechanic".to_owned(), "towing".to_owned()],
            latitude: Some(31.52),
            longitude: Some(74.35),
            is_verified: true,
            kyc_status: "approved".to_owned(),
            diamond_balance: 5,
            total_rating: 9,
            rating_count: 2,
            completed_jobs: 2,
            is_online: true,
            created_at: fixture_now(),
        }
    }

    fn booking_row() -> BookingRow {
        let location = job_location();
        BookingRow {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            mechanic_id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            proposal_id: None,
            category: "car_mechanic".to_owned(),
            price: 1500,
            latitude: location.point().latitude(),
            longitude: location.point().longitude(),
            address: location.address().to_owned(),
            status: "completed".to_owned(),
            schedule_date: None,
            schedule_time: None,
            created_at: fixture_now(),
            confirmed_at: None,
            started_at: Some(fixture_now()),
            completed_at: Some(fixture_now()),
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            is_reviewed: true,
            rating: Some(5),
            review_comment: Some("Quick and tidy".to_owned()),
            live_latitude: None,
            live_longitude: None,
        }
    }

    #[rstest]
    fn mechanic_row_maps_categories_and_rating() {
        let mechanic = mechanic_row().into_domain().expect("valid row");

        assert_eq!(mechanic.categories().len(), 2);
        assert_eq!(mechanic.kyc_status(), KycStatus::Approved);
        assert_eq!(mechanic.rating().rating_count(), 2);
        assert_eq!(mechanic.diamond_balance(), 5);
    }

    #[rstest]
    fn unknown_category_is_reported_with_its_column() {
        let mut row = mechanic_row();
        row.categories.push("plumbing".to_owned());

        let err = row.into_domain().expect_err("bad category");

        assert!(err.contains("mechanics.categories"), "{err}");
    }

    #[rstest]
    fn negative_balance_is_rejected() {
        let mut row = mechanic_row();
        row.diamond_balance = -1;

        assert!(row.into_domain().is_err());
    }

    #[rstest]
    fn half_a_coordinate_pair_is_rejected() {
        let mut row = mechanic_row();
        row.longitude = None;

        assert!(row.into_domain().is_err());
    }

    #[rstest]
    fn booking_row_rebuilds_review() {
        let booking = booking_row().into_domain().expect("valid row");

        assert_eq!(booking.status(), BookingStatus::Completed);
        assert!(booking.is_reviewed());
        assert_eq!(
            booking.review().map(|review| review.rating.stars()),
            Some(5)
        );
    }

    #[rstest]
    fn booking_changeset_round_trips_through_a_row() {
        let booking = booking_row().into_domain().expect("valid row");

        let changeset = BookingChangeset::from_domain(&booking);

        assert_eq!(changeset.status, "completed");
        assert!(changeset.is_reviewed);
        assert_eq!(changeset.rating, Some(5));
        assert_eq!(changeset.review_comment, Some("Quick and tidy"));
    }
}
