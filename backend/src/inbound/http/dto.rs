//! JSON shapes shared by the HTTP handlers.
//!
//! Domain entities keep their fields private and carry no framework
//! derives. These DTOs flatten them into the camelCase payloads clients see
//! and register the matching OpenAPI schemas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Booking, Error, GeoPoint, Location, Mechanic, Proposal, Review, Schedule, ServiceRequest,
    Transaction,
};

use super::validation::{FieldName, parse_point, parse_schedule};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct GeoPointDto {
    #[schema(example = 33.6844)]
    pub lat: f64,
    #[schema(example = 73.0479)]
    pub lng: f64,
}

impl GeoPointDto {
    pub(crate) fn into_domain(self, field: FieldName) -> Result<GeoPoint, Error> {
        parse_point(self.lat, self.lng, field)
    }
}

impl From<GeoPoint> for GeoPointDto {
    fn from(value: GeoPoint) -> Self {
        Self {
            lat: value.latitude(),
            lng: value.longitude(),
        }
    }
}

/// A point plus the human-readable address shown to the other party.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LocationDto {
    #[schema(example = 33.6844)]
    pub lat: f64,
    #[schema(example = 73.0479)]
    pub lng: f64,
    #[serde(default)]
    #[schema(example = "Blue Area, Islamabad")]
    pub address: String,
}

impl LocationDto {
    pub(crate) fn into_domain(self, field: FieldName) -> Result<Location, Error> {
        let point = parse_point(self.lat, self.lng, field)?;
        Ok(Location::new(point, self.address.trim()))
    }
}

impl From<&Location> for LocationDto {
    fn from(value: &Location) -> Self {
        Self {
            lat: value.point().latitude(),
            lng: value.point().longitude(),
            address: value.address().to_owned(),
        }
    }
}

/// Calendar slot for a pre-booked job.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ScheduleDto {
    #[schema(example = "2026-03-20")]
    pub date: String,
    #[schema(example = "14:30")]
    pub time: String,
}

impl ScheduleDto {
    pub(crate) fn into_domain(self) -> Result<Schedule, Error> {
        parse_schedule(&self.date, &self.time)
    }
}

impl From<Schedule> for ScheduleDto {
    fn from(value: Schedule) -> Self {
        Self {
            date: value.date.format("%Y-%m-%d").to_string(),
            time: value.time.format("%H:%M").to_string(),
        }
    }
}

/// Stored attachment reference.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttachmentDto {
    #[schema(example = "photo")]
    pub kind: String,
    pub url: String,
}

/// Service request as returned to customers and mechanics.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestResponse {
    pub id: String,
    pub customer_id: String,
    #[schema(example = "car_mechanic")]
    pub category: String,
    pub description: String,
    pub location: LocationDto,
    #[schema(example = "urgent")]
    pub urgency: String,
    pub schedule: Option<ScheduleDto>,
    pub attachments: Vec<AttachmentDto>,
    #[schema(example = "pending")]
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ServiceRequest> for ServiceRequestResponse {
    fn from(value: &ServiceRequest) -> Self {
        Self {
            id: value.id().to_string(),
            customer_id: value.customer_id().to_string(),
            category: value.category().to_string(),
            description: value.description().to_owned(),
            location: LocationDto::from(value.location()),
            urgency: value.urgency().to_string(),
            schedule: value.schedule().map(ScheduleDto::from),
            attachments: value
                .attachments()
                .iter()
                .map(|attachment| AttachmentDto {
                    kind: attachment.kind.to_string(),
                    url: attachment.url.clone(),
                })
                .collect(),
            status: value.status().to_string(),
            created_at: value.created_at(),
            updated_at: value.updated_at(),
        }
    }
}

/// A mechanic's offer on a request.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResponse {
    pub id: String,
    pub request_id: String,
    pub mechanic_id: String,
    #[schema(example = 2500)]
    pub price: u32,
    #[schema(example = 45)]
    pub estimated_minutes: u32,
    pub message: Option<String>,
    /// Distance from the mechanic to the job when the offer was made.
    pub distance_km: Option<f64>,
    #[schema(example = "pending")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Proposal> for ProposalResponse {
    fn from(value: &Proposal) -> Self {
        Self {
            id: value.id().to_string(),
            request_id: value.request_id().to_string(),
            mechanic_id: value.mechanic_id().to_string(),
            price: value.price(),
            estimated_minutes: value.estimated_minutes(),
            message: value.message().map(str::to_owned),
            distance_km: value.distance_km(),
            status: value.status().to_string(),
            created_at: value.created_at(),
        }
    }
}

/// Who cancelled a booking and why.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancellationDto {
    #[schema(example = "customer")]
    pub by: String,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Star rating left on a booking.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingReviewDto {
    #[schema(example = 5)]
    pub rating: u8,
    pub comment: Option<String>,
}

/// Agreed job between a customer and a mechanic.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub customer_id: String,
    pub mechanic_id: String,
    pub request_id: String,
    pub proposal_id: Option<String>,
    #[schema(example = "car_mechanic")]
    pub category: String,
    pub price: u32,
    pub location: LocationDto,
    #[schema(example = "ongoing")]
    pub status: String,
    pub schedule: Option<ScheduleDto>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancellation: Option<CancellationDto>,
    pub review: Option<BookingReviewDto>,
    pub mechanic_live_location: Option<GeoPointDto>,
}

impl From<&Booking> for BookingResponse {
    fn from(value: &Booking) -> Self {
        Self {
            id: value.id().to_string(),
            customer_id: value.customer_id().to_string(),
            mechanic_id: value.mechanic_id().to_string(),
            request_id: value.request_id().to_string(),
            proposal_id: value.proposal_id().map(|id| id.to_string()),
            category: value.category().to_string(),
            price: value.price(),
            location: LocationDto::from(value.location()),
            status: value.status().to_string(),
            schedule: value.schedule().map(ScheduleDto::from),
            created_at: value.created_at(),
            confirmed_at: value.confirmed_at(),
            started_at: value.started_at(),
            completed_at: value.completed_at(),
            cancellation: value.cancellation().map(|cancellation| CancellationDto {
                by: cancellation.by.to_string(),
                reason: cancellation.reason.clone(),
                at: cancellation.at,
            }),
            review: value.review().map(|review| BookingReviewDto {
                rating: review.rating.stars(),
                comment: review.comment.clone(),
            }),
            mechanic_live_location: value.mechanic_live_location().map(GeoPointDto::from),
        }
    }
}

/// Public mechanic profile.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MechanicResponse {
    pub id: String,
    pub name: String,
    #[schema(example = json!(["car_mechanic", "towing"]))]
    pub categories: Vec<String>,
    pub location: Option<GeoPointDto>,
    pub is_verified: bool,
    #[schema(example = "approved")]
    pub kyc_status: String,
    pub diamond_balance: u32,
    /// Mean star rating, absent before the first review.
    pub rating: Option<f64>,
    pub rating_count: u32,
    pub completed_jobs: u32,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Mechanic> for MechanicResponse {
    fn from(value: &Mechanic) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().to_owned(),
            categories: value
                .categories()
                .iter()
                .map(ToString::to_string)
                .collect(),
            location: value.location().map(GeoPointDto::from),
            is_verified: value.is_verified(),
            kyc_status: value.kyc_status().to_string(),
            diamond_balance: value.diamond_balance(),
            rating: value.rating().average(),
            rating_count: value.rating().rating_count(),
            completed_jobs: value.completed_jobs(),
            is_online: value.is_online(),
            created_at: value.created_at(),
        }
    }
}

/// Wallet ledger entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub mechanic_id: String,
    #[schema(example = "purchase")]
    pub kind: String,
    pub amount: u32,
    pub balance_after: u32,
    #[schema(example = "jazzcash")]
    pub payment_method: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionResponse {
    fn from(value: &Transaction) -> Self {
        Self {
            id: value.id.to_string(),
            mechanic_id: value.mechanic_id.to_string(),
            kind: value.kind.to_string(),
            amount: value.amount,
            balance_after: value.balance_after,
            payment_method: value.payment_method.map(|method| method.to_string()),
            reference: value.reference.clone(),
            created_at: value.created_at,
        }
    }
}

/// Stored review.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub booking_id: String,
    pub mechanic_id: String,
    pub customer_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewResponse {
    fn from(value: &Review) -> Self {
        Self {
            id: value.id.to_string(),
            booking_id: value.booking_id.to_string(),
            mechanic_id: value.mechanic_id.to_string(),
            customer_id: value.customer_id.to_string(),
            rating: value.rating.stars(),
            comment: value.comment.clone(),
            created_at: value.created_at,
        }
    }
}

/// Map a slice of domain values into response DTOs.
pub(crate) fn map_all<'a, T: 'a, D>(items: &'a [T]) -> Vec<D>
where
    D: From<&'a T>,
{
    items.iter().map(D::from).collect()
}
