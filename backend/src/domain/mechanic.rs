//! Mechanic profiles and the eligibility rule used by matching.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::wire_enum::wire_enum;
use super::{GeoPoint, MechanicId, ServiceCategory};

wire_enum! {
    /// Identity-verification state.
    pub enum KycStatus as "kyc status" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// Running totals behind a mechanic's star rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingAggregate {
    total_rating: u64,
    rating_count: u32,
}

impl RatingAggregate {
    pub const fn new(total_rating: u64, rating_count: u32) -> Self {
        Self {
            total_rating,
            rating_count,
        }
    }

    pub const fn total_rating(&self) -> u64 {
        self.total_rating
    }

    pub const fn rating_count(&self) -> u32 {
        self.rating_count
    }

    /// Mean rating, or `None` before the first review.
    #[expect(
        clippy::cast_precision_loss,
        reason = "rating totals stay far below 2^52"
    )]
    pub fn average(&self) -> Option<f64> {
        (self.rating_count > 0).then(|| self.total_rating as f64 / f64::from(self.rating_count))
    }

    /// Aggregate after adding one more review.
    #[must_use]
    pub fn record(self, stars: u8) -> Self {
        Self {
            total_rating: self.total_rating + u64::from(stars),
            rating_count: self.rating_count + 1,
        }
    }
}

/// Validation errors raised by [`Mechanic::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MechanicValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("a mechanic must offer at least one category")]
    NoCategories,
}

/// Input used to construct a [`Mechanic`].
#[derive(Debug, Clone)]
pub struct MechanicDraft {
    pub id: MechanicId,
    pub name: String,
    pub categories: BTreeSet<ServiceCategory>,
    pub location: Option<GeoPoint>,
    pub is_verified: bool,
    pub kyc_status: KycStatus,
    pub diamond_balance: u32,
    pub rating: RatingAggregate,
    pub completed_jobs: u32,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
}

/// A mechanic's profile as seen by the dispatch core.
///
/// The diamond balance is unsigned, so a negative balance cannot be
/// represented. Stores enforce the non-negative debit rule atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct Mechanic {
    id: MechanicId,
    name: String,
    categories: BTreeSet<ServiceCategory>,
    location: Option<GeoPoint>,
    is_verified: bool,
    kyc_status: KycStatus,
    diamond_balance: u32,
    rating: RatingAggregate,
    completed_jobs: u32,
    is_online: bool,
    created_at: DateTime<Utc>,
}

impl Mechanic {
    pub fn new(draft: MechanicDraft) -> Result<Self, MechanicValidationError> {
        let name = draft.name.trim().to_owned();
        if name.is_empty() {
            return Err(MechanicValidationError::EmptyName);
        }
        if draft.categories.is_empty() {
            return Err(MechanicValidationError::NoCategories);
        }
        Ok(Self {
            id: draft.id,
            name,
            categories: draft.categories,
            location: draft.location,
            is_verified: draft.is_verified,
            kyc_status: draft.kyc_status,
            diamond_balance: draft.diamond_balance,
            rating: draft.rating,
            completed_jobs: draft.completed_jobs,
            is_online: draft.is_online,
            created_at: draft.created_at,
        })
    }

    pub fn id(&self) -> MechanicId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn categories(&self) -> &BTreeSet<ServiceCategory> {
        &self.categories
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified
    }

    pub fn kyc_status(&self) -> KycStatus {
        self.kyc_status
    }

    pub fn diamond_balance(&self) -> u32 {
        self.diamond_balance
    }

    pub fn rating(&self) -> RatingAggregate {
        self.rating
    }

    pub fn completed_jobs(&self) -> u32 {
        self.completed_jobs
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Eligible mechanics are KYC approved, verified and offer the category.
    pub fn is_eligible_for(&self, category: ServiceCategory) -> bool {
        self.kyc_status == KycStatus::Approved
            && self.is_verified
            && self.categories.contains(&category)
    }

    #[must_use]
    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_online(mut self, is_online: bool) -> Self {
        self.is_online = is_online;
        self
    }

    /// Apply a KYC decision; approval verifies the mechanic, rejection revokes it.
    #[must_use]
    pub fn with_kyc_decision(mut self, status: KycStatus) -> Self {
        self.kyc_status = status;
        self.is_verified = status == KycStatus::Approved;
        self
    }

    #[must_use]
    pub fn with_balance(mut self, diamond_balance: u32) -> Self {
        self.diamond_balance = diamond_balance;
        self
    }

    #[must_use]
    pub fn with_review(mut self, stars: u8) -> Self {
        self.rating = self.rating.record(stars);
        self
    }

    #[must_use]
    pub fn with_completed_job(mut self) -> Self {
        self.completed_jobs = self.completed_jobs.saturating_add(1);
        self
    }
}
