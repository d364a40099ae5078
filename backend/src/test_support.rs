//! Test utilities for the marketplace crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    CustomerId, GeoPoint, KycStatus, Location, Mechanic, MechanicDraft, MechanicId,
    PROPOSAL_COST_DIAMONDS, Proposal, ProposalDraft, ProposalId, ProposalStatus,
    RatingAggregate, RequestId, RequestStatus, Schedule, ServiceCategory, ServiceRequest,
    ServiceRequestDraft, TransactionId, TransactionKind, Urgency, WalletMovement,
};

/// Clock whose time only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.lock_clock() += TimeDelta::minutes(minutes);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed instant used across fixtures.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .unwrap_or_else(|| panic!("valid fixture timestamp"))
}

/// Build a point, panicking on out-of-range fixtures.
pub fn point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint::new(latitude, longitude)
        .unwrap_or_else(|err| panic!("fixture point ({latitude}, {longitude}): {err}"))
}

/// A job location in central Lahore.
pub fn job_location() -> Location {
    Location::new(point(31.5204, 74.3587), "Mall Road, Lahore")
}

/// A verified, online mechanic at `location` with `diamond_balance`.
pub fn approved_mechanic(
    category: ServiceCategory,
    location: GeoPoint,
    diamond_balance: u32,
) -> Mechanic {
    Mechanic::new(MechanicDraft {
        id: MechanicId::random(),
        name: "Bilal Autos".to_owned(),
        categories: BTreeSet::from([category]),
        location: Some(location),
        is_verified: true,
        kyc_status: KycStatus::Approved,
        diamond_balance,
        rating: RatingAggregate::default(),
        completed_jobs: 0,
        is_online: true,
        created_at: fixture_now(),
    })
    .unwrap_or_else(|err| panic!("fixture mechanic: {err}"))
}

/// A pending request at [`job_location`] created at `created_at`.
pub fn pending_request(
    customer_id: CustomerId,
    category: ServiceCategory,
    schedule: Option<Schedule>,
    created_at: DateTime<Utc>,
) -> ServiceRequest {
    ServiceRequest::new(ServiceRequestDraft {
        id: RequestId::random(),
        customer_id,
        category,
        description: "Engine overheats after ten minutes".to_owned(),
        location: job_location(),
        urgency: Urgency::Standard,
        schedule,
        attachments: Vec::new(),
        status: RequestStatus::Pending,
        created_at,
        updated_at: created_at,
    })
    .unwrap_or_else(|err| panic!("fixture request: {err}"))
}

/// A pending proposal from `mechanic_id` on `request`.
pub fn pending_proposal(request: &ServiceRequest, mechanic_id: MechanicId, price: u32) -> Proposal {
    Proposal::new(ProposalDraft {
        id: ProposalId::random(),
        request_id: request.id(),
        mechanic_id,
        price,
        estimated_minutes: 45,
        message: None,
        distance_km: Some(2.5),
        status: ProposalStatus::Pending,
        created_at: request.created_at(),
    })
    .unwrap_or_else(|err| panic!("fixture proposal: {err}"))
}

/// The diamond deduction charged for `proposal`.
pub fn proposal_fee(proposal: &Proposal) -> WalletMovement {
    WalletMovement {
        id: TransactionId::random(),
        mechanic_id: proposal.mechanic_id(),
        kind: TransactionKind::Deduction,
        amount: PROPOSAL_COST_DIAMONDS,
        payment_method: None,
        reference: Some(format!("proposal:{}", proposal.id())),
        created_at: proposal.created_at(),
    }
}
