//! Priced offers mechanics submit against service requests.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::wire_enum::wire_enum;
use super::{MechanicId, ProposalId, RequestId, ServiceRequest};

/// Longest accepted proposal message.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Diamonds spent on every proposal submission.
pub const PROPOSAL_COST_DIAMONDS: u32 = 1;

wire_enum! {
    /// Lifecycle of a proposal.
    pub enum ProposalStatus as "proposal status" {
        Pending => "pending",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

/// Validation errors raised by [`Proposal::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalValidationError {
    #[error("price must be greater than zero")]
    ZeroPrice,
    #[error("estimated time must be greater than zero minutes")]
    ZeroEstimate,
    #[error("message must be at most {max} characters")]
    MessageTooLong { max: usize },
}

/// Input used to construct a [`Proposal`].
#[derive(Debug, Clone)]
pub struct ProposalDraft {
    pub id: ProposalId,
    pub request_id: RequestId,
    pub mechanic_id: MechanicId,
    pub price: u32,
    pub estimated_minutes: u32,
    pub message: Option<String>,
    pub distance_km: Option<f64>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

/// A mechanic's offer for one request.
///
/// `distance_km` is a snapshot taken at submission; it is absent when the
/// mechanic had no known location.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    id: ProposalId,
    request_id: RequestId,
    mechanic_id: MechanicId,
    price: u32,
    estimated_minutes: u32,
    message: Option<String>,
    distance_km: Option<f64>,
    status: ProposalStatus,
    created_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(draft: ProposalDraft) -> Result<Self, ProposalValidationError> {
        if draft.price == 0 {
            return Err(ProposalValidationError::ZeroPrice);
        }
        if draft.estimated_minutes == 0 {
            return Err(ProposalValidationError::ZeroEstimate);
        }
        let message = draft
            .message
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        if message
            .as_deref()
            .is_some_and(|text| text.chars().count() > MAX_MESSAGE_CHARS)
        {
            return Err(ProposalValidationError::MessageTooLong {
                max: MAX_MESSAGE_CHARS,
            });
        }

        Ok(Self {
            id: draft.id,
            request_id: draft.request_id,
            mechanic_id: draft.mechanic_id,
            price: draft.price,
            estimated_minutes: draft.estimated_minutes,
            message,
            distance_km: draft.distance_km,
            status: draft.status,
            created_at: draft.created_at,
        })
    }

    pub fn id(&self) -> ProposalId {
        self.id
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn mechanic_id(&self) -> MechanicId {
        self.mechanic_id
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn estimated_minutes(&self) -> u32 {
        self.estimated_minutes
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.distance_km
    }

    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn with_status(mut self, status: ProposalStatus) -> Self {
        self.status = status;
        self
    }
}

/// Requests the mechanic has not yet answered, preserving input order.
///
/// This is a feed convenience; the store rejects duplicate proposals itself.
///
/// # Examples
/// ```
/// use marketplace::domain::{MechanicId, filter_unanswered_requests};
///
/// let remaining = filter_unanswered_requests(Vec::new(), &[], MechanicId::random());
/// assert!(remaining.is_empty());
/// ```
#[must_use]
pub fn filter_unanswered_requests(
    requests: Vec<ServiceRequest>,
    proposals: &[Proposal],
    mechanic_id: MechanicId,
) -> Vec<ServiceRequest> {
    let answered: HashSet<RequestId> = proposals
        .iter()
        .filter(|proposal| proposal.mechanic_id() == mechanic_id)
        .map(Proposal::request_id)
        .collect();
    requests
        .into_iter()
        .filter(|request| !answered.contains(&request.id()))
        .collect()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{
        CustomerId, GeoPoint, Location, RequestStatus, ServiceCategory, ServiceRequestDraft,
        Urgency,
    };

    #[fixture]
    fn draft() -> ProposalDraft {
        ProposalDraft {
            id: ProposalId::random(),
            request_id: RequestId::random(),
            mechanic_id: MechanicId::random(),
            price: 1500,
            estimated_minutes: 45,
            message: Some("  On my way  ".to_owned()),
            distance_km: Some(1.75),
            status: ProposalStatus::Pending,
            created_at: Utc::now(),
        }
    }

    fn request() -> ServiceRequest {
        let now = Utc::now();
        ServiceRequest::new(ServiceRequestDraft {
            id: RequestId::random(),
            customer_id: CustomerId::random(),
            category: ServiceCategory::BikeMechanic,
            description: "Chain snapped".to_owned(),
            location: Location::new(GeoPoint::new(31.52, 74.35).expect("point"), "Gulberg"),
            urgency: Urgency::Standard,
            schedule: None,
            attachments: Vec::new(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        })
        .expect("valid request")
    }

    #[rstest]
    fn new_trims_message(draft: ProposalDraft) {
        let proposal = Proposal::new(draft).expect("valid proposal");
        assert_eq!(proposal.message(), Some("On my way"));
    }

    #[rstest]
    fn blank_message_becomes_none(mut draft: ProposalDraft) {
        draft.message = Some("   ".to_owned());
        let proposal = Proposal::new(draft).expect("valid proposal");
        assert_eq!(proposal.message(), None);
    }

    #[rstest]
    fn zero_price_is_rejected(mut draft: ProposalDraft) {
        draft.price = 0;
        assert_eq!(Proposal::new(draft), Err(ProposalValidationError::ZeroPrice));
    }

    #[rstest]
    fn zero_estimate_is_rejected(mut draft: ProposalDraft) {
        draft.estimated_minutes = 0;
        assert_eq!(
            Proposal::new(draft),
            Err(ProposalValidationError::ZeroEstimate)
        );
    }

    #[rstest]
    fn unanswered_filter_only_drops_own_proposals(mut draft: ProposalDraft) {
        let answered = request();
        let open = request();
        let mechanic_id = draft.mechanic_id;
        draft.request_id = answered.id();
        let own = Proposal::new(draft.clone()).expect("valid proposal");
        draft.mechanic_id = MechanicId::random();
        draft.request_id = open.id();
        let someone_else = Proposal::new(draft).expect("valid proposal");

        let remaining = filter_unanswered_requests(
            vec![answered, open.clone()],
            &[own, someone_else],
            mechanic_id,
        );

        assert_eq!(remaining, vec![open]);
    }
}
