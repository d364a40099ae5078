//! Driving port for service request mutations.

use async_trait::async_trait;

use crate::domain::{
    CustomerId, Error, Location, MatchCandidate, RequestId, RequestStatus, Schedule,
    ServiceCategory, ServiceRequest, Urgency,
};

use super::AttachmentUpload;

/// Request to post a new service request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateServiceRequestRequest {
    pub customer_id: CustomerId,
    pub category: ServiceCategory,
    pub description: String,
    pub location: Location,
    pub urgency: Urgency,
    pub schedule: Option<Schedule>,
    pub attachments: Vec<AttachmentUpload>,
}

/// Outcome of posting a service request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateServiceRequestResponse {
    pub request: ServiceRequest,
    /// Mechanics that were notified, nearest first.
    pub notified: Vec<MatchCandidate>,
    /// Non-fatal problems, such as attachments that failed to upload.
    pub warnings: Vec<String>,
}

/// Driving port for service request write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRequestCommand: Send + Sync {
    /// Validate and store a request, then notify nearby eligible mechanics.
    ///
    /// Attachment upload failures become warnings; the request is still
    /// created without them.
    async fn create_request(
        &self,
        request: CreateServiceRequestRequest,
    ) -> Result<CreateServiceRequestResponse, Error>;

    /// Compare-and-set the request status.
    ///
    /// Only pending requests move. Any other pair fails with `invalid_state`
    /// without touching storage, and a stale `expected` fails with `conflict`.
    async fn update_status(
        &self,
        request_id: RequestId,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<ServiceRequest, Error>;

    /// Withdraw a pending request on behalf of its owner.
    async fn cancel_request(
        &self,
        customer_id: CustomerId,
        request_id: RequestId,
    ) -> Result<ServiceRequest, Error>;

    /// Expire pending live requests older than the feed window.
    async fn expire_stale_requests(&self) -> Result<Vec<RequestId>, Error>;
}
