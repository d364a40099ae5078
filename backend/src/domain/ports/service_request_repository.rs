//! Port for service request persistence and feed queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CustomerId, RequestId, RequestStatus, ServiceCategory, ServiceRequest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by service request repository adapters.
    pub enum ServiceRequestRepositoryError {
        /// A request with the same id already exists.
        Duplicate { request_id: RequestId } =>
            "service request {request_id} already exists",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "service request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "service request repository query failed: {message}",
    }
}

/// Port for storing service requests and answering feed queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    /// Persist a new request.
    async fn create(&self, request: &ServiceRequest) -> Result<(), ServiceRequestRepositoryError>;

    /// Find a request by id.
    async fn find_by_id(
        &self,
        request_id: RequestId,
    ) -> Result<Option<ServiceRequest>, ServiceRequestRepositoryError>;

    /// Compare-and-set the status.
    ///
    /// Returns the updated request, or `None` when the request is missing,
    /// its current status is not `expected`, or `expected` may not move to
    /// `next`.
    async fn update_status(
        &self,
        request_id: RequestId,
        expected: RequestStatus,
        next: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<ServiceRequest>, ServiceRequestRepositoryError>;

    /// Pending, unscheduled requests in `category` created at or after `since`.
    async fn list_recent_pending(
        &self,
        category: ServiceCategory,
        since: DateTime<Utc>,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError>;

    /// Every pending scheduled request in `category`.
    async fn list_scheduled_pending(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError>;

    /// A customer's requests, newest first.
    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError>;

    /// Move pending, unscheduled requests created before `created_before` to
    /// expired and return the affected requests.
    async fn expire_stale(
        &self,
        created_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError>;
}
