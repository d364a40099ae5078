//! Service request domain services.
//!
//! The command service posts, cancels and expires requests and kicks off
//! matching. The query service serves the mechanic feed, including live
//! subscriptions driven by the request event bus.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::matching_service::MatchingNotifier;
use crate::domain::ports::{
    AttachmentStore, CreateServiceRequestRequest, CreateServiceRequestResponse,
    MechanicRepository, ProposalRepository, RequestChanged, RequestEventBus,
    RequestFeedSubscription, ServiceRequestCommand, ServiceRequestQuery,
    ServiceRequestRepository, ServiceRequestRepositoryError,
};
use crate::domain::proposal_service::map_proposal_repository_error;
use crate::domain::{
    CustomerId, Error, FeedPolicy, MechanicId, RequestId, RequestStatus, ServiceCategory,
    ServiceRequest, ServiceRequestDraft, filter_unanswered_requests, merge_feed,
};

pub(crate) fn map_request_repository_error(error: ServiceRequestRepositoryError) -> Error {
    match error {
        ServiceRequestRepositoryError::Duplicate { request_id } => {
            Error::conflict(format!("service request {request_id} already exists"))
        }
        ServiceRequestRepositoryError::Connection { message } => {
            Error::remote_failure(format!("service request repository unavailable: {message}"))
        }
        ServiceRequestRepositoryError::Query { message } => {
            Error::internal(format!("service request repository error: {message}"))
        }
    }
}

fn changed(request: &ServiceRequest) -> RequestChanged {
    RequestChanged {
        request_id: request.id(),
        category: request.category(),
        status: request.status(),
    }
}

/// Service request service implementing the command driving port.
#[derive(Clone)]
pub struct ServiceRequestCommandService<R, M> {
    requests: Arc<R>,
    matching: MatchingNotifier<M>,
    attachments: Arc<dyn AttachmentStore>,
    events: Arc<dyn RequestEventBus>,
    clock: Arc<dyn Clock>,
    feed_policy: FeedPolicy,
}

impl<R, M> ServiceRequestCommandService<R, M> {
    pub fn new(
        requests: Arc<R>,
        matching: MatchingNotifier<M>,
        attachments: Arc<dyn AttachmentStore>,
        events: Arc<dyn RequestEventBus>,
        clock: Arc<dyn Clock>,
        feed_policy: FeedPolicy,
    ) -> Self {
        Self {
            requests,
            matching,
            attachments,
            events,
            clock,
            feed_policy,
        }
    }
}

impl<R, M> ServiceRequestCommandService<R, M>
where
    R: ServiceRequestRepository,
{
    async fn require_request(&self, request_id: RequestId) -> Result<ServiceRequest, Error> {
        self.requests
            .find_by_id(request_id)
            .await
            .map_err(map_request_repository_error)?
            .ok_or_else(|| Error::not_found(format!("service request {request_id} not found")))
    }

    /// Explain why a compare-and-set found nothing to update.
    async fn lost_update(&self, request_id: RequestId, expected: RequestStatus) -> Error {
        match self.require_request(request_id).await {
            Ok(current) => Error::conflict(format!(
                "service request {request_id} is {}, expected {expected}",
                current.status()
            )),
            Err(err) => err,
        }
    }
}

#[async_trait]
impl<R, M> ServiceRequestCommand for ServiceRequestCommandService<R, M>
where
    R: ServiceRequestRepository,
    M: MechanicRepository,
{
    async fn create_request(
        &self,
        request: CreateServiceRequestRequest,
    ) -> Result<CreateServiceRequestResponse, Error> {
        let now = self.clock.utc();
        if let Some(schedule) = request.schedule
            && schedule.starts_at() <= now.naive_utc()
        {
            return Err(Error::invalid_request(
                "scheduled time must be in the future",
            ));
        }

        let mut draft = ServiceRequestDraft {
            id: RequestId::random(),
            customer_id: request.customer_id,
            category: request.category,
            description: request.description,
            location: request.location,
            urgency: request.urgency,
            schedule: request.schedule,
            attachments: Vec::new(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        // Validate before uploading anything.
        ServiceRequest::new(draft.clone())
            .map_err(|err| Error::invalid_request(format!("invalid service request: {err}")))?;

        let mut warnings = Vec::new();
        for upload in request.attachments {
            let kind = upload.kind;
            match self.attachments.store(draft.id, upload).await {
                Ok(attachment) => draft.attachments.push(attachment),
                Err(err) => {
                    warn!(request_id = %draft.id, %kind, error = %err, "attachment upload failed");
                    warnings.push(format!("{kind} attachment was not saved: {err}"));
                }
            }
        }

        let created = ServiceRequest::new(draft)
            .map_err(|err| Error::invalid_request(format!("invalid service request: {err}")))?;
        if let Err(err) = self.requests.create(&created).await {
            if !created.attachments().is_empty()
                && let Err(cleanup) = self.attachments.discard(created.id()).await
            {
                warn!(request_id = %created.id(), error = %cleanup, "orphaned attachments kept");
            }
            return Err(map_request_repository_error(err));
        }
        info!(
            request_id = %created.id(),
            customer_id = %created.customer_id(),
            category = %created.category(),
            scheduled = created.is_scheduled(),
            "service request created"
        );
        self.events.publish(changed(&created));

        let notified = match self.matching.notify_nearby(&created).await {
            Ok(notified) => notified,
            Err(err) => {
                warn!(request_id = %created.id(), error = %err, "mechanic matching failed");
                warnings.push("nearby mechanics could not be notified".to_owned());
                Vec::new()
            }
        };

        Ok(CreateServiceRequestResponse {
            request: created,
            notified,
            warnings,
        })
    }

    async fn update_status(
        &self,
        request_id: RequestId,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<ServiceRequest, Error> {
        if !expected.can_transition_to(next) {
            return Err(Error::invalid_state(format!(
                "a {expected} request cannot become {next}"
            )));
        }
        let updated = self
            .requests
            .update_status(request_id, expected, next, self.clock.utc())
            .await
            .map_err(map_request_repository_error)?;
        let Some(updated) = updated else {
            return Err(self.lost_update(request_id, expected).await);
        };
        self.events.publish(changed(&updated));
        Ok(updated)
    }

    async fn cancel_request(
        &self,
        customer_id: CustomerId,
        request_id: RequestId,
    ) -> Result<ServiceRequest, Error> {
        let current = self.require_request(request_id).await?;
        if current.customer_id() != customer_id {
            return Err(Error::forbidden(
                "only the customer who posted a request may cancel it",
            ));
        }
        if current.status() != RequestStatus::Pending {
            return Err(Error::invalid_state(format!(
                "cannot cancel a request that is {}",
                current.status()
            )));
        }
        let cancelled = self
            .update_status(request_id, RequestStatus::Pending, RequestStatus::Cancelled)
            .await?;
        info!(%request_id, %customer_id, "service request cancelled");
        Ok(cancelled)
    }

    async fn expire_stale_requests(&self) -> Result<Vec<RequestId>, Error> {
        let now = self.clock.utc();
        let expired = self
            .requests
            .expire_stale(self.feed_policy.live_since(now), now)
            .await
            .map_err(map_request_repository_error)?;
        for request in &expired {
            self.events.publish(changed(request));
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "expired stale service requests");
        }
        Ok(expired.iter().map(ServiceRequest::id).collect())
    }
}

/// Service request service implementing the query driving port.
#[derive(Clone)]
pub struct ServiceRequestQueryService<R, P> {
    requests: Arc<R>,
    proposals: Arc<P>,
    events: Arc<dyn RequestEventBus>,
    clock: Arc<dyn Clock>,
    feed_policy: FeedPolicy,
}

impl<R, P> ServiceRequestQueryService<R, P> {
    pub fn new(
        requests: Arc<R>,
        proposals: Arc<P>,
        events: Arc<dyn RequestEventBus>,
        clock: Arc<dyn Clock>,
        feed_policy: FeedPolicy,
    ) -> Self {
        Self {
            requests,
            proposals,
            events,
            clock,
            feed_policy,
        }
    }
}

#[async_trait]
impl<R, P> ServiceRequestQuery for ServiceRequestQueryService<R, P>
where
    R: ServiceRequestRepository,
    P: ProposalRepository,
{
    async fn get_request(&self, request_id: RequestId) -> Result<ServiceRequest, Error> {
        self.requests
            .find_by_id(request_id)
            .await
            .map_err(map_request_repository_error)?
            .ok_or_else(|| Error::not_found(format!("service request {request_id} not found")))
    }

    async fn feed_for_category(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ServiceRequest>, Error> {
        let now = self.clock.utc();
        let live = self
            .requests
            .list_recent_pending(category, self.feed_policy.live_since(now))
            .await
            .map_err(map_request_repository_error)?;
        let scheduled = self
            .requests
            .list_scheduled_pending(category)
            .await
            .map_err(map_request_repository_error)?;
        Ok(merge_feed(live, scheduled, now, self.feed_policy))
    }

    async fn unanswered_feed(
        &self,
        category: ServiceCategory,
        mechanic_id: MechanicId,
    ) -> Result<Vec<ServiceRequest>, Error> {
        let feed = self.feed_for_category(category).await?;
        let proposals = self
            .proposals
            .list_for_mechanic(mechanic_id)
            .await
            .map_err(map_proposal_repository_error)?;
        Ok(filter_unanswered_requests(feed, &proposals, mechanic_id))
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ServiceRequest>, Error> {
        self.requests
            .list_for_customer(customer_id)
            .await
            .map_err(map_request_repository_error)
    }

    fn subscribe(&self, category: ServiceCategory) -> RequestFeedSubscription {
        RequestFeedSubscription::new(category, self.events.subscribe())
    }
}

#[cfg(test)]
#[path = "service_request_service_tests.rs"]
mod tests;
