use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{ServiceRequestRepository, ServiceRequestRepositoryError};
use crate::domain::{CustomerId, RequestId, RequestStatus, ServiceCategory, ServiceRequest};

use super::{InMemoryMarketplaceStore, newest_first};

fn pending_in(request: &ServiceRequest, category: ServiceCategory) -> bool {
    request.status() == RequestStatus::Pending && request.category() == category
}

#[async_trait]
impl ServiceRequestRepository for InMemoryMarketplaceStore {
    async fn create(&self, request: &ServiceRequest) -> Result<(), ServiceRequestRepositoryError> {
        let mut state = self.lock().await;
        if state.requests.contains_key(&request.id()) {
            return Err(ServiceRequestRepositoryError::duplicate(request.id()));
        }
        state.requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        request_id: RequestId,
    ) -> Result<Option<ServiceRequest>, ServiceRequestRepositoryError> {
        Ok(self.lock().await.requests.get(&request_id).cloned())
    }

    async fn update_status(
        &self,
        request_id: RequestId,
        expected: RequestStatus,
        next: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<ServiceRequest>, ServiceRequestRepositoryError> {
        let mut state = self.lock().await;
        let Some(current) = state.requests.get_mut(&request_id) else {
            return Ok(None);
        };
        if current.status() != expected || !expected.can_transition_to(next) {
            return Ok(None);
        }
        *current = current.with_status(next, at);
        Ok(Some(current.clone()))
    }

    async fn list_recent_pending(
        &self,
        category: ServiceCategory,
        since: DateTime<Utc>,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
        let state = self.lock().await;
        let mut requests: Vec<_> = state
            .requests
            .values()
            .filter(|request| {
                pending_in(request, category)
                    && !request.is_scheduled()
                    && request.created_at() >= since
            })
            .cloned()
            .collect();
        newest_first(&mut requests, ServiceRequest::created_at, ServiceRequest::id);
        Ok(requests)
    }

    async fn list_scheduled_pending(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
        let state = self.lock().await;
        let mut requests: Vec<_> = state
            .requests
            .values()
            .filter(|request| pending_in(request, category) && request.is_scheduled())
            .cloned()
            .collect();
        newest_first(&mut requests, ServiceRequest::created_at, ServiceRequest::id);
        Ok(requests)
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
        let state = self.lock().await;
        let mut requests: Vec<_> = state
            .requests
            .values()
            .filter(|request| request.customer_id() == customer_id)
            .cloned()
            .collect();
        newest_first(&mut requests, ServiceRequest::created_at, ServiceRequest::id);
        Ok(requests)
    }

    async fn expire_stale(
        &self,
        created_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
        let mut state = self.lock().await;
        let mut expired = Vec::new();
        for request in state.requests.values_mut() {
            if request.status() == RequestStatus::Pending
                && !request.is_scheduled()
                && request.created_at() < created_before
            {
                *request = request.with_status(RequestStatus::Expired, at);
                expired.push(request.clone());
            }
        }
        Ok(expired)
    }
}
