//! PostgreSQL-backed `ServiceRequestRepository`.
//!
//! Status changes are compare-and-set updates filtered on the expected
//! status, so a request can only leave `pending` once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ServiceRequestRepository, ServiceRequestRepositoryError};
use crate::domain::{CustomerId, RequestId, RequestStatus, ServiceCategory, ServiceRequest};

use super::error_mapping::{self, violated_unique_constraint};
use super::models::{NewServiceRequestRow, ServiceRequestRow};
use super::pool::{DbPool, PoolError};
use super::schema::service_requests;

const PRIMARY_KEY: &str = "service_requests_pkey";

/// Diesel-backed implementation of the `ServiceRequestRepository` port.
#[derive(Clone)]
pub struct DieselServiceRequestRepository {
    pool: DbPool,
}

impl DieselServiceRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ServiceRequestRepositoryError {
    error_mapping::map_pool_error(error, ServiceRequestRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ServiceRequestRepositoryError {
    error_mapping::map_diesel_error(
        error,
        ServiceRequestRepositoryError::query,
        ServiceRequestRepositoryError::connection,
    )
}

fn rows_into_domain(
    rows: Vec<ServiceRequestRow>,
) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(ServiceRequestRepositoryError::query))
        .collect()
}

#[async_trait]
impl ServiceRequestRepository for DieselServiceRequestRepository {
    async fn create(&self, request: &ServiceRequest) -> Result<(), ServiceRequestRepositoryError> {
        let row = NewServiceRequestRow::from_domain(request)
            .map_err(ServiceRequestRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(service_requests::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| {
                if violated_unique_constraint(&error).as_deref() == Some(PRIMARY_KEY) {
                    ServiceRequestRepositoryError::duplicate(request.id())
                } else {
                    map_diesel_error(error)
                }
            })
    }

    async fn find_by_id(
        &self,
        request_id: RequestId,
    ) -> Result<Option<ServiceRequest>, ServiceRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ServiceRequestRow> = service_requests::table
            .find(request_id.as_uuid())
            .select(ServiceRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_domain().map_err(ServiceRequestRepositoryError::query))
            .transpose()
    }

    async fn update_status(
        &self,
        request_id: RequestId,
        expected: RequestStatus,
        next: RequestStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<ServiceRequest>, ServiceRequestRepositoryError> {
        if !expected.can_transition_to(next) {
            return Ok(None);
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ServiceRequestRow> = diesel::update(
            service_requests::table
                .filter(service_requests::id.eq(request_id.as_uuid()))
                .filter(service_requests::status.eq(expected.as_str())),
        )
        .set((
            service_requests::status.eq(next.as_str()),
            service_requests::updated_at.eq(at),
        ))
        .returning(ServiceRequestRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        row.map(|row| row.into_domain().map_err(ServiceRequestRepositoryError::query))
            .transpose()
    }

    async fn list_recent_pending(
        &self,
        category: ServiceCategory,
        since: DateTime<Utc>,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ServiceRequestRow> = service_requests::table
            .filter(service_requests::category.eq(category.as_str()))
            .filter(service_requests::status.eq(RequestStatus::Pending.as_str()))
            .filter(service_requests::schedule_date.is_null())
            .filter(service_requests::created_at.ge(since))
            .order((
                service_requests::created_at.desc(),
                service_requests::id.desc(),
            ))
            .select(ServiceRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_into_domain(rows)
    }

    async fn list_scheduled_pending(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ServiceRequestRow> = service_requests::table
            .filter(service_requests::category.eq(category.as_str()))
            .filter(service_requests::status.eq(RequestStatus::Pending.as_str()))
            .filter(service_requests::schedule_date.is_not_null())
            .order((
                service_requests::created_at.desc(),
                service_requests::id.desc(),
            ))
            .select(ServiceRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_into_domain(rows)
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ServiceRequestRow> = service_requests::table
            .filter(service_requests::customer_id.eq(customer_id.as_uuid()))
            .order((
                service_requests::created_at.desc(),
                service_requests::id.desc(),
            ))
            .select(ServiceRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_into_domain(rows)
    }

    async fn expire_stale(
        &self,
        created_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Vec<ServiceRequest>, ServiceRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ServiceRequestRow> = diesel::update(
            service_requests::table
                .filter(service_requests::status.eq(RequestStatus::Pending.as_str()))
                .filter(service_requests::schedule_date.is_null())
                .filter(service_requests::created_at.lt(created_before)),
        )
        .set((
            service_requests::status.eq(RequestStatus::Expired.as_str()),
            service_requests::updated_at.eq(at),
        ))
        .returning(ServiceRequestRow::as_returning())
        .get_results(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        rows_into_domain(rows)
    }
}
