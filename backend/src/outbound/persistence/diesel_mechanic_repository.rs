//! PostgreSQL-backed `MechanicRepository`.
//!
//! Profile writes touch only the profile columns. The balance, rating and job
//! counters belong to the wallet, proposal and booking repositories.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MechanicRepository, MechanicRepositoryError};
use crate::domain::{GeoPoint, KycStatus, Mechanic, MechanicId, ServiceCategory};

use super::error_mapping::{self, violated_unique_constraint};
use super::models::{MechanicRow, NewMechanicRow};
use super::pool::{DbPool, PoolError};
use super::schema::mechanics;

const PRIMARY_KEY: &str = "mechanics_pkey";

/// Diesel-backed implementation of the `MechanicRepository` port.
#[derive(Clone)]
pub struct DieselMechanicRepository {
    pool: DbPool,
}

impl DieselMechanicRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MechanicRepositoryError {
    error_mapping::map_pool_error(error, MechanicRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MechanicRepositoryError {
    error_mapping::map_diesel_error(
        error,
        MechanicRepositoryError::query,
        MechanicRepositoryError::connection,
    )
}

fn into_domain(row: Option<MechanicRow>) -> Result<Option<Mechanic>, MechanicRepositoryError> {
    row.map(|row| row.into_domain().map_err(MechanicRepositoryError::query))
        .transpose()
}

#[async_trait]
impl MechanicRepository for DieselMechanicRepository {
    async fn create(&self, mechanic: &Mechanic) -> Result<(), MechanicRepositoryError> {
        let row = NewMechanicRow::from_domain(mechanic).map_err(MechanicRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(mechanics::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| {
                if violated_unique_constraint(&error).as_deref() == Some(PRIMARY_KEY) {
                    MechanicRepositoryError::duplicate(mechanic.id())
                } else {
                    map_diesel_error(error)
                }
            })
    }

    async fn find_by_id(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = mechanics::table
            .find(mechanic_id.as_uuid())
            .select(MechanicRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        into_domain(row)
    }

    async fn find_eligible(
        &self,
        category: ServiceCategory,
        limit: usize,
    ) -> Result<Vec<Mechanic>, MechanicRepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MechanicRow> = mechanics::table
            .filter(mechanics::kyc_status.eq(KycStatus::Approved.as_str()))
            .filter(mechanics::is_verified.eq(true))
            .filter(mechanics::categories.contains(vec![category.as_str()]))
            .order((mechanics::created_at.asc(), mechanics::id.asc()))
            .limit(limit)
            .select(MechanicRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(MechanicRepositoryError::query))
            .collect()
    }

    async fn update_location(
        &self,
        mechanic_id: MechanicId,
        location: GeoPoint,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diesel::update(mechanics::table.find(mechanic_id.as_uuid()))
            .set((
                mechanics::latitude.eq(Some(location.latitude())),
                mechanics::longitude.eq(Some(location.longitude())),
            ))
            .returning(MechanicRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        into_domain(row)
    }

    async fn set_online(
        &self,
        mechanic_id: MechanicId,
        is_online: bool,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diesel::update(mechanics::table.find(mechanic_id.as_uuid()))
            .set(mechanics::is_online.eq(is_online))
            .returning(MechanicRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        into_domain(row)
    }

    async fn set_kyc_status(
        &self,
        mechanic_id: MechanicId,
        status: KycStatus,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diesel::update(mechanics::table.find(mechanic_id.as_uuid()))
            .set((
                mechanics::kyc_status.eq(status.as_str()),
                mechanics::is_verified.eq(status == KycStatus::Approved),
            ))
            .returning(MechanicRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        into_domain(row)
    }
}
