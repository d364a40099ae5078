//! Mechanic directory services: registration, presence and KYC decisions.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::matching_service::map_mechanic_repository_error;
use crate::domain::ports::{
    MechanicCommand, MechanicQuery, MechanicRepository, RegisterMechanicRequest,
};
use crate::domain::{
    Error, GeoPoint, KycStatus, Mechanic, MechanicDraft, MechanicId, RatingAggregate,
};

fn not_found(mechanic_id: MechanicId) -> Error {
    Error::not_found(format!("mechanic {mechanic_id} not found"))
}

/// Mechanic service implementing the command driving port.
#[derive(Clone)]
pub struct MechanicCommandService<M> {
    mechanics: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<M> MechanicCommandService<M> {
    pub fn new(mechanics: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self { mechanics, clock }
    }
}

#[async_trait]
impl<M> MechanicCommand for MechanicCommandService<M>
where
    M: MechanicRepository,
{
    async fn register(&self, request: RegisterMechanicRequest) -> Result<Mechanic, Error> {
        let mechanic = Mechanic::new(MechanicDraft {
            id: MechanicId::random(),
            name: request.name,
            categories: request.categories,
            location: None,
            is_verified: false,
            kyc_status: KycStatus::Pending,
            diamond_balance: 0,
            rating: RatingAggregate::default(),
            completed_jobs: 0,
            is_online: false,
            created_at: self.clock.utc(),
        })
        .map_err(|err| Error::invalid_request(format!("invalid mechanic: {err}")))?;
        self.mechanics
            .create(&mechanic)
            .await
            .map_err(map_mechanic_repository_error)?;
        info!(mechanic_id = %mechanic.id(), "mechanic registered");
        Ok(mechanic)
    }

    async fn update_location(
        &self,
        mechanic_id: MechanicId,
        location: GeoPoint,
    ) -> Result<Mechanic, Error> {
        self.mechanics
            .update_location(mechanic_id, location)
            .await
            .map_err(map_mechanic_repository_error)?
            .ok_or_else(|| not_found(mechanic_id))
    }

    async fn set_online(
        &self,
        mechanic_id: MechanicId,
        is_online: bool,
    ) -> Result<Mechanic, Error> {
        self.mechanics
            .set_online(mechanic_id, is_online)
            .await
            .map_err(map_mechanic_repository_error)?
            .ok_or_else(|| not_found(mechanic_id))
    }

    async fn record_kyc_decision(
        &self,
        mechanic_id: MechanicId,
        status: KycStatus,
    ) -> Result<Mechanic, Error> {
        let updated = self
            .mechanics
            .set_kyc_status(mechanic_id, status)
            .await
            .map_err(map_mechanic_repository_error)?
            .ok_or_else(|| not_found(mechanic_id))?;
        info!(%mechanic_id, %status, verified = updated.is_verified(), "kyc decision recorded");
        Ok(updated)
    }
}

/// Mechanic service implementing the query driving port.
#[derive(Clone)]
pub struct MechanicQueryService<M> {
    mechanics: Arc<M>,
}

impl<M> MechanicQueryService<M> {
    pub fn new(mechanics: Arc<M>) -> Self {
        Self { mechanics }
    }
}

#[async_trait]
impl<M> MechanicQuery for MechanicQueryService<M>
where
    M: MechanicRepository,
{
    async fn get_mechanic(&self, mechanic_id: MechanicId) -> Result<Mechanic, Error> {
        self.mechanics
            .find_by_id(mechanic_id)
            .await
            .map_err(map_mechanic_repository_error)?
            .ok_or_else(|| not_found(mechanic_id))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::domain::ports::MockMechanicRepository;
    use crate::domain::{ErrorCode, ServiceCategory};
    use crate::test_support::{MutableClock, fixture_now};

    #[rstest]
    #[tokio::test]
    async fn registration_starts_unverified_offline_and_empty() {
        let mut mechanics = MockMechanicRepository::new();
        mechanics.expect_create().times(1).return_once(|_| Ok(()));
        let service = MechanicCommandService::new(
            Arc::new(mechanics),
            Arc::new(MutableClock::new(fixture_now())),
        );

        let mechanic = service
            .register(RegisterMechanicRequest {
                name: "Usman Tyres".to_owned(),
                categories: BTreeSet::from([ServiceCategory::TyreService]),
            })
            .await
            .expect("registered");

        assert_eq!(mechanic.kyc_status(), KycStatus::Pending);
        assert!(!mechanic.is_verified());
        assert!(!mechanic.is_online());
        assert_eq!(mechanic.diamond_balance(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn registration_without_categories_is_invalid() {
        let mut mechanics = MockMechanicRepository::new();
        mechanics.expect_create().times(0);
        let service = MechanicCommandService::new(
            Arc::new(mechanics),
            Arc::new(MutableClock::new(fixture_now())),
        );

        let err = service
            .register(RegisterMechanicRequest {
                name: "Usman Tyres".to_owned(),
                categories: BTreeSet::new(),
            })
            .await
            .expect_err("no categories");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn presence_update_for_unknown_mechanic_is_not_found() {
        let mut mechanics = MockMechanicRepository::new();
        mechanics.expect_set_online().return_once(|_, _| Ok(None));
        let service = MechanicCommandService::new(
            Arc::new(mechanics),
            Arc::new(MutableClock::new(fixture_now())),
        );

        let err = service
            .set_online(MechanicId::random(), true)
            .await
            .expect_err("unknown mechanic");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
