use async_trait::async_trait;

use crate::domain::ports::{MechanicRepository, MechanicRepositoryError};
use crate::domain::{GeoPoint, KycStatus, Mechanic, MechanicId, ServiceCategory};

use super::InMemoryMarketplaceStore;

impl InMemoryMarketplaceStore {
    async fn update_mechanic(
        &self,
        mechanic_id: MechanicId,
        update: impl FnOnce(Mechanic) -> Mechanic,
    ) -> Option<Mechanic> {
        let mut state = self.lock().await;
        let current = state.mechanics.remove(&mechanic_id)?;
        let updated = update(current);
        state.mechanics.insert(mechanic_id, updated.clone());
        Some(updated)
    }
}

#[async_trait]
impl MechanicRepository for InMemoryMarketplaceStore {
    async fn create(&self, mechanic: &Mechanic) -> Result<(), MechanicRepositoryError> {
        let mut state = self.lock().await;
        if state.mechanics.contains_key(&mechanic.id()) {
            return Err(MechanicRepositoryError::duplicate(mechanic.id()));
        }
        state.mechanics.insert(mechanic.id(), mechanic.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError> {
        Ok(self.lock().await.mechanics.get(&mechanic_id).cloned())
    }

    async fn find_eligible(
        &self,
        category: ServiceCategory,
        limit: usize,
    ) -> Result<Vec<Mechanic>, MechanicRepositoryError> {
        let state = self.lock().await;
        let mut eligible: Vec<_> = state
            .mechanics
            .values()
            .filter(|mechanic| mechanic.is_eligible_for(category))
            .cloned()
            .collect();
        eligible.sort_by_key(|mechanic| (mechanic.created_at(), mechanic.id()));
        eligible.truncate(limit);
        Ok(eligible)
    }

    async fn update_location(
        &self,
        mechanic_id: MechanicId,
        location: GeoPoint,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError> {
        Ok(self
            .update_mechanic(mechanic_id, |mechanic| mechanic.with_location(location))
            .await)
    }

    async fn set_online(
        &self,
        mechanic_id: MechanicId,
        is_online: bool,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError> {
        Ok(self
            .update_mechanic(mechanic_id, |mechanic| mechanic.with_online(is_online))
            .await)
    }

    async fn set_kyc_status(
        &self,
        mechanic_id: MechanicId,
        status: KycStatus,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError> {
        Ok(self
            .update_mechanic(mechanic_id, |mechanic| mechanic.with_kyc_decision(status))
            .await)
    }
}
