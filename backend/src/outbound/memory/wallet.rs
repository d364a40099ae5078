use async_trait::async_trait;

use crate::domain::ports::{WalletRepository, WalletRepositoryError};
use crate::domain::{Mechanic, MechanicId, Transaction, WalletMovement};

use super::InMemoryMarketplaceStore;

#[async_trait]
impl WalletRepository for InMemoryMarketplaceStore {
    async fn apply(&self, movement: WalletMovement) -> Result<Transaction, WalletRepositoryError> {
        self.lock().await.apply_movement(movement)
    }

    async fn balance(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<u32>, WalletRepositoryError> {
        Ok(self
            .lock()
            .await
            .mechanics
            .get(&mechanic_id)
            .map(Mechanic::diamond_balance))
    }

    async fn history(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Transaction>, WalletRepositoryError> {
        let state = self.lock().await;
        if !state.mechanics.contains_key(&mechanic_id) {
            return Err(WalletRepositoryError::mechanic_not_found(mechanic_id));
        }
        let mut entries: Vec<_> = state
            .transactions
            .iter()
            .rev()
            .filter(|entry| entry.mechanic_id == mechanic_id)
            .cloned()
            .collect();
        // Stable sort keeps later appends first within the same instant.
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}
