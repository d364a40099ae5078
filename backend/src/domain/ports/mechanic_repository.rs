//! Port for mechanic profile persistence and eligibility queries.

use async_trait::async_trait;

use crate::domain::{GeoPoint, KycStatus, Mechanic, MechanicId, ServiceCategory};

use super::define_port_error;

define_port_error! {
    /// Errors raised by mechanic repository adapters.
    pub enum MechanicRepositoryError {
        /// A mechanic with the same id already exists.
        Duplicate { mechanic_id: MechanicId } =>
            "mechanic {mechanic_id} already exists",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "mechanic repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "mechanic repository query failed: {message}",
    }
}

/// Port for reading and updating mechanic profiles.
///
/// Wallet balances, rating aggregates and completed job counters are owned by
/// the wallet, booking and proposal stores; this port never writes them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MechanicRepository: Send + Sync {
    /// Persist a newly registered mechanic.
    async fn create(&self, mechanic: &Mechanic) -> Result<(), MechanicRepositoryError>;

    /// Find a mechanic by id.
    async fn find_by_id(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError>;

    /// KYC-approved, verified mechanics offering `category`, at most `limit`.
    async fn find_eligible(
        &self,
        category: ServiceCategory,
        limit: usize,
    ) -> Result<Vec<Mechanic>, MechanicRepositoryError>;

    /// Store the last known location; `None` when the mechanic is missing.
    async fn update_location(
        &self,
        mechanic_id: MechanicId,
        location: GeoPoint,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError>;

    /// Toggle availability; `None` when the mechanic is missing.
    async fn set_online(
        &self,
        mechanic_id: MechanicId,
        is_online: bool,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError>;

    /// Record a KYC decision; approval also marks the mechanic verified.
    async fn set_kyc_status(
        &self,
        mechanic_id: MechanicId,
        status: KycStatus,
    ) -> Result<Option<Mechanic>, MechanicRepositoryError>;
}
