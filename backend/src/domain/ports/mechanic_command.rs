//! Driving port for mechanic profile operations.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{Error, GeoPoint, KycStatus, Mechanic, MechanicId, ServiceCategory};

/// Sign-up payload for a new mechanic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMechanicRequest {
    pub name: String,
    pub categories: BTreeSet<ServiceCategory>,
}

/// Driving port for mechanic write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MechanicCommand: Send + Sync {
    /// Create a profile awaiting KYC with an empty wallet.
    async fn register(&self, request: RegisterMechanicRequest) -> Result<Mechanic, Error>;

    async fn update_location(
        &self,
        mechanic_id: MechanicId,
        location: GeoPoint,
    ) -> Result<Mechanic, Error>;

    async fn set_online(&self, mechanic_id: MechanicId, is_online: bool)
    -> Result<Mechanic, Error>;

    /// Record the outcome of identity review.
    async fn record_kyc_decision(
        &self,
        mechanic_id: MechanicId,
        status: KycStatus,
    ) -> Result<Mechanic, Error>;
}
