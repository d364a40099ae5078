//! Driving port for mechanic profile reads.

use async_trait::async_trait;

use crate::domain::{Error, Mechanic, MechanicId};

/// Driving port for mechanic read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MechanicQuery: Send + Sync {
    async fn get_mechanic(&self, mechanic_id: MechanicId) -> Result<Mechanic, Error>;
}
