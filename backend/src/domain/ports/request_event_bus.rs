//! Driven port for service request change events.
//!
//! Feed subscribers re-read their snapshot whenever a request in their
//! category changes. Events carry just enough to filter on; they are never a
//! source of truth.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::{RequestId, RequestStatus, ServiceCategory};

/// A service request was created or changed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChanged {
    pub request_id: RequestId,
    pub category: ServiceCategory,
    pub status: RequestStatus,
}

/// Port for fanning request changes out to feed subscribers.
#[cfg_attr(test, mockall::automock)]
pub trait RequestEventBus: Send + Sync {
    /// Publish a change. Having no subscribers is not an error.
    fn publish(&self, event: RequestChanged);

    /// Receive every change published after this call.
    fn subscribe(&self) -> broadcast::Receiver<RequestChanged>;
}
