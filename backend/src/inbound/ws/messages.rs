//! Wire-level message definitions for the request feed socket.
//!
//! Every frame is a full snapshot; clients replace their list on receipt.

use serde::Serialize;

use crate::domain::{Error, ServiceCategory, ServiceRequest};
use crate::inbound::http::dto::{ServiceRequestResponse, map_all};

/// Outbound feed frame.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedMessage {
    /// Current visible requests for the category, newest first.
    Snapshot {
        category: ServiceCategory,
        requests: Vec<ServiceRequestResponse>,
    },
    /// The snapshot could not be read; the socket stays open and retries on
    /// the next change.
    Error { code: String, message: String },
}

impl FeedMessage {
    pub fn snapshot(category: ServiceCategory, requests: &[ServiceRequest]) -> Self {
        Self::Snapshot {
            category,
            requests: map_all(requests),
        }
    }

    pub fn error(error: &Error) -> Self {
        let code = serde_json::to_value(error.code())
            .ok()
            .and_then(|value| value.as_str().map(str::to_owned))
            .unwrap_or_else(|| "internal_error".to_owned());
        Self::Error {
            code,
            message: "request feed temporarily unavailable".to_owned(),
        }
    }
}
