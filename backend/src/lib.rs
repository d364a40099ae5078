//! Mechanic marketplace dispatch core.
//!
//! Customers post service requests, nearby mechanics answer with paid
//! proposals, and an accepted proposal becomes a booking tracked to
//! completion. The crate is laid out hexagonally:
//!
//! - [`domain`]: entities, rules and services behind port traits
//! - [`inbound`]: REST and WebSocket adapters
//! - [`outbound`]: persistence, notification, directions and storage adapters

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
