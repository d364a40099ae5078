//! Actix middleware shared by every route.
//!
//! [`Trace`] tags each request with a [`crate::domain::TraceId`] so logs,
//! the `trace-id` response header and error bodies can be correlated.

pub mod trace;

pub use trace::Trace;
