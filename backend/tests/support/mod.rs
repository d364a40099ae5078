//! Embedded PostgreSQL support for the Diesel repository suites.
//!
//! Each suite pulls this in with `mod support;`. The in-memory flows use
//! `support/marketplace.rs` through a `#[path]` include instead.

pub mod cluster_skip;
pub mod pg_embed;

pub use cluster_skip::handle_cluster_setup_failure;
pub use pg_embed::{PgContext, setup_context};
