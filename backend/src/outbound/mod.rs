//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: a single-process store implementing the same repository
//!   ports, used when no database is configured
//! - **events**: broadcast fan-out of service request changes
//! - **notifications**: push gateway and log-only notification senders
//! - **directions**: route estimates from Google Directions or a straight line
//! - **attachments**: filesystem storage for request photos and voice notes
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod attachments;
pub mod directions;
pub mod events;
pub mod memory;
pub mod notifications;
pub mod persistence;
