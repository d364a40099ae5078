//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository holds a [`DbPool`] of `diesel-async` connections and
//! implements one domain port. Row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay private to this module.
//!
//! Every write that spans more than one row runs inside a single database
//! transaction; unique constraints and conditional updates, not in-process
//! locks, keep concurrent writers honest.
//!
//! # Example
//!
//! ```ignore
//! use marketplace::outbound::persistence::{DbPool, DieselWalletRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/marketplace")).await?;
//! let wallets = DieselWalletRepository::new(pool);
//! ```

mod diesel_booking_repository;
mod diesel_mechanic_repository;
mod diesel_proposal_repository;
mod diesel_service_request_repository;
mod diesel_wallet_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_mechanic_repository::DieselMechanicRepository;
pub use diesel_proposal_repository::DieselProposalRepository;
pub use diesel_service_request_repository::DieselServiceRequestRepository;
pub use diesel_wallet_repository::DieselWalletRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
