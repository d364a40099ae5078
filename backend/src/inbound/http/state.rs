//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    BookingCommand, BookingQuery, MechanicCommand, MechanicQuery, ProposalCommand, ProposalQuery,
    ServiceRequestCommand, ServiceRequestQuery, WalletCommand, WalletQuery,
};

/// Dependency bundle for HTTP and WebSocket handlers.
#[derive(Clone)]
pub struct HttpState {
    pub requests: Arc<dyn ServiceRequestCommand>,
    pub requests_query: Arc<dyn ServiceRequestQuery>,
    pub proposals: Arc<dyn ProposalCommand>,
    pub proposals_query: Arc<dyn ProposalQuery>,
    pub bookings: Arc<dyn BookingCommand>,
    pub bookings_query: Arc<dyn BookingQuery>,
    pub mechanics: Arc<dyn MechanicCommand>,
    pub mechanics_query: Arc<dyn MechanicQuery>,
    pub wallet: Arc<dyn WalletCommand>,
    pub wallet_query: Arc<dyn WalletQuery>,
}
