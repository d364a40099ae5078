//! HTTP inbound adapter exposing REST endpoints.

pub mod bookings;
pub mod dto;
pub mod error;
pub mod health;
pub mod mechanics;
pub mod proposals;
pub mod schemas;
pub mod service_requests;
pub mod state;
pub mod validation;
pub mod wallet;

use actix_web::web;

use crate::domain::ports::MAX_ATTACHMENT_BYTES;

pub use error::ApiResult;

/// Largest accepted JSON body.
///
/// Attachments travel base64-encoded, so this fits a photo and a voice note
/// at the attachment cap with room left for the other request fields.
pub const MAX_JSON_BODY_BYTES: usize = 2 * MAX_ATTACHMENT_BYTES.div_ceil(3) * 4 + 64 * 1024;

/// JSON extractor settings for every `/api/v1` route.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().limit(MAX_JSON_BODY_BYTES)
}

/// Register every `/api/v1` handler on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(service_requests::request_feed)
        .service(service_requests::create_request)
        .service(service_requests::get_request)
        .service(service_requests::cancel_request)
        .service(service_requests::list_customer_requests)
        .service(proposals::submit_proposal)
        .service(proposals::list_request_proposals)
        .service(proposals::list_mechanic_proposals)
        .service(proposals::accept_proposal)
        .service(bookings::book_directly)
        .service(bookings::get_booking)
        .service(bookings::confirm_booking)
        .service(bookings::start_job)
        .service(bookings::complete_job)
        .service(bookings::cancel_booking)
        .service(bookings::reschedule_booking)
        .service(bookings::update_live_location)
        .service(bookings::submit_review)
        .service(bookings::route_to_job)
        .service(bookings::list_customer_bookings)
        .service(bookings::ongoing_customer_booking)
        .service(bookings::list_mechanic_bookings)
        .service(bookings::ongoing_mechanic_booking)
        .service(mechanics::register_mechanic)
        .service(mechanics::get_mechanic)
        .service(mechanics::update_mechanic_location)
        .service(mechanics::set_mechanic_online)
        .service(mechanics::record_kyc_decision)
        .service(wallet::get_balance)
        .service(wallet::get_history)
        .service(wallet::credit_purchase)
        .service(wallet::refund)
        .service(wallet::debit);
}
