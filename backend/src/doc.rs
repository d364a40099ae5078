//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler under `/api/v1`, the health checks
//! and the payload schemas. Error envelopes come from [`ErrorSchema`] and
//! [`ErrorCodeSchema`] so domain types stay free of utoipa derives.
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::bookings::{
    CancelBookingBody, DirectBookingBody, LiveLocationBody, LiveLocationResponse,
    MechanicActionBody, RescheduleBody, ReviewBody, RouteResponse,
};
use crate::inbound::http::dto::{
    AttachmentDto, BookingResponse, GeoPointDto, LocationDto, MechanicResponse, ProposalResponse,
    ReviewResponse, ScheduleDto, ServiceRequestResponse, TransactionResponse,
};
use crate::inbound::http::mechanics::{KycDecisionBody, OnlineBody, RegisterMechanicBody};
use crate::inbound::http::proposals::{AcceptProposalBody, SubmitProposalBody, SubmitProposalResult};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::service_requests::{
    AttachmentUploadBody, CreateServiceRequestBody, CreateServiceRequestResult,
    CustomerActionBody, NotifiedMechanic,
};
use crate::inbound::http::wallet::{AdjustmentBody, BalanceResponse, PurchaseBody};
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mechanic marketplace API",
        description = "Service requests, proposals, bookings, mechanic profiles and \
                       diamond wallets. Callers identify themselves with the customer \
                       or mechanic id in each request.",
        license(name = "ISC", url = "https://opensource.org/licenses/ISC")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::service_requests::create_request,
        crate::inbound::http::service_requests::get_request,
        crate::inbound::http::service_requests::cancel_request,
        crate::inbound::http::service_requests::request_feed,
        crate::inbound::http::service_requests::list_customer_requests,
        crate::inbound::http::proposals::submit_proposal,
        crate::inbound::http::proposals::list_request_proposals,
        crate::inbound::http::proposals::list_mechanic_proposals,
        crate::inbound::http::proposals::accept_proposal,
        crate::inbound::http::bookings::book_directly,
        crate::inbound::http::bookings::get_booking,
        crate::inbound::http::bookings::confirm_booking,
        crate::inbound::http::bookings::start_job,
        crate::inbound::http::bookings::complete_job,
        crate::inbound::http::bookings::cancel_booking,
        crate::inbound::http::bookings::reschedule_booking,
        crate::inbound::http::bookings::update_live_location,
        crate::inbound::http::bookings::submit_review,
        crate::inbound::http::bookings::route_to_job,
        crate::inbound::http::bookings::list_customer_bookings,
        crate::inbound::http::bookings::ongoing_customer_booking,
        crate::inbound::http::bookings::list_mechanic_bookings,
        crate::inbound::http::bookings::ongoing_mechanic_booking,
        crate::inbound::http::mechanics::register_mechanic,
        crate::inbound::http::mechanics::get_mechanic,
        crate::inbound::http::mechanics::update_mechanic_location,
        crate::inbound::http::mechanics::set_mechanic_online,
        crate::inbound::http::mechanics::record_kyc_decision,
        crate::inbound::http::wallet::get_balance,
        crate::inbound::http::wallet::get_history,
        crate::inbound::http::wallet::credit_purchase,
        crate::inbound::http::wallet::refund,
        crate::inbound::http::wallet::debit,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        GeoPointDto,
        LocationDto,
        ScheduleDto,
        AttachmentDto,
        ServiceRequestResponse,
        ProposalResponse,
        BookingResponse,
        MechanicResponse,
        TransactionResponse,
        ReviewResponse,
        AttachmentUploadBody,
        CreateServiceRequestBody,
        CreateServiceRequestResult,
        NotifiedMechanic,
        CustomerActionBody,
        SubmitProposalBody,
        SubmitProposalResult,
        AcceptProposalBody,
        DirectBookingBody,
        MechanicActionBody,
        CancelBookingBody,
        RescheduleBody,
        LiveLocationBody,
        LiveLocationResponse,
        ReviewBody,
        RouteResponse,
        RegisterMechanicBody,
        OnlineBody,
        KycDecisionBody,
        BalanceResponse,
        PurchaseBody,
        AdjustmentBody,
    )),
    tags(
        (name = "requests", description = "Customer service requests and the mechanic feed"),
        (name = "proposals", description = "Priced offers paid for with diamonds"),
        (name = "bookings", description = "Booking lifecycle, tracking and reviews"),
        (name = "mechanics", description = "Mechanic profiles, presence and KYC"),
        (name = "wallet", description = "Diamond balance and ledger"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI document structure.

    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[rstest]
    #[case("/api/v1/requests")]
    #[case("/api/v1/requests/feed/{category}")]
    #[case("/api/v1/requests/{request_id}/proposals")]
    #[case("/api/v1/proposals/{proposal_id}/accept")]
    #[case("/api/v1/bookings/{booking_id}/review")]
    #[case("/api/v1/customers/{customer_id}/bookings/ongoing")]
    #[case("/api/v1/mechanics/{mechanic_id}/wallet/purchases")]
    #[case("/health/ready")]
    fn paths_are_registered(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(
            doc.paths.paths.contains_key(path),
            "missing path {path}"
        );
    }

    #[rstest]
    fn booking_schema_is_registered() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let booking = schemas.get("BookingResponse").expect("BookingResponse schema");

        assert_object_schema_has_field(booking, "price");
        assert_object_schema_has_field(booking, "mechanicLiveLocation");
        assert_object_schema_has_field(booking, "status");
    }
}
