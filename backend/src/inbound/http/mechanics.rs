//! Mechanic directory HTTP handlers.
//!
//! ```text
//! POST /api/v1/mechanics
//! GET  /api/v1/mechanics/{mechanicId}
//! PUT  /api/v1/mechanics/{mechanicId}/location
//! PUT  /api/v1/mechanics/{mechanicId}/online
//! PUT  /api/v1/mechanics/{mechanicId}/kyc
//! ```

use std::collections::BTreeSet;

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::RegisterMechanicRequest;
use crate::domain::{Error, KycStatus, MechanicId, ServiceCategory};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{GeoPointDto, MechanicResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_wire, require};

const MECHANIC_ID: FieldName = FieldName::new("mechanicId");

/// Sign-up payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterMechanicBody {
    #[schema(example = "Bilal Autos")]
    pub name: Option<String>,
    #[schema(example = json!(["car_mechanic"]))]
    pub categories: Option<Vec<String>>,
}

/// Presence toggle.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnlineBody {
    pub is_online: Option<bool>,
}

/// Outcome of identity review.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct KycDecisionBody {
    #[schema(example = "approved")]
    pub status: Option<String>,
}

fn parse_registration(body: RegisterMechanicBody) -> Result<RegisterMechanicRequest, Error> {
    let name = require(body.name, FieldName::new("name"))?;
    let categories = require(body.categories, FieldName::new("categories"))?
        .iter()
        .map(|raw| parse_wire::<ServiceCategory>(raw, FieldName::new("categories")))
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(RegisterMechanicRequest {
        name: name.trim().to_owned(),
        categories,
    })
}

/// Register a mechanic awaiting KYC.
#[utoipa::path(
    post,
    path = "/api/v1/mechanics",
    request_body = RegisterMechanicBody,
    responses(
        (status = 201, description = "Mechanic registered", body = MechanicResponse),
        (status = 400, description = "Invalid profile", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "registerMechanic"
)]
#[post("/mechanics")]
pub async fn register_mechanic(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterMechanicBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_registration(payload.into_inner())?;
    let mechanic = state.mechanics.register(request).await?;
    Ok(HttpResponse::Created().json(MechanicResponse::from(&mechanic)))
}

/// Fetch a mechanic profile.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/{mechanic_id}",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    responses(
        (status = 200, description = "Mechanic", body = MechanicResponse),
        (status = 404, description = "Unknown mechanic", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "getMechanic"
)]
#[get("/mechanics/{mechanic_id}")]
pub async fn get_mechanic(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<MechanicResponse>> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let mechanic = state.mechanics_query.get_mechanic(mechanic_id).await?;
    Ok(web::Json(MechanicResponse::from(&mechanic)))
}

/// Record the mechanic's last known position.
#[utoipa::path(
    put,
    path = "/api/v1/mechanics/{mechanic_id}/location",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    request_body = GeoPointDto,
    responses(
        (status = 200, description = "Location updated", body = MechanicResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorSchema),
        (status = 404, description = "Unknown mechanic", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "updateMechanicLocation"
)]
#[put("/mechanics/{mechanic_id}/location")]
pub async fn update_mechanic_location(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<GeoPointDto>,
) -> ApiResult<web::Json<MechanicResponse>> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let location = payload.into_inner().into_domain(FieldName::new("location"))?;
    let mechanic = state
        .mechanics
        .update_location(mechanic_id, location)
        .await?;
    Ok(web::Json(MechanicResponse::from(&mechanic)))
}

/// Go online or offline.
#[utoipa::path(
    put,
    path = "/api/v1/mechanics/{mechanic_id}/online",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    request_body = OnlineBody,
    responses(
        (status = 200, description = "Presence updated", body = MechanicResponse),
        (status = 404, description = "Unknown mechanic", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "setMechanicOnline"
)]
#[put("/mechanics/{mechanic_id}/online")]
pub async fn set_mechanic_online(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<OnlineBody>,
) -> ApiResult<web::Json<MechanicResponse>> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let is_online = require(payload.into_inner().is_online, FieldName::new("isOnline"))?;
    let mechanic = state.mechanics.set_online(mechanic_id, is_online).await?;
    Ok(web::Json(MechanicResponse::from(&mechanic)))
}

/// Record a KYC decision.
#[utoipa::path(
    put,
    path = "/api/v1/mechanics/{mechanic_id}/kyc",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    request_body = KycDecisionBody,
    responses(
        (status = 200, description = "Decision recorded", body = MechanicResponse),
        (status = 400, description = "Unknown status", body = ErrorSchema),
        (status = 404, description = "Unknown mechanic", body = ErrorSchema)
    ),
    tags = ["mechanics"],
    operation_id = "recordKycDecision"
)]
#[put("/mechanics/{mechanic_id}/kyc")]
pub async fn record_kyc_decision(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<KycDecisionBody>,
) -> ApiResult<web::Json<MechanicResponse>> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let status = require(payload.into_inner().status, FieldName::new("status"))?;
    let status = parse_wire::<KycStatus>(&status, FieldName::new("status"))?;
    let mechanic = state
        .mechanics
        .record_kyc_decision(mechanic_id, status)
        .await?;
    Ok(web::Json(MechanicResponse::from(&mechanic)))
}

#[cfg(test)]
mod tests {
    //! Handler-level coverage with mocked driving ports.
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::Mechanic;
    use crate::inbound::http::state::test_state::MockPorts;
    use crate::test_support::{approved_mechanic, point};

    async fn call(ports: MockPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::from(ports)))
                .service(
                    web::scope("/api/v1")
                        .service(register_mechanic)
                        .service(get_mechanic)
                        .service(record_kyc_decision),
                ),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let body = actix_test::read_body(response).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn mechanic() -> Mechanic {
        approved_mechanic(ServiceCategory::CarMechanic, point(33.70, 73.05), 5)
    }

    #[rstest]
    #[actix_web::test]
    async fn registration_parses_categories() {
        let mut ports = MockPorts::default();
        ports
            .mechanics
            .expect_register()
            .times(1)
            .withf(|request| {
                request.name == "Bilal Autos"
                    && request.categories
                        == BTreeSet::from([ServiceCategory::CarMechanic, ServiceCategory::Towing])
            })
            .returning(|_| Ok(mechanic()));

        let (status, body) = call(
            ports,
            actix_test::TestRequest::post()
                .uri("/api/v1/mechanics")
                .set_json(json!({
                    "name": " Bilal Autos ",
                    "categories": ["car_mechanic", "towing", "towing"]
                })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.get("diamondBalance"), Some(&json!(5)));
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_kyc_status_is_rejected() {
        let mut ports = MockPorts::default();
        ports.mechanics.expect_record_kyc_decision().times(0);
        let uri = format!("/api/v1/mechanics/{}/kyc", MechanicId::random());

        let (status, body) = call(
            ports,
            actix_test::TestRequest::put()
                .uri(&uri)
                .set_json(json!({ "status": "maybe" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.pointer("/details/value"), Some(&json!("maybe")));
    }

    #[rstest]
    #[actix_web::test]
    async fn profile_exposes_rating_and_location() {
        let mut ports = MockPorts::default();
        ports
            .mechanics_query
            .expect_get_mechanic()
            .returning(|_| Ok(mechanic().with_review(4)));
        let uri = format!("/api/v1/mechanics/{}", MechanicId::random());

        let (status, body) = call(ports, actix_test::TestRequest::get().uri(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("rating"), Some(&json!(4.0)));
        assert_eq!(body.pointer("/location/lat"), Some(&json!(33.70)));
    }
}
