//! Service request HTTP handlers.
//!
//! ```text
//! POST /api/v1/requests
//! GET  /api/v1/requests/{requestId}
//! POST /api/v1/requests/{requestId}/cancel
//! GET  /api/v1/requests/feed/{category}?mechanicId=...
//! GET  /api/v1/customers/{customerId}/requests
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    AttachmentUpload, CreateServiceRequestRequest, CreateServiceRequestResponse,
};
use crate::domain::{
    AttachmentKind, CustomerId, Error, MatchCandidate, MechanicId, RequestId, ServiceCategory,
    Urgency,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{LocationDto, ScheduleDto, ServiceRequestResponse, map_all};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, decode_base64, parse_id, parse_wire, require,
};

const CUSTOMER_ID: FieldName = FieldName::new("customerId");

/// Base64-encoded photo or voice note sent with a new request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AttachmentUploadBody {
    #[schema(example = "photo")]
    pub kind: Option<String>,
    #[schema(example = "jpg")]
    pub extension: Option<String>,
    /// Standard base64 of the file contents.
    pub data: Option<String>,
}

/// Request payload for posting a service request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequestBody {
    pub customer_id: Option<String>,
    #[schema(example = "car_mechanic")]
    pub category: Option<String>,
    pub description: Option<String>,
    pub location: Option<LocationDto>,
    /// Defaults to `standard`.
    #[schema(example = "urgent")]
    pub urgency: Option<String>,
    /// Present for pre-booked jobs.
    pub schedule: Option<ScheduleDto>,
    #[serde(default)]
    pub attachments: Vec<AttachmentUploadBody>,
}

/// A mechanic that was told about the new request.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifiedMechanic {
    pub mechanic_id: String,
    pub distance_km: f64,
}

impl From<&MatchCandidate> for NotifiedMechanic {
    fn from(value: &MatchCandidate) -> Self {
        Self {
            mechanic_id: value.mechanic_id.to_string(),
            distance_km: value.distance_km,
        }
    }
}

/// Response payload for a newly posted request.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateServiceRequestResult {
    pub request: ServiceRequestResponse,
    /// Notified mechanics, nearest first.
    pub notified: Vec<NotifiedMechanic>,
    /// Attachments that could not be stored.
    pub warnings: Vec<String>,
}

impl From<CreateServiceRequestResponse> for CreateServiceRequestResult {
    fn from(value: CreateServiceRequestResponse) -> Self {
        Self {
            request: ServiceRequestResponse::from(&value.request),
            notified: map_all(&value.notified),
            warnings: value.warnings,
        }
    }
}

/// Caller identity for customer-owned request actions.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerActionBody {
    pub customer_id: Option<String>,
}

/// Optional feed filter.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// Hide requests this mechanic already proposed on.
    pub mechanic_id: Option<String>,
}

fn parse_attachment(body: AttachmentUploadBody) -> Result<AttachmentUpload, Error> {
    let kind = require(body.kind, FieldName::new("attachments.kind"))?;
    let extension = require(body.extension, FieldName::new("attachments.extension"))?;
    let data = require(body.data, FieldName::new("attachments.data"))?;
    Ok(AttachmentUpload {
        kind: parse_wire::<AttachmentKind>(&kind, FieldName::new("attachments.kind"))?,
        extension: extension.trim().trim_start_matches('.').to_owned(),
        bytes: decode_base64(&data, FieldName::new("attachments.data"))?,
    })
}

fn parse_create_request(
    body: CreateServiceRequestBody,
) -> Result<CreateServiceRequestRequest, Error> {
    let customer_id = require(body.customer_id, CUSTOMER_ID)?;
    let category = require(body.category, FieldName::new("category"))?;
    let description = require(body.description, FieldName::new("description"))?;
    let location = require(body.location, FieldName::new("location"))?;
    let urgency = match body.urgency {
        Some(value) => parse_wire::<Urgency>(&value, FieldName::new("urgency"))?,
        None => Urgency::Standard,
    };
    let schedule = body.schedule.map(ScheduleDto::into_domain).transpose()?;
    let attachments = body
        .attachments
        .into_iter()
        .map(parse_attachment)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CreateServiceRequestRequest {
        customer_id: parse_id::<CustomerId>(&customer_id, CUSTOMER_ID)?,
        category: parse_wire::<ServiceCategory>(&category, FieldName::new("category"))?,
        description,
        location: location.into_domain(FieldName::new("location"))?,
        urgency,
        schedule,
        attachments,
    })
}

/// Post a service request and notify nearby mechanics.
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    request_body = CreateServiceRequestBody,
    responses(
        (status = 201, description = "Request created", body = CreateServiceRequestResult),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "createServiceRequest"
)]
#[post("/requests")]
pub async fn create_request(
    state: web::Data<HttpState>,
    payload: web::Json<CreateServiceRequestBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_create_request(payload.into_inner())?;
    let created = state.requests.create_request(request).await?;
    Ok(HttpResponse::Created().json(CreateServiceRequestResult::from(created)))
}

/// Fetch one request.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{request_id}",
    params(("request_id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Service request", body = ServiceRequestResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Unknown request", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "getServiceRequest"
)]
#[get("/requests/{request_id}")]
pub async fn get_request(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ServiceRequestResponse>> {
    let request_id = parse_id::<RequestId>(&path, FieldName::new("requestId"))?;
    let request = state.requests_query.get_request(request_id).await?;
    Ok(web::Json(ServiceRequestResponse::from(&request)))
}

/// Withdraw a pending request.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{request_id}/cancel",
    params(("request_id" = String, Path, description = "Request identifier")),
    request_body = CustomerActionBody,
    responses(
        (status = 200, description = "Request cancelled", body = ServiceRequestResponse),
        (status = 403, description = "Not the request owner", body = ErrorSchema),
        (status = 409, description = "Request is no longer pending", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "cancelServiceRequest"
)]
#[post("/requests/{request_id}/cancel")]
pub async fn cancel_request(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<CustomerActionBody>,
) -> ApiResult<web::Json<ServiceRequestResponse>> {
    let request_id = parse_id::<RequestId>(&path, FieldName::new("requestId"))?;
    let customer_id = require(payload.into_inner().customer_id, CUSTOMER_ID)?;
    let customer_id = parse_id::<CustomerId>(&customer_id, CUSTOMER_ID)?;
    let request = state
        .requests
        .cancel_request(customer_id, request_id)
        .await?;
    Ok(web::Json(ServiceRequestResponse::from(&request)))
}

/// Mechanic-facing feed for one category.
#[utoipa::path(
    get,
    path = "/api/v1/requests/feed/{category}",
    params(
        ("category" = String, Path, description = "Service category"),
        FeedQuery
    ),
    responses(
        (
            status = 200,
            description = "Visible pending requests, newest first",
            body = [ServiceRequestResponse]
        ),
        (status = 400, description = "Unknown category", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "getRequestFeed"
)]
#[get("/requests/feed/{category}")]
pub async fn request_feed(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<FeedQuery>,
) -> ApiResult<web::Json<Vec<ServiceRequestResponse>>> {
    let category = parse_wire::<ServiceCategory>(&path, FieldName::new("category"))?;
    let requests = match query.into_inner().mechanic_id {
        Some(raw) => {
            let mechanic_id = parse_id::<MechanicId>(&raw, FieldName::new("mechanicId"))?;
            state
                .requests_query
                .unanswered_feed(category, mechanic_id)
                .await?
        }
        None => state.requests_query.feed_for_category(category).await?,
    };
    Ok(web::Json(map_all(&requests)))
}

/// A customer's own requests.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer_id}/requests",
    params(("customer_id" = String, Path, description = "Customer identifier")),
    responses(
        (status = 200, description = "Requests, newest first", body = [ServiceRequestResponse]),
        (status = 400, description = "Invalid identifier", body = ErrorSchema)
    ),
    tags = ["requests"],
    operation_id = "listCustomerRequests"
)]
#[get("/customers/{customer_id}/requests")]
pub async fn list_customer_requests(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ServiceRequestResponse>>> {
    let customer_id = parse_id::<CustomerId>(&path, CUSTOMER_ID)?;
    let requests = state.requests_query.list_for_customer(customer_id).await?;
    Ok(web::Json(map_all(&requests)))
}
