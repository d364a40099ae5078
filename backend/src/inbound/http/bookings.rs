//! Booking HTTP handlers.
//!
//! ```text
//! POST /api/v1/bookings
//! GET  /api/v1/bookings/{bookingId}
//! POST /api/v1/bookings/{bookingId}/confirm
//! POST /api/v1/bookings/{bookingId}/start
//! POST /api/v1/bookings/{bookingId}/complete
//! POST /api/v1/bookings/{bookingId}/cancel
//! POST /api/v1/bookings/{bookingId}/reschedule
//! PUT  /api/v1/bookings/{bookingId}/location
//! POST /api/v1/bookings/{bookingId}/review
//! GET  /api/v1/bookings/{bookingId}/route
//! GET  /api/v1/customers/{customerId}/bookings[/ongoing]
//! GET  /api/v1/mechanics/{mechanicId}/bookings[/ongoing]
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    BookingActor, DirectBookingRequest, LiveLocationUpdate, RouteEstimate, SubmitReviewRequest,
};
use crate::domain::{Booking, BookingId, CustomerId, Error, MechanicId, Rating, ServiceCategory};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    BookingResponse, GeoPointDto, LocationDto, ReviewResponse, ScheduleDto, map_all,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_wire, require};

const BOOKING_ID: FieldName = FieldName::new("bookingId");
const CUSTOMER_ID: FieldName = FieldName::new("customerId");
const MECHANIC_ID: FieldName = FieldName::new("mechanicId");

/// Request payload for booking a chosen mechanic for a future slot.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectBookingBody {
    pub customer_id: Option<String>,
    pub mechanic_id: Option<String>,
    #[schema(example = "car_mechanic")]
    pub category: Option<String>,
    pub description: Option<String>,
    pub location: Option<LocationDto>,
    pub schedule: Option<ScheduleDto>,
    #[schema(example = 2000)]
    pub price: Option<u32>,
}

/// Caller identity for mechanic-side lifecycle actions.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MechanicActionBody {
    pub mechanic_id: Option<String>,
}

/// Cancellation by exactly one of the two parties.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingBody {
    pub customer_id: Option<String>,
    pub mechanic_id: Option<String>,
    pub reason: Option<String>,
}

/// New slot for a pre-booked job.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleBody {
    pub customer_id: Option<String>,
    pub schedule: Option<ScheduleDto>,
}

/// Live position ping from the mechanic.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveLocationBody {
    pub mechanic_id: Option<String>,
    pub location: Option<GeoPointDto>,
}

/// Distance left to the job and whether the mechanic has arrived.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveLocationResponse {
    pub booking_id: String,
    pub location: GeoPointDto,
    #[schema(example = 1.85)]
    pub distance_km: f64,
    pub arrived: bool,
}

impl From<LiveLocationUpdate> for LiveLocationResponse {
    fn from(value: LiveLocationUpdate) -> Self {
        Self {
            booking_id: value.booking_id.to_string(),
            location: GeoPointDto::from(value.location),
            distance_km: value.distance_km,
            arrived: value.arrived,
        }
    }
}

/// Customer's rating of a completed job.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub customer_id: Option<String>,
    #[schema(example = 5)]
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

/// Estimated route from the mechanic to the job.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub polyline: Vec<GeoPointDto>,
}

impl From<RouteEstimate> for RouteResponse {
    fn from(value: RouteEstimate) -> Self {
        Self {
            distance_km: value.distance_km,
            duration_minutes: value.duration_minutes,
            polyline: value.polyline.into_iter().map(GeoPointDto::from).collect(),
        }
    }
}

fn booking_json(booking: &Booking) -> web::Json<BookingResponse> {
    web::Json(BookingResponse::from(booking))
}

fn ongoing_response(booking: Option<Booking>) -> HttpResponse {
    match booking {
        Some(booking) => HttpResponse::Ok().json(BookingResponse::from(&booking)),
        None => HttpResponse::NoContent().finish(),
    }
}

fn required_mechanic(raw: Option<String>) -> Result<MechanicId, Error> {
    let raw = require(raw, MECHANIC_ID)?;
    parse_id(&raw, MECHANIC_ID)
}

fn required_customer(raw: Option<String>) -> Result<CustomerId, Error> {
    let raw = require(raw, CUSTOMER_ID)?;
    parse_id(&raw, CUSTOMER_ID)
}

fn parse_direct(body: DirectBookingBody) -> Result<DirectBookingRequest, Error> {
    let category = require(body.category, FieldName::new("category"))?;
    Ok(DirectBookingRequest {
        customer_id: required_customer(body.customer_id)?,
        mechanic_id: required_mechanic(body.mechanic_id)?,
        category: parse_wire::<ServiceCategory>(&category, FieldName::new("category"))?,
        description: require(body.description, FieldName::new("description"))?,
        location: require(body.location, FieldName::new("location"))?
            .into_domain(FieldName::new("location"))?,
        schedule: require(body.schedule, FieldName::new("schedule"))?.into_domain()?,
        price: require(body.price, FieldName::new("price"))?,
    })
}

fn parse_actor(body: &CancelBookingBody) -> Result<BookingActor, Error> {
    match (body.customer_id.as_deref(), body.mechanic_id.as_deref()) {
        (Some(customer), None) => Ok(BookingActor::Customer(parse_id(customer, CUSTOMER_ID)?)),
        (None, Some(mechanic)) => Ok(BookingActor::Mechanic(parse_id(mechanic, MECHANIC_ID)?)),
        _ => Err(Error::invalid_request(
            "exactly one of customerId or mechanicId is required",
        )),
    }
}

/// Book a chosen mechanic for a future slot.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = DirectBookingBody,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Invalid booking", body = ErrorSchema),
        (status = 409, description = "Mechanic unavailable", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "bookDirectly"
)]
#[post("/bookings")]
pub async fn book_directly(
    state: web::Data<HttpState>,
    payload: web::Json<DirectBookingBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_direct(payload.into_inner())?;
    let booking = state.bookings.book_directly(request).await?;
    Ok(HttpResponse::Created().json(BookingResponse::from(&booking)))
}

/// Fetch one booking.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{booking_id}",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 404, description = "Unknown booking", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "getBooking"
)]
#[get("/bookings/{booking_id}")]
pub async fn get_booking(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingResponse>> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    Ok(booking_json(&state.bookings_query.get_booking(booking_id).await?))
}

/// Mechanic confirms a scheduled booking.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/confirm",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    request_body = MechanicActionBody,
    responses(
        (status = 200, description = "Booking confirmed", body = BookingResponse),
        (status = 403, description = "Not the booked mechanic", body = ErrorSchema),
        (status = 409, description = "Transition not allowed", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "confirmBooking"
)]
#[post("/bookings/{booking_id}/confirm")]
pub async fn confirm_booking(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<MechanicActionBody>,
) -> ApiResult<web::Json<BookingResponse>> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    let mechanic_id = required_mechanic(payload.into_inner().mechanic_id)?;
    Ok(booking_json(&state.bookings.confirm(mechanic_id, booking_id).await?))
}

/// Mechanic starts the job.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/start",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    request_body = MechanicActionBody,
    responses(
        (status = 200, description = "Job started", body = BookingResponse),
        (status = 403, description = "Not the booked mechanic", body = ErrorSchema),
        (status = 409, description = "Transition not allowed or mechanic busy", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "startJob"
)]
#[post("/bookings/{booking_id}/start")]
pub async fn start_job(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<MechanicActionBody>,
) -> ApiResult<web::Json<BookingResponse>> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    let mechanic_id = required_mechanic(payload.into_inner().mechanic_id)?;
    Ok(booking_json(&state.bookings.start_job(mechanic_id, booking_id).await?))
}

/// Mechanic completes the job.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/complete",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    request_body = MechanicActionBody,
    responses(
        (status = 200, description = "Job completed", body = BookingResponse),
        (status = 403, description = "Not the booked mechanic", body = ErrorSchema),
        (status = 409, description = "Transition not allowed", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "completeJob"
)]
#[post("/bookings/{booking_id}/complete")]
pub async fn complete_job(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<MechanicActionBody>,
) -> ApiResult<web::Json<BookingResponse>> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    let mechanic_id = required_mechanic(payload.into_inner().mechanic_id)?;
    Ok(booking_json(
        &state.bookings.complete_job(mechanic_id, booking_id).await?,
    ))
}

/// Either party cancels.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/cancel",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    request_body = CancelBookingBody,
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 400, description = "Missing or ambiguous caller", body = ErrorSchema),
        (status = 403, description = "Not a party to the booking", body = ErrorSchema),
        (status = 409, description = "Booking already finished", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "cancelBooking"
)]
#[post("/bookings/{booking_id}/cancel")]
pub async fn cancel_booking(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<CancelBookingBody>,
) -> ApiResult<web::Json<BookingResponse>> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    let body = payload.into_inner();
    let actor = parse_actor(&body)?;
    let reason = body
        .reason
        .map(|reason| reason.trim().to_owned())
        .filter(|reason| !reason.is_empty());
    Ok(booking_json(
        &state.bookings.cancel(actor, booking_id, reason).await?,
    ))
}

/// Customer moves a pre-booked job.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/reschedule",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    request_body = RescheduleBody,
    responses(
        (status = 200, description = "Booking rescheduled", body = BookingResponse),
        (status = 403, description = "Not the booking customer", body = ErrorSchema),
        (status = 409, description = "Booking cannot be rescheduled", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "rescheduleBooking"
)]
#[post("/bookings/{booking_id}/reschedule")]
pub async fn reschedule_booking(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<RescheduleBody>,
) -> ApiResult<web::Json<BookingResponse>> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    let body = payload.into_inner();
    let customer_id = required_customer(body.customer_id)?;
    let schedule = require(body.schedule, FieldName::new("schedule"))?.into_domain()?;
    Ok(booking_json(
        &state
            .bookings
            .reschedule(customer_id, booking_id, schedule)
            .await?,
    ))
}

/// Mechanic shares their live position.
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{booking_id}/location",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    request_body = LiveLocationBody,
    responses(
        (status = 200, description = "Position recorded", body = LiveLocationResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorSchema),
        (status = 409, description = "Booking is not ongoing", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "updateLiveLocation"
)]
#[put("/bookings/{booking_id}/location")]
pub async fn update_live_location(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<LiveLocationBody>,
) -> ApiResult<web::Json<LiveLocationResponse>> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    let body = payload.into_inner();
    let mechanic_id = required_mechanic(body.mechanic_id)?;
    let location = require(body.location, FieldName::new("location"))?
        .into_domain(FieldName::new("location"))?;
    let update = state
        .bookings
        .update_live_location(mechanic_id, booking_id, location)
        .await?;
    Ok(web::Json(LiveLocationResponse::from(update)))
}

/// Customer rates a completed job.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/review",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    request_body = ReviewBody,
    responses(
        (status = 201, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Rating out of range", body = ErrorSchema),
        (status = 409, description = "Not completed or already reviewed", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "submitReview"
)]
#[post("/bookings/{booking_id}/review")]
pub async fn submit_review(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<ReviewBody>,
) -> ApiResult<HttpResponse> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    let body = payload.into_inner();
    let customer_id = required_customer(body.customer_id)?;
    let stars = require(body.rating, FieldName::new("rating"))?;
    let rating = Rating::new(stars).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(serde_json::json!({ "field": "rating", "value": stars }))
    })?;
    let review = state
        .bookings
        .submit_review(SubmitReviewRequest {
            customer_id,
            booking_id,
            rating,
            comment: body
                .comment
                .map(|comment| comment.trim().to_owned())
                .filter(|comment| !comment.is_empty()),
        })
        .await?;
    Ok(HttpResponse::Created().json(ReviewResponse::from(&review)))
}

/// Route from the mechanic's position to the job.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{booking_id}/route",
    params(("booking_id" = String, Path, description = "Booking identifier")),
    responses(
        (status = 200, description = "Route estimate", body = RouteResponse),
        (status = 409, description = "Mechanic position unknown", body = ErrorSchema),
        (status = 503, description = "Directions provider unavailable", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "routeToJob"
)]
#[get("/bookings/{booking_id}/route")]
pub async fn route_to_job(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<RouteResponse>> {
    let booking_id = parse_id::<BookingId>(&path, BOOKING_ID)?;
    let estimate = state.bookings_query.route_to_job(booking_id).await?;
    Ok(web::Json(RouteResponse::from(estimate)))
}

/// A customer's bookings.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer_id}/bookings",
    params(("customer_id" = String, Path, description = "Customer identifier")),
    responses((status = 200, description = "Bookings, newest first", body = [BookingResponse])),
    tags = ["bookings"],
    operation_id = "listCustomerBookings"
)]
#[get("/customers/{customer_id}/bookings")]
pub async fn list_customer_bookings(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let customer_id = parse_id::<CustomerId>(&path, CUSTOMER_ID)?;
    let bookings = state.bookings_query.list_for_customer(customer_id).await?;
    Ok(web::Json(map_all(&bookings)))
}

/// A mechanic's bookings.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/{mechanic_id}/bookings",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    responses((status = 200, description = "Bookings, newest first", body = [BookingResponse])),
    tags = ["bookings"],
    operation_id = "listMechanicBookings"
)]
#[get("/mechanics/{mechanic_id}/bookings")]
pub async fn list_mechanic_bookings(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let bookings = state.bookings_query.list_for_mechanic(mechanic_id).await?;
    Ok(web::Json(map_all(&bookings)))
}

/// The customer's ongoing booking, if any.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer_id}/bookings/ongoing",
    params(("customer_id" = String, Path, description = "Customer identifier")),
    responses(
        (status = 200, description = "Ongoing booking", body = BookingResponse),
        (status = 204, description = "No ongoing booking")
    ),
    tags = ["bookings"],
    operation_id = "ongoingCustomerBooking"
)]
#[get("/customers/{customer_id}/bookings/ongoing")]
pub async fn ongoing_customer_booking(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let customer_id = parse_id::<CustomerId>(&path, CUSTOMER_ID)?;
    Ok(ongoing_response(
        state.bookings_query.ongoing_for_customer(customer_id).await?,
    ))
}

/// The mechanic's ongoing booking, if any.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/{mechanic_id}/bookings/ongoing",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    responses(
        (status = 200, description = "Ongoing booking", body = BookingResponse),
        (status = 204, description = "No ongoing booking")
    ),
    tags = ["bookings"],
    operation_id = "ongoingMechanicBooking"
)]
#[get("/mechanics/{mechanic_id}/bookings/ongoing")]
pub async fn ongoing_mechanic_booking(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    Ok(ongoing_response(
        state.bookings_query.ongoing_for_mechanic(mechanic_id).await?,
    ))
}

#[cfg(test)]
mod tests {
    //! Handler-level coverage with mocked driving ports.
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::inbound::http::state::test_state::MockPorts;

    async fn call(ports: MockPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::from(ports)))
                .service(
                    web::scope("/api/v1")
                        .service(book_directly)
                        .service(get_booking)
                        .service(cancel_booking)
                        .service(update_live_location)
                        .service(submit_review)
                        .service(ongoing_mechanic_booking),
                ),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let body = actix_test::read_body(response).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn booking_uri(suffix: &str) -> String {
        format!("/api/v1/bookings/{}{suffix}", BookingId::random())
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({
        "customerId": CustomerId::random().to_string(),
        "mechanicId": MechanicId::random().to_string()
    }))]
    #[actix_web::test]
    async fn cancel_needs_exactly_one_party(#[case] body: Value) {
        let mut ports = MockPorts::default();
        ports.bookings.expect_cancel().times(0);

        let (status, _) = call(
            ports,
            actix_test::TestRequest::post()
                .uri(&booking_uri("/cancel"))
                .set_json(body),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn mechanic_cancellation_passes_the_actor_and_reason() {
        let mechanic_id = MechanicId::random();
        let mut ports = MockPorts::default();
        ports
            .bookings
            .expect_cancel()
            .times(1)
            .withf(move |actor, _, reason| {
                *actor == BookingActor::Mechanic(mechanic_id)
                    && reason.as_deref() == Some("vehicle broke down")
            })
            .returning(|_, _, _| Err(Error::invalid_state("booking already completed")));

        let (status, body) = call(
            ports,
            actix_test::TestRequest::post()
                .uri(&booking_uri("/cancel"))
                .set_json(json!({
                    "mechanicId": mechanic_id.to_string(),
                    "reason": " vehicle broke down "
                })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.get("code"), Some(&json!("invalid_state")));
    }

    #[rstest]
    #[actix_web::test]
    async fn live_location_reports_arrival() {
        let mut ports = MockPorts::default();
        ports
            .bookings
            .expect_update_live_location()
            .returning(|_, booking_id, location| {
                Ok(LiveLocationUpdate {
                    booking_id,
                    location,
                    distance_km: 0.05,
                    arrived: true,
                })
            });

        let (status, body) = call(
            ports,
            actix_test::TestRequest::put()
                .uri(&booking_uri("/location"))
                .set_json(json!({
                    "mechanicId": MechanicId::random().to_string(),
                    "location": { "lat": 33.6844, "lng": 73.0479 }
                })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("arrived"), Some(&json!(true)));
        assert_eq!(body.pointer("/location/lat"), Some(&json!(33.6844)));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[actix_web::test]
    async fn review_rating_must_be_one_to_five(#[case] rating: u8) {
        let mut ports = MockPorts::default();
        ports.bookings.expect_submit_review().times(0);

        let (status, body) = call(
            ports,
            actix_test::TestRequest::post()
                .uri(&booking_uri("/review"))
                .set_json(json!({
                    "customerId": CustomerId::random().to_string(),
                    "rating": rating
                })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.pointer("/details/field"), Some(&json!("rating")));
    }

    #[rstest]
    #[actix_web::test]
    async fn idle_mechanic_has_no_content() {
        let mut ports = MockPorts::default();
        ports
            .bookings_query
            .expect_ongoing_for_mechanic()
            .returning(|_| Ok(None));
        let uri = format!("/api/v1/mechanics/{}/bookings/ongoing", MechanicId::random());

        let (status, _) = call(ports, actix_test::TestRequest::get().uri(&uri)).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[rstest]
    #[actix_web::test]
    async fn direct_booking_requires_a_schedule() {
        let mut ports = MockPorts::default();
        ports.bookings.expect_book_directly().times(0);

        let (status, body) = call(
            ports,
            actix_test::TestRequest::post()
                .uri("/api/v1/bookings")
                .set_json(json!({
                    "customerId": CustomerId::random().to_string(),
                    "mechanicId": MechanicId::random().to_string(),
                    "category": "car_mechanic",
                    "description": "Annual service",
                    "location": { "lat": 33.6844, "lng": 73.0479, "address": "F-7" },
                    "price": 2000
                })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.pointer("/details/field"), Some(&json!("schedule")));
    }
}
