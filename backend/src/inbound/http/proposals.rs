//! Proposal HTTP handlers.
//!
//! ```text
//! POST /api/v1/requests/{requestId}/proposals
//! GET  /api/v1/requests/{requestId}/proposals
//! GET  /api/v1/mechanics/{mechanicId}/proposals
//! POST /api/v1/proposals/{proposalId}/accept
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{AcceptProposalRequest, SubmitProposalRequest, SubmitProposalResponse};
use crate::domain::{CustomerId, Error, MechanicId, ProposalId, RequestId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{BookingResponse, ProposalResponse, map_all};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, require};

const MECHANIC_ID: FieldName = FieldName::new("mechanicId");
const REQUEST_ID: FieldName = FieldName::new("requestId");

/// Request payload for a mechanic's offer.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProposalBody {
    pub mechanic_id: Option<String>,
    #[schema(example = 1500)]
    pub price: Option<u32>,
    #[schema(example = 40)]
    pub estimated_minutes: Option<u32>,
    pub message: Option<String>,
}

/// Recorded proposal and the wallet balance after its fee.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProposalResult {
    pub proposal: ProposalResponse,
    #[schema(example = 4)]
    pub diamond_balance: u32,
}

impl From<SubmitProposalResponse> for SubmitProposalResult {
    fn from(value: SubmitProposalResponse) -> Self {
        Self {
            proposal: ProposalResponse::from(&value.proposal),
            diamond_balance: value.diamond_balance,
        }
    }
}

/// Caller identity for accepting a proposal.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptProposalBody {
    pub customer_id: Option<String>,
}

fn parse_submit(
    request_id: &str,
    body: SubmitProposalBody,
) -> Result<SubmitProposalRequest, Error> {
    let mechanic_id = require(body.mechanic_id, MECHANIC_ID)?;
    Ok(SubmitProposalRequest {
        mechanic_id: parse_id::<MechanicId>(&mechanic_id, MECHANIC_ID)?,
        request_id: parse_id::<RequestId>(request_id, REQUEST_ID)?,
        price: require(body.price, FieldName::new("price"))?,
        estimated_minutes: require(body.estimated_minutes, FieldName::new("estimatedMinutes"))?,
        message: body
            .message
            .map(|message| message.trim().to_owned())
            .filter(|message| !message.is_empty()),
    })
}

/// Submit a proposal, paying one diamond.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{request_id}/proposals",
    params(("request_id" = String, Path, description = "Request identifier")),
    request_body = SubmitProposalBody,
    responses(
        (status = 201, description = "Proposal recorded", body = SubmitProposalResult),
        (status = 400, description = "Invalid proposal", body = ErrorSchema),
        (status = 402, description = "Not enough diamonds", body = ErrorSchema),
        (status = 409, description = "Duplicate proposal or request closed", body = ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "submitProposal"
)]
#[post("/requests/{request_id}/proposals")]
pub async fn submit_proposal(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<SubmitProposalBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_submit(&path, payload.into_inner())?;
    let submitted = state.proposals.submit_proposal(request).await?;
    Ok(HttpResponse::Created().json(SubmitProposalResult::from(submitted)))
}

/// Proposals on one request.
#[utoipa::path(
    get,
    path = "/api/v1/requests/{request_id}/proposals",
    params(("request_id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Proposals, newest first", body = [ProposalResponse]),
        (status = 400, description = "Invalid identifier", body = ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "listRequestProposals"
)]
#[get("/requests/{request_id}/proposals")]
pub async fn list_request_proposals(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ProposalResponse>>> {
    let request_id = parse_id::<RequestId>(&path, REQUEST_ID)?;
    let proposals = state.proposals_query.list_for_request(request_id).await?;
    Ok(web::Json(map_all(&proposals)))
}

/// A mechanic's own proposals.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/{mechanic_id}/proposals",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    responses(
        (status = 200, description = "Proposals, newest first", body = [ProposalResponse]),
        (status = 400, description = "Invalid identifier", body = ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "listMechanicProposals"
)]
#[get("/mechanics/{mechanic_id}/proposals")]
pub async fn list_mechanic_proposals(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ProposalResponse>>> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let proposals = state.proposals_query.list_for_mechanic(mechanic_id).await?;
    Ok(web::Json(map_all(&proposals)))
}

/// Accept a proposal, creating the booking.
#[utoipa::path(
    post,
    path = "/api/v1/proposals/{proposal_id}/accept",
    params(("proposal_id" = String, Path, description = "Proposal identifier")),
    request_body = AcceptProposalBody,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 403, description = "Not the request owner", body = ErrorSchema),
        (status = 404, description = "Unknown proposal", body = ErrorSchema),
        (status = 409, description = "Proposal or request no longer pending", body = ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "acceptProposal"
)]
#[post("/proposals/{proposal_id}/accept")]
pub async fn accept_proposal(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<AcceptProposalBody>,
) -> ApiResult<HttpResponse> {
    let proposal_id = parse_id::<ProposalId>(&path, FieldName::new("proposalId"))?;
    let customer_id = require(payload.into_inner().customer_id, FieldName::new("customerId"))?;
    let booking = state
        .proposals
        .accept_proposal(AcceptProposalRequest {
            customer_id: parse_id::<CustomerId>(&customer_id, FieldName::new("customerId"))?,
            proposal_id,
        })
        .await?;
    Ok(HttpResponse::Created().json(BookingResponse::from(&booking)))
}
