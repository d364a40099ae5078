//! Diamond wallet HTTP handlers.
//!
//! ```text
//! GET  /api/v1/mechanics/{mechanicId}/wallet
//! GET  /api/v1/mechanics/{mechanicId}/wallet/transactions
//! POST /api/v1/mechanics/{mechanicId}/wallet/purchases
//! POST /api/v1/mechanics/{mechanicId}/wallet/refunds
//! POST /api/v1/mechanics/{mechanicId}/wallet/debits
//! ```
//!
//! Purchases are credited only with a reference from an externally verified
//! payment; replaying a reference is a conflict.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreditPurchaseRequest, DebitRequest, RefundRequest};
use crate::domain::{MechanicId, PaymentMethod};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{TransactionResponse, map_all};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_wire, require};

const MECHANIC_ID: FieldName = FieldName::new("mechanicId");
const AMOUNT: FieldName = FieldName::new("amount");

/// Current diamond balance.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub mechanic_id: String,
    #[schema(example = 5)]
    pub diamond_balance: u32,
}

/// Verified purchase to credit.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBody {
    #[schema(example = 10)]
    pub amount: Option<u32>,
    #[schema(example = "jazzcash")]
    pub payment_method: Option<String>,
    #[schema(example = "JC-20260314-0001")]
    pub payment_reference: Option<String>,
}

/// Manual refund or debit.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AdjustmentBody {
    #[schema(example = 1)]
    pub amount: Option<u32>,
    pub reason: Option<String>,
}

fn trimmed(reason: Option<String>) -> Option<String> {
    reason
        .map(|reason| reason.trim().to_owned())
        .filter(|reason| !reason.is_empty())
}

/// Read the wallet balance.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/{mechanic_id}/wallet",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 404, description = "Unknown mechanic", body = ErrorSchema)
    ),
    tags = ["wallet"],
    operation_id = "getWalletBalance"
)]
#[get("/mechanics/{mechanic_id}/wallet")]
pub async fn get_balance(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<BalanceResponse>> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let diamond_balance = state.wallet_query.balance(mechanic_id).await?;
    Ok(web::Json(BalanceResponse {
        mechanic_id: mechanic_id.to_string(),
        diamond_balance,
    }))
}

/// Ledger entries, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/mechanics/{mechanic_id}/wallet/transactions",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    responses(
        (status = 200, description = "Ledger", body = [TransactionResponse]),
        (status = 404, description = "Unknown mechanic", body = ErrorSchema)
    ),
    tags = ["wallet"],
    operation_id = "getWalletHistory"
)]
#[get("/mechanics/{mechanic_id}/wallet/transactions")]
pub async fn get_history(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<TransactionResponse>>> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let history = state.wallet_query.history(mechanic_id).await?;
    Ok(web::Json(map_all(&history)))
}

/// Credit a verified diamond purchase.
#[utoipa::path(
    post,
    path = "/api/v1/mechanics/{mechanic_id}/wallet/purchases",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    request_body = PurchaseBody,
    responses(
        (status = 201, description = "Purchase credited", body = TransactionResponse),
        (status = 400, description = "Invalid purchase", body = ErrorSchema),
        (status = 409, description = "Payment reference already credited", body = ErrorSchema)
    ),
    tags = ["wallet"],
    operation_id = "creditPurchase"
)]
#[post("/mechanics/{mechanic_id}/wallet/purchases")]
pub async fn credit_purchase(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PurchaseBody>,
) -> ApiResult<HttpResponse> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let body = payload.into_inner();
    let method = require(body.payment_method, FieldName::new("paymentMethod"))?;
    let request = CreditPurchaseRequest {
        mechanic_id,
        amount: require(body.amount, AMOUNT)?,
        payment_method: parse_wire::<PaymentMethod>(&method, FieldName::new("paymentMethod"))?,
        payment_reference: require(body.payment_reference, FieldName::new("paymentReference"))?,
    };
    let entry = state.wallet.credit_purchase(request).await?;
    Ok(HttpResponse::Created().json(TransactionResponse::from(&entry)))
}

/// Return diamonds to a mechanic.
#[utoipa::path(
    post,
    path = "/api/v1/mechanics/{mechanic_id}/wallet/refunds",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    request_body = AdjustmentBody,
    responses(
        (status = 201, description = "Refund credited", body = TransactionResponse),
        (status = 400, description = "Invalid amount", body = ErrorSchema)
    ),
    tags = ["wallet"],
    operation_id = "refundDiamonds"
)]
#[post("/mechanics/{mechanic_id}/wallet/refunds")]
pub async fn refund(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<AdjustmentBody>,
) -> ApiResult<HttpResponse> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let body = payload.into_inner();
    let entry = state
        .wallet
        .refund(RefundRequest {
            mechanic_id,
            amount: require(body.amount, AMOUNT)?,
            reason: trimmed(body.reason),
        })
        .await?;
    Ok(HttpResponse::Created().json(TransactionResponse::from(&entry)))
}

/// Deduct diamonds outside the proposal flow.
#[utoipa::path(
    post,
    path = "/api/v1/mechanics/{mechanic_id}/wallet/debits",
    params(("mechanic_id" = String, Path, description = "Mechanic identifier")),
    request_body = AdjustmentBody,
    responses(
        (status = 201, description = "Debit recorded", body = TransactionResponse),
        (status = 402, description = "Not enough diamonds", body = ErrorSchema)
    ),
    tags = ["wallet"],
    operation_id = "debitDiamonds"
)]
#[post("/mechanics/{mechanic_id}/wallet/debits")]
pub async fn debit(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<AdjustmentBody>,
) -> ApiResult<HttpResponse> {
    let mechanic_id = parse_id::<MechanicId>(&path, MECHANIC_ID)?;
    let body = payload.into_inner();
    let entry = state
        .wallet
        .debit(DebitRequest {
            mechanic_id,
            amount: require(body.amount, AMOUNT)?,
            reason: trimmed(body.reason),
        })
        .await?;
    Ok(HttpResponse::Created().json(TransactionResponse::from(&entry)))
}

#[cfg(test)]
mod tests {
    //! Handler-level coverage with mocked driving ports.
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::{Error, TransactionId, TransactionKind, WalletMovement};
    use crate::inbound::http::state::test_state::MockPorts;
    use crate::test_support::fixture_now;

    async fn call(ports: MockPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::from(ports)))
                .service(
                    web::scope("/api/v1")
                        .service(get_balance)
                        .service(credit_purchase)
                        .service(debit),
                ),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let body = actix_test::read_body(response).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[rstest]
    #[actix_web::test]
    async fn purchase_is_credited() {
        let mechanic_id = MechanicId::random();
        let mut ports = MockPorts::default();
        ports
            .wallet
            .expect_credit_purchase()
            .times(1)
            .withf(|request| {
                request.payment_method == PaymentMethod::Easypaisa
                    && request.payment_reference == "EP-77"
            })
            .returning(|request| {
                Ok(WalletMovement {
                    id: TransactionId::random(),
                    mechanic_id: request.mechanic_id,
                    kind: TransactionKind::Purchase,
                    amount: request.amount,
                    payment_method: Some(request.payment_method),
                    reference: Some(request.payment_reference),
                    created_at: fixture_now(),
                }
                .into_transaction(request.amount))
            });
        let uri = format!("/api/v1/mechanics/{mechanic_id}/wallet/purchases");

        let (status, body) = call(
            ports,
            actix_test::TestRequest::post().uri(&uri).set_json(json!({
                "amount": 10,
                "paymentMethod": "easypaisa",
                "paymentReference": "EP-77"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.get("kind"), Some(&json!("purchase")));
        assert_eq!(body.get("balanceAfter"), Some(&json!(10)));
    }

    #[rstest]
    #[actix_web::test]
    async fn overdraft_is_payment_required() {
        let mut ports = MockPorts::default();
        ports
            .wallet
            .expect_debit()
            .returning(|_| Err(Error::insufficient_balance("balance 0")));
        let uri = format!("/api/v1/mechanics/{}/wallet/debits", MechanicId::random());

        let (status, _) = call(
            ports,
            actix_test::TestRequest::post()
                .uri(&uri)
                .set_json(json!({ "amount": 3 })),
        )
        .await;

        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    }

    #[rstest]
    #[actix_web::test]
    async fn balance_is_reported() {
        let mut ports = MockPorts::default();
        ports.wallet_query.expect_balance().returning(|_| Ok(7));
        let uri = format!("/api/v1/mechanics/{}/wallet", MechanicId::random());

        let (status, body) = call(ports, actix_test::TestRequest::get().uri(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("diamondBalance"), Some(&json!(7)));
    }
}
