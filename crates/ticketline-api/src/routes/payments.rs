//! Routes for the payment processor service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use ticketline_payment::model::Payment;
use ticketline_payment::reconciliation::ReconciliationRecord;
use ticketline_payment::service::PaymentRequest;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::PaymentState;

/// Body for POST /api/payments.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// The booking being paid for.
    pub booking_id: Uuid,
    /// The paying user.
    pub user_id: Uuid,
    /// Amount in minor currency units; must equal the booking total.
    pub amount: i64,
    /// How the payment is made.
    pub payment_method: String,
}

/// POST /api/payments
async fn process_payment(
    State(state): State<PaymentState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let payment = state
        .service
        .process_payment(PaymentRequest {
            booking_id: request.booking_id,
            user_id: request.user_id,
            amount: request.amount,
            payment_method: request.payment_method,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/payments
async fn list_payments(State(state): State<PaymentState>) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.service.list_payments().await?))
}

/// GET /api/payments/{id}
async fn get_payment(
    State(state): State<PaymentState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
    Ok(Json(state.service.get_payment(id).await?))
}

/// GET /api/payments/user/{userId}
async fn list_by_user(
    State(state): State<PaymentState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.service.list_by_user(user_id).await?))
}

/// GET /api/payments/transaction/{transactionId}
async fn get_by_transaction_id(
    State(state): State<PaymentState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    Ok(Json(
        state.service.get_by_transaction_id(&transaction_id).await?,
    ))
}

/// GET /api/payments/reconciliation
async fn list_reconciliation(
    State(state): State<PaymentState>,
) -> Result<Json<Vec<ReconciliationRecord>>, ApiError> {
    Ok(Json(state.service.list_reconciliation().await?))
}

/// POST /api/payments/{id}/refund
async fn refund_payment(
    State(state): State<PaymentState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
    Ok(Json(state.service.refund_payment(id).await?))
}

/// Returns the payment router, mounted under `/api/payments`.
pub fn router() -> Router<PaymentState> {
    Router::new()
        .route("/", post(process_payment).get(list_payments))
        .route("/reconciliation", get(list_reconciliation))
        .route("/transaction/{transactionId}", get(get_by_transaction_id))
        .route("/user/{userId}", get(list_by_user))
        .route("/{id}", get(get_payment))
        .route("/{id}/refund", post(refund_payment))
}
