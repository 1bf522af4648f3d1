use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
};
use fooddash_marketplace_service::payments;
use tracing::instrument;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;

use super::{AppState, run_blocking};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/payment", get(get_payment))
        .route("/orders/{id}/payment/method", put(select_payment_method))
        .route("/orders/{id}/payment/slip", post(upload_slip))
}

#[utoipa::path(
    put,
    path = "/orders/{id}/payment/method",
    request_body = SelectPaymentMethodRequest,
    responses(
        (status = 200, description = "Payment method recorded", body = PaymentResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Caller did not place the order", body = ApiErrorResponse),
        (status = 409, description = "Order cancelled or payment already settled", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "payments"
)]
#[instrument(skip(state))]
pub async fn select_payment_method(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<SelectPaymentMethodRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = run_blocking(&state, move |conn| {
        payments::select_method(conn, &principal, id, payload.method)
    })
    .await?;
    Ok(Json(payment.into()))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/payment/slip",
    request_body = UploadSlipRequest,
    responses(
        (status = 200, description = "Slip verified and attached", body = PaymentResponse),
        (status = 400, description = "Slip rejected by the verifier", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Caller did not place the order", body = ApiErrorResponse),
        (status = 409, description = "Slip already used, order cancelled or payment settled", body = ApiErrorResponse),
        (status = 503, description = "Slip verification unavailable", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "payments"
)]
#[instrument(skip(state, payload))]
pub async fn upload_slip(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UploadSlipRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let verifier = state.slip.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("slip verification is not configured".to_string())
    })?;
    let slip = verifier.verify(&payload.qr_payload).await?;
    let require_match = state.settings.core.require_slip_amount_match;

    let payment = run_blocking(&state, move |conn| {
        payments::attach_slip(conn, &principal, id, &slip, require_match)
    })
    .await?;
    Ok(Json(payment.into()))
}

#[utoipa::path(
    get,
    path = "/orders/{id}/payment",
    responses(
        (status = 200, description = "Payment of the order", body = PaymentResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not the customer or restaurant operator", body = ApiErrorResponse),
        (status = 404, description = "Order or payment not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "payments"
)]
#[instrument(skip(state))]
pub async fn get_payment(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment =
        run_blocking(&state, move |conn| payments::get_payment(conn, &principal, id)).await?;
    Ok(Json(payment.into()))
}
