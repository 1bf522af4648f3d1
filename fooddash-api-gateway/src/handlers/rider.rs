use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
};
use fooddash_marketplace_service::riders;
use tracing::instrument;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;

use super::{AppState, run_blocking};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rider", get(get_rider))
        .route("/rider/availability", put(update_availability))
        .route("/rider/available-orders", get(list_available_orders))
        .route("/rider/orders/{id}/accept", post(accept_work))
        .route("/rider/orders/{id}/complete", post(complete_work))
        .route("/rider/work", get(get_current_work))
        .route("/rider/works", get(list_works))
}

#[utoipa::path(
    get,
    path = "/rider",
    responses(
        (status = 200, description = "Rider profile of the caller", body = RiderResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Caller is not a rider", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "rider"
)]
#[instrument(skip(state))]
pub async fn get_rider(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<RiderResponse>, ApiError> {
    let rider = run_blocking(&state, move |conn| riders::get_rider(conn, &principal)).await?;
    Ok(Json(rider.into()))
}

#[utoipa::path(
    put,
    path = "/rider/availability",
    request_body = UpdateAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = RiderResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Caller is not a rider", body = ApiErrorResponse),
        (status = 409, description = "Rider has active work", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "rider"
)]
#[instrument(skip(state))]
pub async fn update_availability(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<RiderResponse>, ApiError> {
    let rider = run_blocking(&state, move |conn| {
        riders::set_availability(conn, &principal, payload.online)
    })
    .await?;
    Ok(Json(rider.into()))
}

#[utoipa::path(
    get,
    path = "/rider/available-orders",
    responses(
        (status = 200, description = "PREPARING orders nobody is delivering, oldest first", body = ListAvailableOrdersResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Caller is not a rider", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "rider"
)]
#[instrument(skip(state))]
pub async fn list_available_orders(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<ListAvailableOrdersResponse>, ApiError> {
    let orders = run_blocking(&state, move |conn| riders::list_available(conn, &principal)).await?;
    Ok(Json(ListAvailableOrdersResponse {
        orders: orders.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/rider/orders/{id}/accept",
    responses(
        (status = 200, description = "Work assigned; order moved to DELIVERING", body = RiderWorkResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Order or rider not found", body = ApiErrorResponse),
        (status = 409, description = "Rider busy or offline, or order not available", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "rider"
)]
#[instrument(skip(state))]
pub async fn accept_work(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RiderWorkResponse>, ApiError> {
    let work = run_blocking(&state, move |conn| riders::accept_work(conn, &principal, id)).await?;
    Ok(Json(work.into()))
}

#[utoipa::path(
    post,
    path = "/rider/orders/{id}/complete",
    responses(
        (status = 200, description = "Work finished; order COMPLETED", body = CompleteWorkResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Order or rider not found", body = ApiErrorResponse),
        (status = 409, description = "No active work on this order", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "rider"
)]
#[instrument(skip(state))]
pub async fn complete_work(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<CompleteWorkResponse>, ApiError> {
    let completed =
        run_blocking(&state, move |conn| riders::complete_work(conn, &principal, id)).await?;
    Ok(Json(completed.into()))
}

#[utoipa::path(
    get,
    path = "/rider/work",
    responses(
        (status = 200, description = "Active work, or null when idle", body = CurrentWorkResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Caller is not a rider", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "rider"
)]
#[instrument(skip(state))]
pub async fn get_current_work(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Option<CurrentWorkResponse>>, ApiError> {
    let current = run_blocking(&state, move |conn| riders::current_work(conn, &principal)).await?;
    Ok(Json(current.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/rider/works",
    responses(
        (status = 200, description = "Finished works, newest first", body = ListRiderWorksResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Caller is not a rider", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "rider"
)]
#[instrument(skip(state))]
pub async fn list_works(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<ListRiderWorksResponse>, ApiError> {
    let works = run_blocking(&state, move |conn| riders::work_history(conn, &principal)).await?;
    Ok(Json(ListRiderWorksResponse {
        works: works.into_iter().map(Into::into).collect(),
    }))
}
