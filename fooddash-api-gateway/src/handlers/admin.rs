use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::post,
};
use fooddash_marketplace_service::riders;
use tracing::instrument;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;

use super::{AppState, run_blocking};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/admin/rider-applications/{id}/approve",
        post(approve_rider_application),
    )
}

#[utoipa::path(
    post,
    path = "/admin/rider-applications/{id}/approve",
    responses(
        (status = 200, description = "Application approved; rider created OFFLINE", body = RiderResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ApiErrorResponse),
        (status = 404, description = "Application not found", body = ApiErrorResponse),
        (status = 409, description = "Application already approved", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Rider application ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "admin"
)]
#[instrument(skip(state))]
pub async fn approve_rider_application(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RiderResponse>, ApiError> {
    let rider = run_blocking(&state, move |conn| {
        riders::approve_application(conn, &principal, id)
    })
    .await?;
    Ok(Json(rider.into()))
}
