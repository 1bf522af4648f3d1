//! Restaurant operator endpoints: the order queue and the status transitions
//! the operator drives.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
};
use diesel::PgConnection;
use fooddash_marketplace_service::lookup::{self, OrderStatus};
use fooddash_marketplace_service::models::Order;
use fooddash_marketplace_service::orders::{self, OrderSummary, status};
use fooddash_marketplace_service::{MarketplaceError, Principal};
use serde::Deserialize;
use tracing::instrument;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;

use super::{AppState, run_blocking};

type Transition = fn(&mut PgConnection, &Principal, i64) -> Result<Order, MarketplaceError>;

#[derive(Debug, Deserialize)]
pub struct ListRestaurantOrdersQuery {
    pub status: Option<OrderStatus>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants/{id}/orders", get(list_restaurant_orders))
        .route("/orders/{id}/accept", post(accept_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/hand-off", post(hand_off_order))
        .route("/orders/{id}/complete", post(complete_order))
}

async fn transition(
    state: &AppState,
    principal: Principal,
    order_id: i64,
    apply: Transition,
) -> Result<Json<OrderResponse>, ApiError> {
    let summary = run_blocking(state, move |conn| {
        let order = apply(conn, &principal, order_id)?;
        OrderSummary::from_order(order, lookup::lookups(conn)?)
    })
    .await?;
    Ok(Json(summary.into()))
}

#[utoipa::path(
    get,
    path = "/restaurants/{id}/orders",
    responses(
        (status = 200, description = "Orders of the restaurant, newest first", body = ListOrdersResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Caller does not operate the restaurant", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Restaurant ID"),
        ("status" = Option<String>, Query, description = "Only orders in this status, e.g. PREPARING")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "restaurant"
)]
#[instrument(skip(state))]
pub async fn list_restaurant_orders(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<ListRestaurantOrdersQuery>,
) -> Result<Json<ListOrdersResponse>, ApiError> {
    let orders = run_blocking(&state, move |conn| {
        orders::list_restaurant_orders(conn, &principal, id, query.status)
    })
    .await?;
    Ok(Json(orders.into()))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/accept",
    responses(
        (status = 200, description = "Order moved from PENDING to PREPARING", body = OrderResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Caller does not operate the restaurant", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
        (status = 409, description = "Order is not PENDING", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "restaurant"
)]
#[instrument(skip(state))]
pub async fn accept_order(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    transition(&state, principal, id, status::accept).await
}

#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    responses(
        (status = 200, description = "Order moved from PENDING to CANCELLED", body = OrderResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Caller does not operate the restaurant", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
        (status = 409, description = "Order is not PENDING", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "restaurant"
)]
#[instrument(skip(state))]
pub async fn cancel_order(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    transition(&state, principal, id, status::cancel).await
}

#[utoipa::path(
    post,
    path = "/orders/{id}/hand-off",
    responses(
        (status = 200, description = "Order moved from PREPARING to DELIVERING", body = OrderResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Caller does not operate the restaurant", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
        (status = 409, description = "Order is not PREPARING", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "restaurant"
)]
#[instrument(skip(state))]
pub async fn hand_off_order(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    transition(&state, principal, id, status::hand_off).await
}

#[utoipa::path(
    post,
    path = "/orders/{id}/complete",
    responses(
        (status = 200, description = "Order moved from DELIVERING to COMPLETED", body = OrderResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Caller does not operate the restaurant", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
        (status = 409, description = "Order is not DELIVERING", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "restaurant"
)]
#[instrument(skip(state))]
pub async fn complete_order(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    transition(&state, principal, id, status::complete).await
}
