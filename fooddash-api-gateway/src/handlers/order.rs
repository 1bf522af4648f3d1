use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post},
};
use fooddash_marketplace_service::orders::{self, CreateOrder, OrderLineRequest};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;

use super::{AppState, run_blocking};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/checkout", post(checkout))
        .route("/orders/{id}", get(get_order))
}

#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created in PENDING", body = CreateOrderResponse),
        (status = 400, description = "Invalid items", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let input = CreateOrder {
        restaurant_id: payload.restaurant_id,
        items: payload
            .items
            .into_iter()
            .map(|item| OrderLineRequest {
                menu_id: item.menu_id,
                qty: item.qty,
                note: item.note,
                option_value_ids: item.option_value_ids,
            })
            .collect(),
    };
    let delivery_fee = state.settings.core.delivery_fee;

    let created = run_blocking(&state, move |conn| {
        orders::create_order(conn, &principal, delivery_fee, &input)
    })
    .await?;
    Ok(Json(created.into()))
}

#[utoipa::path(
    post,
    path = "/orders/checkout",
    responses(
        (status = 200, description = "Cart converted into a PENDING order", body = CreateOrderResponse),
        (status = 400, description = "Cart is empty or no longer valid", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn checkout(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let delivery_fee = state.settings.core.delivery_fee;
    let created = run_blocking(&state, move |conn| {
        orders::checkout_cart(conn, &principal, delivery_fee)
    })
    .await?;
    Ok(Json(created.into()))
}

#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Orders placed by the caller, newest first", body = ListOrdersResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<ListOrdersResponse>, ApiError> {
    let orders =
        run_blocking(&state, move |conn| orders::list_customer_orders(conn, &principal)).await?;
    Ok(Json(orders.into()))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    responses(
        (status = 200, description = "Order with items and selections", body = OrderDetailResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Not a party to the order", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let detail = run_blocking(&state, move |conn| orders::get_order(conn, &principal, id)).await?;
    Ok(Json(detail.into()))
}
