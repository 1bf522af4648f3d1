use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, patch, post},
};
use fooddash_marketplace_service::cart::{self, AddCartItem};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;

use super::{AppState, run_blocking};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_cart_item))
        .route(
            "/cart/items/{id}",
            patch(update_cart_item).delete(remove_cart_item),
        )
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Current cart, empty when none exists", body = CartResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = run_blocking(&state, move |conn| cart::get(conn, &principal)).await?;
    Ok(Json(cart.into()))
}

#[utoipa::path(
    delete,
    path = "/cart",
    responses(
        (status = 200, description = "Cart emptied and unlocked", body = CartResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn clear_cart(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = run_blocking(&state, move |conn| cart::clear(conn, &principal)).await?;
    Ok(Json(cart.into()))
}

#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Item added or merged", body = CartResponse),
        (status = 400, description = "Invalid menu, option or quantity", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 409, description = "Cart holds another restaurant", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn add_cart_item(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<AddCartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let input = AddCartItem {
        restaurant_id: payload.restaurant_id,
        menu_id: payload.menu_id,
        qty: payload.qty,
        note: payload.note,
        option_value_ids: payload.option_value_ids,
    };
    let cart = run_blocking(&state, move |conn| cart::add(conn, &principal, input)).await?;
    Ok(Json(cart.into()))
}

#[utoipa::path(
    patch,
    path = "/cart/items/{id}",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated, or item removed", body = CartResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "No such item in the caller's cart", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Cart item ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = run_blocking(&state, move |conn| {
        cart::update_qty(conn, &principal, id, payload.qty)
    })
    .await?;
    Ok(Json(cart.into()))
}

#[utoipa::path(
    delete,
    path = "/cart/items/{id}",
    responses(
        (status = 200, description = "Item removed", body = CartResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "No such item in the caller's cart", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Cart item ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = run_blocking(&state, move |conn| cart::remove_item(conn, &principal, id)).await?;
    Ok(Json(cart.into()))
}
