use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::get,
};
use fooddash_marketplace_service::chat;
use tracing::instrument;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;

use super::{AppState, run_blocking};

pub fn router() -> Router<AppState> {
    Router::new().route("/orders/{id}/chat-access", get(get_chat_access))
}

/// Asked by the chat relay before it lets a user join the room of an order.
#[utoipa::path(
    get,
    path = "/orders/{id}/chat-access",
    responses(
        (status = 200, description = "Whether the caller may join the order's room", body = ChatAccessResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "chat"
)]
#[instrument(skip(state))]
pub async fn get_chat_access(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ChatAccessResponse>, ApiError> {
    let allowed = run_blocking(&state, move |conn| {
        chat::can_access_room(conn, principal.user_id, id)
    })
    .await?;
    Ok(Json(ChatAccessResponse {
        order_id: id,
        allowed,
    }))
}
