pub mod admin;
pub mod cart;
pub mod chat;
pub mod order;
pub mod owner;
pub mod payment;
pub mod rider;

pub use admin::router as admin_router;
pub use cart::router as cart_router;
pub use chat::router as chat_router;
pub use order::router as order_router;
pub use owner::router as owner_router;
pub use payment::router as payment_router;
pub use rider::router as rider_router;

use std::sync::Arc;

use axum::Router;
use diesel::PgConnection;
use fooddash_marketplace_service::{DbPool, MarketplaceError};
use utoipa::OpenApi;

use crate::config::GatewaySettings;
use crate::error::ApiError;
use crate::slip::SlipVerifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub settings: Arc<GatewaySettings>,
    /// Absent when no verifier is configured; slip uploads are refused.
    pub slip: Option<SlipVerifier>,
}

/// Runs a core operation on a pooled connection off the async runtime.
pub(crate) async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, MarketplaceError> + Send + 'static,
    T: Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| {
            tracing::warn!("no database connection available: {e}");
            ApiError::ServiceUnavailable("database unavailable".to_string())
        })?;
        f(&mut *conn).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("blocking task failed: {e}")))?
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(cart_router())
        .merge(order_router())
        .merge(owner_router())
        .merge(rider_router())
        .merge(payment_router())
        .merge(chat_router())
        .merge(admin_router())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        cart::get_cart,
        cart::clear_cart,
        cart::add_cart_item,
        cart::update_cart_item,
        cart::remove_cart_item,
        order::create_order,
        order::checkout,
        order::list_orders,
        order::get_order,
        owner::list_restaurant_orders,
        owner::accept_order,
        owner::cancel_order,
        owner::hand_off_order,
        owner::complete_order,
        rider::get_rider,
        rider::update_availability,
        rider::list_available_orders,
        rider::accept_work,
        rider::complete_work,
        rider::get_current_work,
        rider::list_works,
        payment::select_payment_method,
        payment::upload_slip,
        payment::get_payment,
        chat::get_chat_access,
        admin::approve_rider_application,
    ),
    components(
        schemas(
            crate::models::AddCartItemRequest,
            crate::models::UpdateCartItemRequest,
            crate::models::SelectionResponse,
            crate::models::LineItemResponse,
            crate::models::CartResponse,
            crate::models::OrderItemRequest,
            crate::models::CreateOrderRequest,
            crate::models::CreateOrderResponse,
            crate::models::OrderResponse,
            crate::models::OrderDetailResponse,
            crate::models::ListOrdersResponse,
            crate::models::RiderResponse,
            crate::models::UpdateAvailabilityRequest,
            crate::models::AvailableOrderResponse,
            crate::models::ListAvailableOrdersResponse,
            crate::models::RiderWorkResponse,
            crate::models::ListRiderWorksResponse,
            crate::models::CurrentWorkResponse,
            crate::models::CompleteWorkResponse,
            crate::models::SelectPaymentMethodRequest,
            crate::models::UploadSlipRequest,
            crate::models::PaymentResponse,
            crate::models::ChatAccessResponse,
            crate::models::ApiErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "cart", description = "Customer cart endpoints"),
        (name = "orders", description = "Order placement and lookup endpoints"),
        (name = "restaurant", description = "Restaurant order fulfilment endpoints"),
        (name = "rider", description = "Rider availability and delivery work endpoints"),
        (name = "payments", description = "Payment method and slip endpoints"),
        (name = "chat", description = "Chat room access endpoints"),
        (name = "admin", description = "Administration endpoints")
    ),
    info(
        title = "FoodDash API Gateway",
        description = "HTTP API for the FoodDash marketplace",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::*;
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use diesel::r2d2::{ConnectionManager, Pool};
    use fooddash_marketplace_service::{Role, Settings};
    use jsonwebtoken::{EncodingKey, Header};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::Claims;

    const SECRET: &str = "router-test-secret";

    fn state() -> AppState {
        // Never connects; tests below are answered before a connection is needed.
        let manager = ConnectionManager::<PgConnection>::new("postgres://localhost/unused");
        let pool = Pool::builder().build_unchecked(manager);
        let settings = GatewaySettings {
            core: Settings {
                database_url: "postgres://localhost/unused".to_string(),
                pool_size: 1,
                delivery_fee: 20,
                require_slip_amount_match: true,
            },
            jwt_secret: SECRET.to_string(),
            bind_address: crate::config::DEFAULT_BIND_ADDRESS.to_string(),
            slip_verifier: None,
        };
        AppState {
            pool,
            settings: Arc::new(settings),
            slip: None,
        }
    }

    fn token(role: Role) -> String {
        let claims = Claims {
            sub: "7".to_string(),
            role,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn requests_without_token_are_unauthorized() {
        let app = router().with_state(state());
        for (method, uri) in [
            ("GET", "/cart"),
            ("POST", "/orders/checkout"),
            ("POST", "/orders/1/accept"),
            ("POST", "/rider/orders/1/complete"),
            ("GET", "/orders/1/payment"),
        ] {
            let response = app
                .clone()
                .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn forged_token_is_unauthorized() {
        let app = router().with_state(state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/rider")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn slip_upload_needs_a_configured_verifier() {
        let app = router().with_state(state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orders/1/payment/slip")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token(Role::Customer)))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"qr_payload":"0046000600000101030140225"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn openapi_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/cart",
            "/cart/items/{id}",
            "/orders/checkout",
            "/restaurants/{id}/orders",
            "/orders/{id}/hand-off",
            "/rider/orders/{id}/accept",
            "/orders/{id}/payment/slip",
            "/orders/{id}/chat-access",
            "/admin/rider-applications/{id}/approve",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
