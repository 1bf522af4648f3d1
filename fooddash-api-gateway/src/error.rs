use axum::{http::StatusCode, response::Json};
use fooddash_marketplace_service::{ErrorKind, MarketplaceError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Invalid token")]
    InvalidToken,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationFailed | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Marketplace(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Marketplace(e) if e.kind() == ErrorKind::Infrastructure => {
                "Internal server error".to_string()
            }
            ApiError::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = Json(json!({
            "error": self.message()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use fooddash_marketplace_service::Conflict;
    use fooddash_marketplace_service::lookup::OrderStatus;

    use super::*;

    #[test]
    fn marketplace_errors_map_by_kind() {
        let cases = [
            (MarketplaceError::EmptyItems, StatusCode::BAD_REQUEST),
            (MarketplaceError::InvalidOptionValue(3), StatusCode::BAD_REQUEST),
            (MarketplaceError::RestaurantNotFound, StatusCode::NOT_FOUND),
            (MarketplaceError::NotFound("order"), StatusCode::NOT_FOUND),
            (
                MarketplaceError::from(Conflict::OrderAlreadyAssigned),
                StatusCode::CONFLICT,
            ),
            (MarketplaceError::Forbidden, StatusCode::FORBIDDEN),
            (
                MarketplaceError::UnknownLookupId {
                    table: "order_statuses",
                    id: 9,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn conflict_message_is_passed_through() {
        let err = ApiError::from(MarketplaceError::from(Conflict::OrderStatus {
            expected: OrderStatus::Preparing,
        }));
        assert_eq!(err.message(), "order not in preparing state");
    }

    #[test]
    fn infrastructure_detail_is_hidden() {
        let err = ApiError::from(MarketplaceError::MissingLookup {
            table: "rider_statuses",
            name: "ONLINE",
        });
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn token_errors_are_unauthorized() {
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::AuthenticationFailed.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::ServiceUnavailable("pool".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
