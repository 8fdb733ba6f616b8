use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("User profile not found")]
    ProfileNotFound,

    #[error("Invalid user role")]
    InvalidRole(String),

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid price or quantity")]
    InvalidQuantity,

    #[error("Invalid location coordinates")]
    InvalidLocation,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Malformed query string: {0}")]
    MalformedQuery(String),

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Too many submissions, please try again later")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl MarketError {
    /// Only authentication failures are 401; everything the caller can fix is 400
    /// except throttling (429) and oversized bodies (413).
    pub fn status(&self) -> StatusCode {
        match self {
            MarketError::Unauthenticated => StatusCode::UNAUTHORIZED,
            MarketError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            MarketError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            MarketError::ProfileNotFound
            | MarketError::InvalidRole(_)
            | MarketError::MissingFields
            | MarketError::InvalidQuantity
            | MarketError::InvalidLocation
            | MarketError::MalformedBody(_)
            | MarketError::MalformedQuery(_)
            | MarketError::Database(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        match &self {
            MarketError::Database(e) => tracing::error!("Database error: {}", e),
            MarketError::InvalidRole(role) => tracing::warn!("Rejected profile role {:?}", role),
            _ => tracing::debug!("Request rejected: {}", self),
        }

        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_failures_are_401() {
        assert_eq!(MarketError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        for err in [
            MarketError::ProfileNotFound,
            MarketError::InvalidRole("admin".to_string()),
            MarketError::MissingFields,
            MarketError::InvalidQuantity,
            MarketError::InvalidLocation,
            MarketError::MalformedBody("eof".to_string()),
            MarketError::MalformedQuery("duplicate field".to_string()),
            MarketError::Database(sqlx::Error::RowNotFound),
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{err}");
        }
        assert_eq!(MarketError::BodyTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_quantity_message() {
        assert_eq!(
            MarketError::InvalidQuantity.to_string(),
            "Invalid price or quantity"
        );
    }
}
