pub mod health;
pub mod marketplace;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::AuthLayer;
use crate::services::marketplace_service::MarketplaceService;

#[derive(Clone)]
pub struct AppState {
    pub marketplace: Arc<MarketplaceService>,
}

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Every response, errors included, is readable cross-origin.
fn allow_any_origin() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    )
}

pub fn router(state: AppState, auth: AuthLayer) -> Router {
    use marketplace::{create, list_own, matches, method_not_allowed, preflight, summary};

    Router::new()
        .route(
            "/marketplace",
            get(list_own)
                .post(create)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/marketplace/matches",
            get(matches).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/marketplace/summary",
            get(summary).options(preflight).fallback(method_not_allowed),
        )
        .route("/health", get(health::check))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(auth)
        .layer(TraceLayer::new_for_http())
        .layer(allow_any_origin())
        .with_state(state)
}
