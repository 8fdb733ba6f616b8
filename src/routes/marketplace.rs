use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;

use super::{AppState, CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_ALLOW_ORIGIN};
use crate::error::{AppResult, MarketError};
use crate::middleware::AuthenticatedUser;
use crate::models::{ListingPayload, ListingRecord, ListingSummary};

#[derive(Debug, Default, Deserialize)]
pub struct MatchParams {
    pub food_type: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<(StatusCode, Json<ListingRecord>)> {
    let body = body.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => MarketError::BodyTooLarge,
        _ => MarketError::MalformedBody(e.body_text()),
    })?;
    let payload: ListingPayload =
        serde_json::from_slice(&body).map_err(|e| MarketError::MalformedBody(e.to_string()))?;

    let record = state.marketplace.create(&user, payload).await?;
    tracing::info!(
        "{} {} submitted {} x{} to {}",
        user.role,
        user.user_id,
        record.food_type,
        record.quantity,
        user.role.target().table()
    );
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_own(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ListingRecord>>> {
    Ok(Json(state.marketplace.list_own(&user).await?))
}

pub async fn matches(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    params: Result<Query<MatchParams>, QueryRejection>,
) -> AppResult<Json<Vec<ListingRecord>>> {
    let Query(params) = params.map_err(|e| MarketError::MalformedQuery(e.body_text()))?;
    Ok(Json(state.marketplace.matches(&user, params.food_type).await?))
}

pub async fn summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ListingSummary>> {
    Ok(Json(state.marketplace.summary(&user).await?))
}

pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, CORS_ALLOW_ORIGIN),
            (header::ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS),
        ],
    )
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
