use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::auth;
use crate::errors::ApiError;
use crate::services::ratings;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RateBookingRequest {
    pub booking_id: Option<i64>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

// POST /api/rate_booking
pub async fn rate_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RateBookingRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let booking_id = body
        .booking_id
        .ok_or_else(|| ApiError::InvalidRequest("booking_id required".to_string()))?;
    let rating = body.rating.ok_or(ApiError::InvalidRating)?;

    ratings::rate_booking(&state, claims.sub, booking_id, rating, body.comment.as_deref())?;
    Ok(Json(serde_json::json!({ "message": "Rating saved" })))
}

#[derive(Deserialize)]
pub struct RateByPathRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

// POST /api/bookings/:id/rating — dashboard fallback alias.
pub async fn rate_booking_by_path(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<i64>,
    Json(body): Json<RateByPathRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let rating = body.rating.ok_or(ApiError::InvalidRating)?;
    ratings::rate_booking(&state, claims.sub, booking_id, rating, body.comment.as_deref())?;
    Ok(Json(serde_json::json!({ "message": "Rating saved" })))
}

#[derive(Deserialize)]
pub struct AppRatingRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub platform: Option<String>,
}

// POST /api/app_rating (alias: POST /api/feedback)
pub async fn submit_app_rating(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AppRatingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let rating = body.rating.ok_or(ApiError::InvalidRating)?;
    ratings::submit_app_rating(
        &state,
        Some(claims.sub),
        rating,
        body.comment.as_deref(),
        body.platform.as_deref(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Thanks for your feedback!" })),
    ))
}
