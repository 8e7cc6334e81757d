use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PayRequest {
    pub amount: Option<f64>,
}

#[derive(Serialize)]
pub struct PayResponse {
    pub status: String,
    pub payment_token: String,
}

// POST /api/pay — simulated gateway, always succeeds.
pub async fn request_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PayRequest>,
) -> Result<Json<PayResponse>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let amount = body
        .amount
        .ok_or_else(|| ApiError::InvalidRequest("Amount required".to_string()))?;

    let payment_token = state.payments.issue(claims.sub, amount);
    tracing::debug!(user_id = claims.sub, "issued payment token");

    Ok(Json(PayResponse {
        status: "success".to_string(),
        payment_token,
    }))
}
