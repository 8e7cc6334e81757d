use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::db::queries;
use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

// POST /api/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let (Some(email), Some(phone), Some(password)) = (
        body.email.filter(|s| !s.is_empty()),
        body.phone.filter(|s| !s.is_empty()),
        body.password.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::InvalidRequest("Missing fields".to_string()));
    };

    let conn = state.db.lock().unwrap();
    if queries::user_exists(&conn, &email, &phone)? {
        return Err(ApiError::InvalidRequest("User already exists".to_string()));
    }

    let hash = auth::hash_password(&password);
    queries::create_user(&conn, &email, &phone, &hash, false)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User created" })),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub is_admin: bool,
}

// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(email), Some(phone), Some(password)) = (
        body.email.filter(|s| !s.is_empty()),
        body.phone.filter(|s| !s.is_empty()),
        body.password.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::InvalidRequest("Missing fields".to_string()));
    };

    let user = {
        let conn = state.db.lock().unwrap();
        queries::get_user_by_login(&conn, &email, &phone)?
    };

    let user = user
        .filter(|u| auth::verify_password(&password, &u.password_hash))
        .ok_or(ApiError::Unauthorized)?;

    let token = auth::issue_token(&state.config, user.id, user.is_admin)?;
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        is_admin: user.is_admin,
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub email: String,
    pub is_admin: bool,
}

// GET /api/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let user = {
        let conn = state.db.lock().unwrap();
        queries::get_user_by_id(&conn, claims.sub)?
    }
    .ok_or(ApiError::Unauthorized)?;

    Ok(Json(MeResponse {
        email: user.email,
        is_admin: user.is_admin,
    }))
}
