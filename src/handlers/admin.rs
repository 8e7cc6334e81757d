use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::auth;
use crate::db::queries;
use crate::errors::ApiError;
use crate::state::AppState;

// ── Routes ──

#[derive(Deserialize)]
pub struct AddRouteRequest {
    pub name: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

// POST /api/admin/routes
pub async fn add_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AddRouteRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    auth::require_admin(&headers, &state.config)?;

    let (Some(name), Some(origin), Some(destination)) = (
        body.name.filter(|s| !s.is_empty()),
        body.origin.filter(|s| !s.is_empty()),
        body.destination.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::InvalidRequest("Missing fields".to_string()));
    };

    let route_id = {
        let conn = state.db.lock().unwrap();
        queries::create_route(&conn, &name, &origin, &destination)?
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Route added", "route_id": route_id })),
    ))
}

#[derive(Deserialize)]
pub struct UpdateRouteRequest {
    pub name: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

// PUT /api/admin/routes/:id
pub async fn update_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRouteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth::require_admin(&headers, &state.config)?;

    let updated = {
        let conn = state.db.lock().unwrap();
        queries::update_route(
            &conn,
            id,
            body.name.as_deref(),
            body.origin.as_deref(),
            body.destination.as_deref(),
        )?
    };

    if !updated {
        return Err(ApiError::NotFound("Route"));
    }
    Ok(Json(serde_json::json!({ "message": "Route updated" })))
}

// DELETE /api/admin/routes/:id
pub async fn delete_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth::require_admin(&headers, &state.config)?;

    let deleted = {
        let conn = state.db.lock().unwrap();
        queries::delete_route(&conn, id)?
    };

    if !deleted {
        return Err(ApiError::NotFound("Route"));
    }
    Ok(Json(serde_json::json!({ "message": "Route deleted" })))
}

// ── Schedules ──

#[derive(Deserialize)]
pub struct AddScheduleRequest {
    pub route_id: Option<i64>,
    pub bus_name: Option<String>,
    pub departure: Option<String>,
    pub seats_available: Option<i64>,
}

// POST /api/admin/schedules
pub async fn add_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AddScheduleRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    auth::require_admin(&headers, &state.config)?;

    let (Some(route_id), Some(bus_name), Some(departure)) = (
        body.route_id,
        body.bus_name.filter(|s| !s.is_empty()),
        body.departure.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::InvalidRequest("Missing fields".to_string()));
    };
    let capacity = body.seats_available.unwrap_or(40);
    if capacity < 0 {
        return Err(ApiError::InvalidRequest(
            "seats_available must be >= 0".to_string(),
        ));
    }

    let schedule_id = {
        let conn = state.db.lock().unwrap();
        if queries::get_route(&conn, route_id)?.is_none() {
            return Err(ApiError::NotFound("Route"));
        }
        queries::create_schedule(&conn, route_id, &bus_name, &departure, capacity)?
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Schedule added", "schedule_id": schedule_id })),
    ))
}

#[derive(Deserialize)]
pub struct UpdateScheduleRequest {
    pub route_id: Option<i64>,
    pub bus_name: Option<String>,
    pub departure: Option<String>,
    pub seats_available: Option<i64>,
}

// PUT /api/admin/schedules/:id
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateScheduleRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth::require_admin(&headers, &state.config)?;

    if body.seats_available.is_some_and(|n| n < 0) {
        return Err(ApiError::InvalidRequest(
            "seats_available must be >= 0".to_string(),
        ));
    }

    let updated = {
        let conn = state.db.lock().unwrap();
        queries::update_schedule(
            &conn,
            id,
            body.route_id,
            body.bus_name.as_deref(),
            body.departure.as_deref(),
            body.seats_available,
        )?
    };

    if !updated {
        return Err(ApiError::NotFound("Schedule"));
    }
    Ok(Json(serde_json::json!({ "message": "Schedule updated" })))
}

// DELETE /api/admin/schedules/:id
pub async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth::require_admin(&headers, &state.config)?;

    let deleted = {
        let conn = state.db.lock().unwrap();
        queries::delete_schedule(&conn, id)?
    };

    if !deleted {
        return Err(ApiError::NotFound("Schedule"));
    }
    Ok(Json(serde_json::json!({ "message": "Schedule deleted" })))
}
