use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::services::inventory;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ReservedSeatsResponse {
    pub reserved: Vec<String>,
}

// GET /api/schedules/:id/seats
pub async fn reserved_seats(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<i64>,
) -> Result<Json<ReservedSeatsResponse>, ApiError> {
    let reserved = {
        let conn = state.db.lock().unwrap();
        inventory::reserved_labels(&conn, schedule_id)?
    };
    Ok(Json(ReservedSeatsResponse { reserved }))
}

#[derive(Deserialize)]
pub struct SeatsQuery {
    pub schedule_id: Option<i64>,
}

// GET /api/seats?schedule_id= — frontend fallback alias.
pub async fn reserved_seats_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeatsQuery>,
) -> Result<Json<ReservedSeatsResponse>, ApiError> {
    let schedule_id = query
        .schedule_id
        .ok_or_else(|| ApiError::InvalidRequest("schedule_id required".to_string()))?;

    let reserved = {
        let conn = state.db.lock().unwrap();
        inventory::reserved_labels(&conn, schedule_id)?
    };
    Ok(Json(ReservedSeatsResponse { reserved }))
}
