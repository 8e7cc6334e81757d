use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::ApiError;
use crate::models::{BusRoute, Schedule};
use crate::state::AppState;

#[derive(Serialize)]
pub struct RoutesResponse {
    pub routes: Vec<BusRoute>,
}

// GET /api/routes
pub async fn list_routes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RoutesResponse>, ApiError> {
    let routes = {
        let conn = state.db.lock().unwrap();
        queries::list_routes(&conn)?
    };
    Ok(Json(RoutesResponse { routes }))
}

#[derive(Serialize)]
pub struct SchedulesResponse {
    pub schedules: Vec<Schedule>,
}

// GET /api/schedules
pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchedulesResponse>, ApiError> {
    let schedules = {
        let conn = state.db.lock().unwrap();
        queries::list_schedules(&conn)?
    };
    Ok(Json(SchedulesResponse { schedules }))
}
