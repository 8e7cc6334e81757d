use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid payment token")]
    PaymentInvalid,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not enough seats available")]
    InsufficientCapacity,

    #[error("Duplicate seat numbers in selection")]
    DuplicateSeatSelection,

    #[error("Seats count does not match selected seat_numbers")]
    SeatCountMismatch,

    #[error("Some seats are already reserved")]
    SeatConflict(Vec<String>),

    #[error("rating must be 1..5")]
    InvalidRating,

    #[error("unauthorized")]
    Unauthorized,

    #[error("Admin access required")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_)
            | ApiError::PaymentInvalid
            | ApiError::InsufficientCapacity
            | ApiError::DuplicateSeatSelection
            | ApiError::SeatCountMismatch
            | ApiError::InvalidRating => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SeatConflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Database(e) => {
                tracing::error!("database error: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            // Conflicting labels are returned so the caller can re-pick.
            ApiError::SeatConflict(labels) => serde_json::json!({
                "error": self.to_string(),
                "conflict": labels,
            }),
            ApiError::Database(_) => serde_json::json!({ "error": "internal server error" }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
