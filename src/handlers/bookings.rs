use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::db::queries;
use crate::errors::ApiError;
use crate::services::booking::{self, CancelOutcome, CreateBookingRequest};
use crate::services::proof::ProofPayload;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BookRequest {
    pub schedule_id: Option<i64>,
    pub seats: Option<i64>,
    pub payment_token: Option<String>,
    pub seat_numbers: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct BookResponse {
    pub message: String,
    pub booking_id: i64,
    pub proof: ProofPayload,
    pub proof_base64: String,
}

// POST /api/book
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let receipt = booking::create_booking(
        &state,
        claims.sub,
        CreateBookingRequest {
            schedule_id: body.schedule_id,
            seats: body.seats,
            payment_token: body.payment_token,
            seat_numbers: body.seat_numbers,
        },
    )?;

    tracing::info!(
        booking_id = receipt.booking_id,
        user_id = claims.sub,
        "booking created"
    );

    let proof_base64 = receipt.proof.encode()?;
    Ok(Json(BookResponse {
        message: "Booking successful".to_string(),
        booking_id: receipt.booking_id,
        proof: receipt.proof,
        proof_base64,
    }))
}

#[derive(Serialize)]
pub struct ProofResponse {
    pub proof: ProofPayload,
    pub proof_base64: String,
}

// GET /api/booking_qr/:id — owner-only re-issue of the scannable proof.
pub async fn booking_proof(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<i64>,
) -> Result<Json<ProofResponse>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let booking = {
        let conn = state.db.lock().unwrap();
        queries::get_booking(&conn, booking_id)?
    }
    .filter(|b| b.user_id == claims.sub)
    .ok_or(ApiError::NotFound("Booking"))?;

    if booking.is_cancelled {
        return Err(ApiError::InvalidRequest("Booking is cancelled".to_string()));
    }

    let proof = ProofPayload::for_booking(&booking);
    let proof_base64 = proof.encode()?;
    Ok(Json(ProofResponse {
        proof,
        proof_base64,
    }))
}

#[derive(Serialize)]
pub struct BookingSummary {
    pub id: i64,
    pub schedule_id: i64,
    pub seats: i64,
    pub seat_numbers: Vec<String>,
    pub created_at: String,
    pub is_cancelled: bool,
    pub status: String,
    pub rating: Option<i64>,
}

#[derive(Serialize)]
pub struct MyBookingsResponse {
    pub bookings: Vec<BookingSummary>,
}

// GET /api/mybookings
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MyBookingsResponse>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let conn = state.db.lock().unwrap();
    let bookings = queries::bookings_for_user(&conn, claims.sub)?;

    let mut out = Vec::with_capacity(bookings.len());
    for b in bookings {
        let rating = queries::get_rating_score(&conn, claims.sub, b.schedule_id)?;
        out.push(BookingSummary {
            id: b.id,
            schedule_id: b.schedule_id,
            seats: b.seats,
            seat_numbers: b.seat_numbers.clone().unwrap_or_default(),
            created_at: b.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            is_cancelled: b.is_cancelled,
            status: b.status().to_string(),
            rating,
        });
    }

    Ok(Json(MyBookingsResponse { bookings: out }))
}

#[derive(Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

fn cancel_response(outcome: CancelOutcome) -> Json<serde_json::Value> {
    let message = match outcome {
        CancelOutcome::Cancelled => "Booking cancelled",
        CancelOutcome::AlreadyCancelled => "Already cancelled",
    };
    Json(serde_json::json!({ "message": message, "success": true }))
}

// POST /api/cancel_booking/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<i64>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let reason = body.and_then(|Json(b)| b.reason);
    let outcome = booking::cancel_booking(&state, claims.sub, booking_id, reason.as_deref())?;

    tracing::info!(booking_id, user_id = claims.sub, "booking cancelled");
    Ok(cancel_response(outcome))
}

#[derive(Deserialize)]
pub struct CancelByBodyRequest {
    pub booking_id: Option<i64>,
    pub reason: Option<String>,
}

// POST /api/cancel_booking — legacy clients send the id in the body.
pub async fn cancel_booking_by_body(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CancelByBodyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let booking_id = body
        .booking_id
        .ok_or_else(|| ApiError::InvalidRequest("booking_id required".to_string()))?;
    let outcome =
        booking::cancel_booking(&state, claims.sub, booking_id, body.reason.as_deref())?;

    tracing::info!(booking_id, user_id = claims.sub, "booking cancelled");
    Ok(cancel_response(outcome))
}

// DELETE /api/bookings/:id — dashboard fallback, no reason body.
pub async fn cancel_booking_delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = auth::authenticate(&headers, &state.config)?;

    let outcome = booking::cancel_booking(&state, claims.sub, booking_id, None)?;
    Ok(cancel_response(outcome))
}
