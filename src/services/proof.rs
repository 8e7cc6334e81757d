use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::models::Booking;

/// The structured record proving a booking's details. Rendering it as an
/// actual QR image is a client concern; the API ships the payload plus a
/// base64 encoding ready for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofPayload {
    pub booking_id: i64,
    pub user_id: i64,
    pub schedule_id: i64,
    pub seats: i64,
    pub seat_numbers: Vec<String>,
    pub timestamp: String,
}

impl ProofPayload {
    pub fn for_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            user_id: booking.user_id,
            schedule_id: booking.schedule_id,
            seats: booking.seats,
            seat_numbers: booking.seat_numbers.clone().unwrap_or_default(),
            timestamp: booking.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(B64.encode(json))
    }
}
