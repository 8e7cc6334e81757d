use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A seat allocation against a schedule. Rows are soft-cancelled, never
/// deleted; `seat_numbers` survives cancellation for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub schedule_id: i64,
    pub seats: i64,
    pub seat_numbers: Option<Vec<String>>,
    pub is_cancelled: bool,
    pub cancelled_at: Option<NaiveDateTime>,
    pub cancel_reason: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Booking {
    pub fn status(&self) -> &'static str {
        if self.is_cancelled {
            "cancelled"
        } else {
            "active"
        }
    }
}
