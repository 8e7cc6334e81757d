use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One rating slot per (user, schedule); writes after the first update in
/// place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub schedule_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

/// App-wide feedback. Append-only, no uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRating {
    pub id: i64,
    pub user_id: Option<i64>,
    pub rating: i64,
    pub comment: Option<String>,
    pub platform: Option<String>,
    pub created_at: NaiveDateTime,
}
