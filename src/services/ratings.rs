use chrono::Utc;

use crate::db::queries;
use crate::errors::ApiError;
use crate::services::booking::truncate;
use crate::state::AppState;

/// One rating slot per (user, schedule): the booking only proves the caller
/// rode the schedule, the slot itself is keyed on the pair, so rating a
/// second booking on the same schedule overwrites the first score.
/// Cancelled bookings may still be rated, matching the legacy backend.
pub fn rate_booking(
    state: &AppState,
    user_id: i64,
    booking_id: i64,
    rating: i64,
    comment: Option<&str>,
) -> Result<(), ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::InvalidRating);
    }

    let conn = state.db.lock().unwrap();

    let booking = queries::get_booking(&conn, booking_id)?
        .filter(|b| b.user_id == user_id)
        .ok_or(ApiError::NotFound("Booking"))?;

    let comment = comment.map(|c| truncate(c, 500));
    let now = Utc::now().naive_utc();
    queries::upsert_rating(
        &conn,
        user_id,
        booking.schedule_id,
        rating,
        comment.as_deref(),
        &now,
    )?;
    Ok(())
}

/// Append-only app-wide feedback; only the score is validated.
pub fn submit_app_rating(
    state: &AppState,
    user_id: Option<i64>,
    rating: i64,
    comment: Option<&str>,
    platform: Option<&str>,
) -> Result<i64, ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::InvalidRating);
    }

    let comment = comment.map(|c| truncate(c, 500));
    let platform = truncate(platform.unwrap_or("web"), 30);
    let now = Utc::now().naive_utc();

    let conn = state.db.lock().unwrap();
    let id = queries::insert_app_rating(
        &conn,
        user_id,
        rating,
        comment.as_deref(),
        &platform,
        &now,
    )?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db;
    use crate::services::booking::{create_booking, CreateBookingRequest};
    use crate::services::payments::PaymentLedger;
    use std::sync::{Arc, Mutex};

    fn test_state() -> AppState {
        let config = AppConfig {
            port: 3000,
            database_url: ":memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            token_expiry_hours: 6,
            payment_token_ttl_secs: 900,
            allow_token_reuse: false,
        };
        let conn = db::init_db(":memory:").unwrap();
        AppState {
            db: Arc::new(Mutex::new(conn)),
            payments: PaymentLedger::new(
                config.payment_token_ttl_secs,
                config.allow_token_reuse,
            ),
            config,
        }
    }

    fn seed_schedule(state: &AppState, capacity: i64) -> i64 {
        let conn = state.db.lock().unwrap();
        let route_id = queries::create_route(&conn, "Coastal", "Split", "Dubrovnik").unwrap();
        queries::create_schedule(&conn, route_id, "Bus 7", "2026-09-01T08:00", capacity).unwrap()
    }

    fn seed_user(state: &AppState, email: &str, phone: &str) -> i64 {
        let conn = state.db.lock().unwrap();
        queries::create_user(&conn, email, phone, "x", false).unwrap()
    }

    fn book(state: &AppState, user: i64, sid: i64) -> i64 {
        let token = state.payments.issue(user, 10.0);
        create_booking(
            state,
            user,
            CreateBookingRequest {
                schedule_id: Some(sid),
                seats: Some(1),
                payment_token: Some(token),
                seat_numbers: None,
            },
        )
        .unwrap()
        .booking_id
    }

    #[test]
    fn test_two_bookings_same_schedule_share_one_slot() {
        let state = test_state();
        let user = seed_user(&state, "rider@example.com", "+385911111111");
        let sid = seed_schedule(&state, 10);

        let b1 = book(&state, user, sid);
        let b2 = book(&state, user, sid);

        rate_booking(&state, user, b1, 3, None).unwrap();
        rate_booking(&state, user, b2, 5, Some("much better")).unwrap();

        let conn = state.db.lock().unwrap();
        assert_eq!(queries::count_ratings_for_schedule(&conn, sid).unwrap(), 1);
        assert_eq!(queries::get_rating_score(&conn, user, sid).unwrap(), Some(5));
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let state = test_state();
        let user = seed_user(&state, "rider@example.com", "+385911111111");
        let sid = seed_schedule(&state, 10);
        let b = book(&state, user, sid);

        assert!(matches!(
            rate_booking(&state, user, b, 0, None),
            Err(ApiError::InvalidRating)
        ));
        assert!(matches!(
            rate_booking(&state, user, b, 6, None),
            Err(ApiError::InvalidRating)
        ));
    }

    #[test]
    fn test_rating_foreign_booking_not_found() {
        let state = test_state();
        let owner = seed_user(&state, "rider@example.com", "+385911111111");
        let other = seed_user(&state, "other@example.com", "+385922222222");
        let sid = seed_schedule(&state, 10);
        let b = book(&state, owner, sid);

        assert!(matches!(
            rate_booking(&state, other, b, 4, None),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_cancelled_booking_can_still_be_rated() {
        let state = test_state();
        let user = seed_user(&state, "rider@example.com", "+385911111111");
        let sid = seed_schedule(&state, 10);
        let b = book(&state, user, sid);

        crate::services::booking::cancel_booking(&state, user, b, None).unwrap();
        rate_booking(&state, user, b, 2, Some("bus never came back")).unwrap();

        let conn = state.db.lock().unwrap();
        assert_eq!(queries::get_rating_score(&conn, user, sid).unwrap(), Some(2));
    }

    #[test]
    fn test_app_rating_appends_rows() {
        let state = test_state();
        let user = seed_user(&state, "rider@example.com", "+385911111111");

        submit_app_rating(&state, Some(user), 5, Some("great app"), None).unwrap();
        submit_app_rating(&state, Some(user), 4, None, Some("android")).unwrap();
        submit_app_rating(&state, None, 3, None, None).unwrap();

        let conn = state.db.lock().unwrap();
        let rows = queries::list_app_ratings(&conn, 10).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].platform.as_deref(), Some("web"));
    }

    #[test]
    fn test_app_rating_platform_truncated() {
        let state = test_state();
        let long = "p".repeat(64);
        submit_app_rating(&state, None, 4, None, Some(&long)).unwrap();

        let conn = state.db.lock().unwrap();
        let rows = queries::list_app_ratings(&conn, 1).unwrap();
        assert_eq!(rows[0].platform.as_deref().unwrap().len(), 30);
    }

    #[test]
    fn test_app_rating_out_of_range_rejected() {
        let state = test_state();
        assert!(matches!(
            submit_app_rating(&state, None, 9, None, None),
            Err(ApiError::InvalidRating)
        ));
    }
}
