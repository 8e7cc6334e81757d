use std::collections::HashSet;

use chrono::Utc;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::ApiError;
use crate::services::inventory;
use crate::services::proof::ProofPayload;
use crate::state::AppState;

#[derive(Debug, Default)]
pub struct CreateBookingRequest {
    pub schedule_id: Option<i64>,
    pub seats: Option<i64>,
    pub payment_token: Option<String>,
    pub seat_numbers: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct BookingReceipt {
    pub booking_id: i64,
    pub proof: ProofPayload,
}

#[derive(Debug, PartialEq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
}

/// Turn a confirmed payment into a durable seat allocation.
///
/// The db mutex is held across the whole validate-then-write sequence, so
/// two concurrent calls against one schedule serialize: the capacity check
/// and the label-conflict check can never be invalidated between read and
/// write. The payment token is consumed eagerly and handed back if any later
/// step fails.
pub fn create_booking(
    state: &AppState,
    user_id: i64,
    req: CreateBookingRequest,
) -> Result<BookingReceipt, ApiError> {
    let (Some(schedule_id), Some(seats), Some(token)) =
        (req.schedule_id, req.seats, req.payment_token.as_deref())
    else {
        return Err(ApiError::InvalidRequest("Missing fields".to_string()));
    };

    let mut conn = state.db.lock().unwrap();

    if !state.payments.consume(token, user_id) {
        return Err(ApiError::PaymentInvalid);
    }

    match create_locked(&mut conn, user_id, schedule_id, seats, req.seat_numbers) {
        Ok(receipt) => Ok(receipt),
        Err(e) => {
            state.payments.release(token);
            Err(e)
        }
    }
}

fn create_locked(
    conn: &mut Connection,
    user_id: i64,
    schedule_id: i64,
    seats: i64,
    seat_numbers: Option<Vec<String>>,
) -> Result<BookingReceipt, ApiError> {
    let schedule =
        queries::get_schedule(conn, schedule_id)?.ok_or(ApiError::NotFound("Schedule"))?;

    if seats <= 0 {
        return Err(ApiError::InvalidRequest("Seats must be > 0".to_string()));
    }
    if seats > schedule.seats_available {
        return Err(ApiError::InsufficientCapacity);
    }

    let labels = match seat_numbers {
        Some(raw) if !raw.is_empty() => {
            let normalized = inventory::normalize_labels(&raw);
            // All-blank input degrades to an unlabeled booking.
            if normalized.is_empty() {
                None
            } else {
                let mut seen = HashSet::new();
                if !normalized.iter().all(|l| seen.insert(l.clone())) {
                    return Err(ApiError::DuplicateSeatSelection);
                }
                if normalized.len() as i64 != seats {
                    return Err(ApiError::SeatCountMismatch);
                }

                let taken: HashSet<String> =
                    inventory::reserved_labels(conn, schedule_id)?.into_iter().collect();
                let mut conflict: Vec<String> = normalized
                    .iter()
                    .filter(|l| taken.contains(*l))
                    .cloned()
                    .collect();
                if !conflict.is_empty() {
                    conflict.sort();
                    return Err(ApiError::SeatConflict(conflict));
                }
                Some(normalized)
            }
        }
        _ => None,
    };

    let created_at = Utc::now().naive_utc();
    let tx = conn.transaction().map_err(anyhow::Error::from)?;

    // The guard re-checks the capacity condition as the write happens.
    if !queries::decrement_seats(&tx, schedule_id, seats)? {
        return Err(ApiError::InsufficientCapacity);
    }
    let booking_id = queries::insert_booking(
        &tx,
        user_id,
        schedule_id,
        seats,
        labels.as_deref(),
        &created_at,
    )?;
    tx.commit().map_err(anyhow::Error::from)?;

    let booking = queries::get_booking(conn, booking_id)?
        .ok_or_else(|| anyhow::anyhow!("booking {booking_id} vanished after insert"))?;

    Ok(BookingReceipt {
        booking_id,
        proof: ProofPayload::for_booking(&booking),
    })
}

/// Idempotent soft cancel. Ownership mismatch reads the same as a missing
/// booking so callers cannot probe other users' bookings.
pub fn cancel_booking(
    state: &AppState,
    user_id: i64,
    booking_id: i64,
    reason: Option<&str>,
) -> Result<CancelOutcome, ApiError> {
    let mut conn = state.db.lock().unwrap();

    let booking = queries::get_booking(&conn, booking_id)?
        .filter(|b| b.user_id == user_id)
        .ok_or(ApiError::NotFound("Booking"))?;

    if booking.is_cancelled {
        return Ok(CancelOutcome::AlreadyCancelled);
    }

    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| truncate(r, 300));
    let now = Utc::now().naive_utc();

    let tx = conn.transaction().map_err(anyhow::Error::from)?;

    // Schedule can be gone if an admin deleted it; the booking still flips.
    if queries::get_schedule(&tx, booking.schedule_id)?.is_some()
        && !queries::restock_seats(&tx, booking.schedule_id, booking.seats)?
    {
        tracing::error!(
            schedule_id = booking.schedule_id,
            seats = booking.seats,
            "restock would exceed capacity, refusing"
        );
        return Err(ApiError::Database(anyhow::anyhow!(
            "restock exceeds capacity for schedule {}",
            booking.schedule_id
        )));
    }

    queries::mark_booking_cancelled(&tx, booking_id, &now, reason.as_deref())?;
    tx.commit().map_err(anyhow::Error::from)?;

    Ok(CancelOutcome::Cancelled)
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db;
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

    fn seed_user(state: &AppState) -> i64 {
        let conn = state.db.lock().unwrap();
        queries::create_user(&conn, "rider@example.com", "+385911111111", "x", false).unwrap()
    }

    fn request(
        schedule_id: i64,
        seats: i64,
        token: &str,
        labels: Option<Vec<&str>>,
    ) -> CreateBookingRequest {
        CreateBookingRequest {
            schedule_id: Some(schedule_id),
            seats: Some(seats),
            payment_token: Some(token.to_string()),
            seat_numbers: labels.map(|ls| ls.into_iter().map(String::from).collect()),
        }
    }

    fn available(state: &AppState, schedule_id: i64) -> i64 {
        let conn = state.db.lock().unwrap();
        queries::get_schedule(&conn, schedule_id)
            .unwrap()
            .unwrap()
            .seats_available
    }

    #[test]
    fn test_create_decrements_and_stores_labels() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 40);
        let token = state.payments.issue(user, 100.0);

        let receipt =
            create_booking(&state, user, request(sid, 2, &token, Some(vec!["1a", " 1b "])))
                .unwrap();

        assert_eq!(available(&state, sid), 38);
        assert_eq!(receipt.proof.seat_numbers, vec!["1A", "1B"]);

        let conn = state.db.lock().unwrap();
        assert_eq!(
            inventory::reserved_labels(&conn, sid).unwrap(),
            vec!["1A", "1B"]
        );
    }

    #[test]
    fn test_seat_conflict_reports_sorted_labels_and_keeps_capacity() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 40);

        let t1 = state.payments.issue(user, 100.0);
        create_booking(&state, user, request(sid, 2, &t1, Some(vec!["1A", "1B"]))).unwrap();

        let t2 = state.payments.issue(user, 100.0);
        let err = create_booking(&state, user, request(sid, 2, &t2, Some(vec!["2B", "1A"])))
            .unwrap_err();

        match err {
            ApiError::SeatConflict(labels) => assert_eq!(labels, vec!["1A"]),
            other => panic!("expected SeatConflict, got {other:?}"),
        }
        assert_eq!(available(&state, sid), 38, "no partial decrement");
    }

    #[test]
    fn test_insufficient_capacity_no_partial_decrement() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 3);
        let token = state.payments.issue(user, 100.0);

        let err = create_booking(&state, user, request(sid, 5, &token, None)).unwrap_err();
        assert!(matches!(err, ApiError::InsufficientCapacity));
        assert_eq!(available(&state, sid), 3);
    }

    #[test]
    fn test_failed_booking_releases_payment_token() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 3);
        let token = state.payments.issue(user, 100.0);

        // Fails on capacity after the token was consumed.
        assert!(create_booking(&state, user, request(sid, 5, &token, None)).is_err());
        // The token must still work for a corrected request.
        create_booking(&state, user, request(sid, 2, &token, None)).unwrap();
    }

    #[test]
    fn test_payment_token_single_use_across_bookings() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 10);
        let token = state.payments.issue(user, 100.0);

        create_booking(&state, user, request(sid, 1, &token, None)).unwrap();
        let err = create_booking(&state, user, request(sid, 1, &token, None)).unwrap_err();
        assert!(matches!(err, ApiError::PaymentInvalid));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 10);
        let token = state.payments.issue(user, 100.0);

        let err = create_booking(&state, user, request(sid, 2, &token, Some(vec!["1A", "1a"])))
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateSeatSelection));
    }

    #[test]
    fn test_label_count_must_match_seats() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 10);
        let token = state.payments.issue(user, 100.0);

        let err = create_booking(&state, user, request(sid, 3, &token, Some(vec!["1A", "1B"])))
            .unwrap_err();
        assert!(matches!(err, ApiError::SeatCountMismatch));
    }

    #[test]
    fn test_blank_labels_degrade_to_unlabeled() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 10);
        let token = state.payments.issue(user, 100.0);

        create_booking(&state, user, request(sid, 3, &token, Some(vec!["  ", ""]))).unwrap();

        let conn = state.db.lock().unwrap();
        assert!(inventory::reserved_labels(&conn, sid).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_schedule_is_not_found() {
        let state = test_state();
        let user = seed_user(&state);
        let token = state.payments.issue(user, 100.0);

        let err = create_booking(&state, user, request(999, 1, &token, None)).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_cancel_restocks_and_is_idempotent() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 40);
        let token = state.payments.issue(user, 100.0);

        let receipt =
            create_booking(&state, user, request(sid, 2, &token, Some(vec!["1A", "1B"])))
                .unwrap();
        assert_eq!(available(&state, sid), 38);

        let outcome = cancel_booking(&state, user, receipt.booking_id, Some("change of plans"))
            .unwrap();
        assert_eq!(outcome, CancelOutcome::Cancelled);
        assert_eq!(available(&state, sid), 40);

        // Second cancel is a no-op success, no double restock.
        let outcome = cancel_booking(&state, user, receipt.booking_id, None).unwrap();
        assert_eq!(outcome, CancelOutcome::AlreadyCancelled);
        assert_eq!(available(&state, sid), 40);

        // Labels stay on the row for audit but leave the derived view.
        let conn = state.db.lock().unwrap();
        let booking = queries::get_booking(&conn, receipt.booking_id).unwrap().unwrap();
        assert_eq!(booking.seat_numbers, Some(vec!["1A".into(), "1B".into()]));
        assert!(inventory::reserved_labels(&conn, sid).unwrap().is_empty());
    }

    #[test]
    fn test_cancel_foreign_booking_reads_as_not_found() {
        let state = test_state();
        let owner = seed_user(&state);
        let other = {
            let conn = state.db.lock().unwrap();
            queries::create_user(&conn, "other@example.com", "+385922222222", "x", false).unwrap()
        };
        let sid = seed_schedule(&state, 10);
        let token = state.payments.issue(owner, 50.0);
        let receipt = create_booking(&state, owner, request(sid, 1, &token, None)).unwrap();

        let err = cancel_booking(&state, other, receipt.booking_id, None).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_capacity_conservation_invariant() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 40);

        for seats in [2, 3, 1] {
            let token = state.payments.issue(user, 10.0);
            create_booking(&state, user, request(sid, seats, &token, None)).unwrap();
        }

        let conn = state.db.lock().unwrap();
        let schedule = queries::get_schedule(&conn, sid).unwrap().unwrap();
        let held = queries::active_seat_total(&conn, sid).unwrap();
        assert_eq!(schedule.seats_available + held, schedule.capacity);
    }

    #[test]
    fn test_cancel_reason_truncated_to_300() {
        let state = test_state();
        let user = seed_user(&state);
        let sid = seed_schedule(&state, 10);
        let token = state.payments.issue(user, 10.0);
        let receipt = create_booking(&state, user, request(sid, 1, &token, None)).unwrap();

        let long = "x".repeat(400);
        cancel_booking(&state, user, receipt.booking_id, Some(&long)).unwrap();

        let conn = state.db.lock().unwrap();
        let booking = queries::get_booking(&conn, receipt.booking_id).unwrap().unwrap();
        assert_eq!(booking.cancel_reason.unwrap().chars().count(), 300);
    }
}
