use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{AppRating, Booking, BusRoute, Schedule, User};

// ── Users ──

pub fn create_user(
    conn: &Connection,
    email: &str,
    phone: &str,
    password_hash: &str,
    is_admin: bool,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, phone, password_hash, is_admin) VALUES (?1, ?2, ?3, ?4)",
        params![email, phone, password_hash, is_admin as i32],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn user_exists(conn: &Connection, email: &str, phone: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1 OR phone = ?2",
        params![email, phone],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_user_by_login(
    conn: &Connection,
    email: &str,
    phone: &str,
) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, email, phone, password_hash, is_admin FROM users WHERE email = ?1 AND phone = ?2",
        params![email, phone],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, email, phone, password_hash, is_admin FROM users WHERE id = ?1",
        params![id],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        phone: row.get(2)?,
        password_hash: row.get(3)?,
        is_admin: row.get::<_, i32>(4)? != 0,
    })
}

// ── Routes ──

pub fn create_route(
    conn: &Connection,
    name: &str,
    origin: &str,
    destination: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO routes (name, origin, destination) VALUES (?1, ?2, ?3)",
        params![name, origin, destination],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_route(conn: &Connection, id: i64) -> anyhow::Result<Option<BusRoute>> {
    let result = conn
        .query_row(
            "SELECT id, name, origin, destination FROM routes WHERE id = ?1",
            params![id],
            |row| {
                Ok(BusRoute {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    origin: row.get(2)?,
                    destination: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(result)
}

pub fn list_routes(conn: &Connection) -> anyhow::Result<Vec<BusRoute>> {
    let mut stmt = conn.prepare("SELECT id, name, origin, destination FROM routes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(BusRoute {
            id: row.get(0)?,
            name: row.get(1)?,
            origin: row.get(2)?,
            destination: row.get(3)?,
        })
    })?;

    let mut routes = vec![];
    for row in rows {
        routes.push(row?);
    }
    Ok(routes)
}

pub fn update_route(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    origin: Option<&str>,
    destination: Option<&str>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE routes SET
            name = COALESCE(?1, name),
            origin = COALESCE(?2, origin),
            destination = COALESCE(?3, destination)
         WHERE id = ?4",
        params![name, origin, destination, id],
    )?;
    Ok(count > 0)
}

pub fn delete_route(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM routes WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Schedules ──

pub fn create_schedule(
    conn: &Connection,
    route_id: i64,
    bus_name: &str,
    departure: &str,
    capacity: i64,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO schedules (route_id, bus_name, departure, capacity, seats_available)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![route_id, bus_name, departure, capacity],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_schedule(conn: &Connection, id: i64) -> anyhow::Result<Option<Schedule>> {
    let result = conn
        .query_row(
            "SELECT id, route_id, bus_name, departure, capacity, seats_available
             FROM schedules WHERE id = ?1",
            params![id],
            parse_schedule_row,
        )
        .optional()?;
    Ok(result)
}

pub fn list_schedules(conn: &Connection) -> anyhow::Result<Vec<Schedule>> {
    let mut stmt = conn.prepare(
        "SELECT id, route_id, bus_name, departure, capacity, seats_available
         FROM schedules ORDER BY id",
    )?;
    let rows = stmt.query_map([], parse_schedule_row)?;

    let mut schedules = vec![];
    for row in rows {
        schedules.push(row?);
    }
    Ok(schedules)
}

fn parse_schedule_row(row: &rusqlite::Row) -> rusqlite::Result<Schedule> {
    Ok(Schedule {
        id: row.get(0)?,
        route_id: row.get(1)?,
        bus_name: row.get(2)?,
        departure: row.get(3)?,
        capacity: row.get(4)?,
        seats_available: row.get(5)?,
    })
}

/// Admin edit. Supplying `seats_available` re-provisions the bus: both the
/// counter and the recorded capacity move to the new value.
pub fn update_schedule(
    conn: &Connection,
    id: i64,
    route_id: Option<i64>,
    bus_name: Option<&str>,
    departure: Option<&str>,
    seats_available: Option<i64>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE schedules SET
            route_id = COALESCE(?1, route_id),
            bus_name = COALESCE(?2, bus_name),
            departure = COALESCE(?3, departure),
            capacity = COALESCE(?4, capacity),
            seats_available = COALESCE(?4, seats_available)
         WHERE id = ?5",
        params![route_id, bus_name, departure, seats_available, id],
    )?;
    Ok(count > 0)
}

pub fn delete_schedule(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM schedules WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Guarded decrement: refuses to go below zero. The zero-row case means the
/// capacity check was invalidated between read and write.
pub fn decrement_seats(conn: &Connection, schedule_id: i64, n: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE schedules SET seats_available = seats_available - ?1
         WHERE id = ?2 AND seats_available >= ?1",
        params![n, schedule_id],
    )?;
    Ok(count > 0)
}

/// Guarded restock: refuses to exceed the recorded capacity. A zero-row
/// result here means seats were restocked that were never decremented.
pub fn restock_seats(conn: &Connection, schedule_id: i64, n: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE schedules SET seats_available = seats_available + ?1
         WHERE id = ?2 AND seats_available + ?1 <= capacity",
        params![n, schedule_id],
    )?;
    Ok(count > 0)
}

// ── Bookings ──

pub fn insert_booking(
    conn: &Connection,
    user_id: i64,
    schedule_id: i64,
    seats: i64,
    seat_numbers: Option<&[String]>,
    created_at: &NaiveDateTime,
) -> anyhow::Result<i64> {
    let labels_json = match seat_numbers {
        Some(labels) => Some(serde_json::to_string(labels)?),
        None => None,
    };
    let created = created_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO bookings (user_id, schedule_id, seats, seat_numbers, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, schedule_id, seats, labels_json, created],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, user_id, schedule_id, seats, seat_numbers, is_cancelled, cancelled_at, cancel_reason, created_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-cancelled bookings for a schedule, in insertion order. Feeds the
/// derived reserved-seats view.
pub fn active_bookings_for_schedule(
    conn: &Connection,
    schedule_id: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, schedule_id, seats, seat_numbers, is_cancelled, cancelled_at, cancel_reason, created_at
         FROM bookings WHERE schedule_id = ?1 AND is_cancelled = 0 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![schedule_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn bookings_for_user(conn: &Connection, user_id: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, schedule_id, seats, seat_numbers, is_cancelled, cancelled_at, cancel_reason, created_at
         FROM bookings WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn mark_booking_cancelled(
    conn: &Connection,
    id: i64,
    cancelled_at: &NaiveDateTime,
    reason: Option<&str>,
) -> anyhow::Result<bool> {
    let at = cancelled_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let count = conn.execute(
        "UPDATE bookings SET is_cancelled = 1, cancelled_at = ?1, cancel_reason = ?2
         WHERE id = ?3 AND is_cancelled = 0",
        params![at, reason, id],
    )?;
    Ok(count > 0)
}

/// Seats held by non-cancelled bookings; with `seats_available` this checks
/// the capacity-conservation invariant.
pub fn active_seat_total(conn: &Connection, schedule_id: i64) -> anyhow::Result<i64> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(seats), 0) FROM bookings WHERE schedule_id = ?1 AND is_cancelled = 0",
        params![schedule_id],
        |row| row.get(0),
    )?;
    Ok(total)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: i64 = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    let schedule_id: i64 = row.get(2)?;
    let seats: i64 = row.get(3)?;
    let labels_json: Option<String> = row.get(4)?;
    let is_cancelled: i32 = row.get(5)?;
    let cancelled_at_str: Option<String> = row.get(6)?;
    let cancel_reason: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;

    let seat_numbers = match labels_json {
        Some(json) => serde_json::from_str(&json).ok(),
        None => None,
    };
    let cancelled_at = cancelled_at_str
        .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok());
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id,
        user_id,
        schedule_id,
        seats,
        seat_numbers,
        is_cancelled: is_cancelled != 0,
        cancelled_at,
        cancel_reason,
        created_at,
    })
}

// ── Ratings ──

pub fn upsert_rating(
    conn: &Connection,
    user_id: i64,
    schedule_id: i64,
    rating: i64,
    comment: Option<&str>,
    created_at: &NaiveDateTime,
) -> anyhow::Result<()> {
    let created = created_at.format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO ratings (schedule_id, user_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id, schedule_id) DO UPDATE SET
           rating = excluded.rating,
           comment = excluded.comment",
        params![schedule_id, user_id, rating, comment, created],
    )?;
    Ok(())
}

pub fn get_rating_score(
    conn: &Connection,
    user_id: i64,
    schedule_id: i64,
) -> anyhow::Result<Option<i64>> {
    let result = conn
        .query_row(
            "SELECT rating FROM ratings WHERE user_id = ?1 AND schedule_id = ?2",
            params![user_id, schedule_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(result)
}

pub fn count_ratings_for_schedule(conn: &Connection, schedule_id: i64) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM ratings WHERE schedule_id = ?1",
        params![schedule_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── App ratings ──

pub fn insert_app_rating(
    conn: &Connection,
    user_id: Option<i64>,
    rating: i64,
    comment: Option<&str>,
    platform: &str,
    created_at: &NaiveDateTime,
) -> anyhow::Result<i64> {
    let created = created_at.format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO app_ratings (user_id, rating, comment, platform, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, rating, comment, platform, created],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_app_ratings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<AppRating>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, rating, comment, platform, created_at
         FROM app_ratings ORDER BY id DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        let created_at_str: String = row.get(5)?;
        Ok(AppRating {
            id: row.get(0)?,
            user_id: row.get(1)?,
            rating: row.get(2)?,
            comment: row.get(3)?,
            platform: row.get(4)?,
            created_at: NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
                .unwrap_or_else(|_| Utc::now().naive_utc()),
        })
    })?;

    let mut ratings = vec![];
    for row in rows {
        ratings.push(row?);
    }
    Ok(ratings)
}
