use rusqlite::Connection;

use crate::db::queries;

/// Uppercase and trim seat labels, dropping entries that are blank after
/// trimming.
pub fn normalize_labels(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// The set of seat labels currently held on a schedule, derived fresh from
/// the non-cancelled bookings on every call: labels are concatenated in
/// booking order and de-duplicated keeping the first occurrence. Labels on
/// cancelled bookings drop out because the scan filters them.
pub fn reserved_labels(conn: &Connection, schedule_id: i64) -> anyhow::Result<Vec<String>> {
    let bookings = queries::active_bookings_for_schedule(conn, schedule_id)?;

    let mut seen = std::collections::HashSet::new();
    let mut out = vec![];
    for booking in &bookings {
        let Some(labels) = &booking.seat_numbers else {
            continue;
        };
        for label in labels {
            let label = label.to_uppercase();
            if seen.insert(label.clone()) {
                out.push(label);
            }
        }
    }
    Ok(out)
}
