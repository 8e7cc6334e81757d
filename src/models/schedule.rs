use serde::{Deserialize, Serialize};

/// A departure on a route. `capacity` is fixed at creation; `seats_available`
/// moves down on booking and back up on cancellation, never outside
/// `0..=capacity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub route_id: i64,
    pub bus_name: String,
    pub departure: String,
    pub capacity: i64,
    pub seats_available: i64,
}
