use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRoute {
    pub id: i64,
    pub name: String,
    pub origin: String,
    pub destination: String,
}
