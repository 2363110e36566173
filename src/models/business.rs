use serde::{Deserialize, Serialize};

use super::WeeklyHours;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    pub name: String,
    pub business_hours: WeeklyHours,
    /// Customer self-bookings are confirmed immediately instead of pending.
    pub auto_accept: bool,
}
