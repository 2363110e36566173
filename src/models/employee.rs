use serde::{Deserialize, Serialize};

use super::WeeklyHours;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub business_id: String,
    pub name: String,
    /// Per-employee override. When present, business hours are never
    /// consulted for this employee, not even for days the override omits.
    pub working_hours: Option<WeeklyHours>,
    pub is_active: bool,
}

impl Employee {
    pub fn to_ref(&self) -> EmployeeRef {
        EmployeeRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRef {
    pub id: String,
    pub name: String,
}
