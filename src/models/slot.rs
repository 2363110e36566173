use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::EmployeeRef;

/// Half-open `[start, end)` span of local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// A contiguous span during which an employee can be booked.
pub type WorkingBlock = Interval;

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub employee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_employee_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_employees: Option<Vec<EmployeeRef>>,
}

impl TimeSlot {
    pub fn for_employee(slot: Interval, employee: &EmployeeRef) -> Self {
        Self {
            start_time: slot.start,
            end_time: slot.end,
            employee_id: employee.id.clone(),
            employee_name: Some(employee.name.clone()),
            available: true,
            available_employee_count: None,
            available_employees: None,
        }
    }

    /// One entry standing for every employee free at this start time, with
    /// `default` as the pre-selected choice.
    pub fn merged(slot: Interval, default: &EmployeeRef, employees: Vec<EmployeeRef>) -> Self {
        Self {
            available_employee_count: Some(employees.len()),
            available_employees: Some(employees),
            ..Self::for_employee(slot, default)
        }
    }
}
