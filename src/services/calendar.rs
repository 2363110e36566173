//! Staff calendar day view.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use super::{conflict, exceptions, require_business, require_employee, require_supported_date, schedule};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, Business, Employee, EmployeeRef, ScheduleException, ServiceTiming, WorkingBlock};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDay {
    pub employee: EmployeeRef,
    pub working_blocks: Vec<WorkingBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ScheduleException>,
    /// Every appointment touching the day, cancelled ones included.
    pub appointments: Vec<Appointment>,
}

impl EmployeeDay {
    /// Whether a service starting at `start` could be booked: it is placed
    /// the way the slot generator places candidates, and its buffer-expanded
    /// interval is clear of active appointments.
    pub fn is_slot_bookable(&self, timing: &ServiceTiming, start: NaiveDateTime) -> bool {
        schedule::fits_working_blocks(&self.working_blocks, timing, start)
            && !conflict::has_conflict(&timing.occupied_interval(start), &self.appointments)
    }
}

pub fn calendar_day(
    conn: &Connection,
    business_id: &str,
    date: NaiveDate,
    employee_id: Option<&str>,
) -> Result<Vec<EmployeeDay>, AppError> {
    require_supported_date(date)?;
    let business = require_business(conn, business_id)?;
    let employees = match employee_id {
        Some(id) => vec![require_employee(conn, business_id, id)?],
        None => queries::list_active_employees(conn, business_id)?,
    };

    employees
        .iter()
        .map(|employee| employee_day(conn, &business, employee, date))
        .collect()
}

fn employee_day(
    conn: &Connection,
    business: &Business,
    employee: &Employee,
    date: NaiveDate,
) -> Result<EmployeeDay, AppError> {
    let check = exceptions::is_available(conn, &employee.id, date)?;
    let working_blocks = schedule::resolve_working_blocks(
        date,
        &business.business_hours,
        employee.working_hours.as_ref(),
        check.exception.as_ref(),
    );
    let day = schedule::day_bounds(date);
    let appointments =
        queries::list_appointments(conn, &business.id, Some((day.start, day.end)), Some(&employee.id))?;

    Ok(EmployeeDay {
        employee: employee.to_ref(),
        working_blocks,
        exception: check.exception,
        appointments,
    })
}
