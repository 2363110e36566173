pub mod appointments;
pub mod availability;
pub mod calendar;
pub mod conflict;
pub mod exceptions;
pub mod fairness;
pub mod schedule;
pub mod slots;

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Business, Employee, Service};

pub(crate) fn require_business(conn: &Connection, business_id: &str) -> Result<Business, AppError> {
    queries::get_business(conn, business_id)?
        .ok_or_else(|| AppError::NotFound(format!("business {business_id}")))
}

/// Stored timestamps compare as `%Y-%m-%d` text, which only orders
/// correctly for four-digit years.
pub(crate) fn require_supported_date(date: NaiveDate) -> Result<(), AppError> {
    if (1..=9999).contains(&date.year()) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("date {date} is out of the supported range")))
    }
}

/// The service must exist within the business. Inactive services are
/// returned as-is; callers decide how to treat them.
pub(crate) fn require_service(
    conn: &Connection,
    business_id: &str,
    service_id: &str,
) -> Result<Service, AppError> {
    queries::get_service(conn, service_id)?
        .filter(|s| s.business_id == business_id)
        .ok_or_else(|| AppError::NotFound(format!("service {service_id}")))
}

pub(crate) fn require_employee(
    conn: &Connection,
    business_id: &str,
    employee_id: &str,
) -> Result<Employee, AppError> {
    queries::get_employee(conn, employee_id)?
        .filter(|e| e.business_id == business_id && e.is_active)
        .ok_or_else(|| AppError::NotFound(format!("employee {employee_id}")))
}
