//! Per-employee, per-date schedule exceptions.

use chrono::NaiveDate;
use rusqlite::Connection;

use super::require_supported_date;
use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::hours::parse_hhmm;
use crate::models::{ExceptionCheck, ExceptionType, NewException, ScheduleException};

pub fn is_available(
    conn: &Connection,
    employee_id: &str,
    date: NaiveDate,
) -> Result<ExceptionCheck, AppError> {
    let exception = queries::get_exception_for_date(conn, employee_id, date)?;
    let available = !exception
        .as_ref()
        .is_some_and(|e| e.exception_type.blocks_day());
    Ok(ExceptionCheck {
        available,
        exception,
    })
}

/// At most one exception may exist per employee and date.
pub fn create_exception(
    conn: &Connection,
    employee_id: &str,
    input: &NewException,
) -> Result<ScheduleException, AppError> {
    require_supported_date(input.date)?;
    if queries::get_employee(conn, employee_id)?.is_none() {
        return Err(AppError::NotFound(format!("employee {employee_id}")));
    }

    let (start_time, end_time) = match input.exception_type {
        ExceptionType::ModifiedHours => {
            let start = input.start_time.as_deref().and_then(parse_hhmm);
            let end = input.end_time.as_deref().and_then(parse_hhmm);
            match (start, end) {
                (Some(s), Some(e)) if s < e => (input.start_time.clone(), input.end_time.clone()),
                _ => {
                    return Err(AppError::Validation(
                        "modified_hours requires startTime before endTime (HH:MM)".to_string(),
                    ))
                }
            }
        }
        ExceptionType::Unavailable | ExceptionType::Holiday => (None, None),
    };

    let date_label = input.date.format(db::DATE_FORMAT).to_string();
    if queries::get_exception_for_date(conn, employee_id, input.date)?.is_some() {
        return Err(AppError::ExceptionConflict(date_label));
    }

    let exception = ScheduleException {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: employee_id.to_string(),
        date: input.date,
        exception_type: input.exception_type,
        reason: input.reason.clone(),
        start_time,
        end_time,
    };

    match queries::create_exception(conn, &exception) {
        Ok(()) => {}
        Err(e) if db::is_unique_violation(&e) => return Err(AppError::ExceptionConflict(date_label)),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        employee_id = %employee_id,
        date = %date_label,
        kind = exception.exception_type.as_str(),
        "schedule exception created"
    );
    Ok(exception)
}

pub fn list_exceptions(
    conn: &Connection,
    employee_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<ScheduleException>, AppError> {
    for date in [from, to].into_iter().flatten() {
        require_supported_date(date)?;
    }
    Ok(queries::list_exceptions(conn, employee_id, from, to)?)
}

pub fn delete_exception(conn: &Connection, id: &str) -> Result<(), AppError> {
    if !queries::delete_exception(conn, id)? {
        return Err(AppError::NotFound(format!("exception {id}")));
    }
    tracing::info!(exception_id = %id, "schedule exception deleted");
    Ok(())
}
