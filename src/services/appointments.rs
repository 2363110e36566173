//! Appointment write path.
//!
//! Every write runs in a `BEGIN IMMEDIATE` transaction and re-checks
//! conflicts against live rows right before it commits. The overlap triggers
//! installed by the migrations back that check up at the database level, so
//! two racing writers cannot both commit an overlapping booking.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rusqlite::{Connection, TransactionBehavior};

use super::{
    conflict, exceptions, require_business, require_employee, require_service, require_supported_date, schedule,
};
use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{
    Appointment, AppointmentStatus, BookingSource, Business, CreateAppointment, Customer,
    CustomerData, Employee, Interval, Reschedule, ServiceTiming, SimpleAppointment,
};

/// Books a service for a customer (resolved or created from
/// `customer_data`). Customer self-bookings must also fit working hours.
pub fn create(
    conn: &mut Connection,
    business_id: &str,
    input: &CreateAppointment,
) -> Result<Appointment, AppError> {
    let start = requested_start(input.start_time)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let business = require_business(&tx, business_id)?;
    let service = require_service(&tx, business_id, &input.service_id)?;
    if !service.is_active {
        return Err(AppError::Validation(format!("service {} is not bookable", service.id)));
    }
    let employee = require_employee(&tx, business_id, &input.employee_id)?;
    let timing = service.timing();
    let status = initial_status(&business, input)?;

    if input.source == BookingSource::Customer {
        ensure_within_working_hours(&tx, &business, &employee, &timing, start)?;
    }

    let interval = timing.occupied_interval(start);
    ensure_no_conflict(&tx, business_id, &employee.id, &interval, None)?;

    let customer_id = resolve_customer(
        &tx,
        business_id,
        input.customer_id.as_deref(),
        input.customer_data.as_ref(),
    )?;

    let now = queries::now();
    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        employee_id: employee.id,
        service_id: service.id,
        customer_id,
        start_time: interval.start,
        end_time: interval.end,
        status,
        notes: input.notes.clone(),
        created_at: now,
        updated_at: now,
    };
    insert(&tx, &appointment)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment.id,
        employee_id = %appointment.employee_id,
        start = %appointment.start_time,
        end = %appointment.end_time,
        status = appointment.status.as_str(),
        "appointment created"
    );
    Ok(appointment)
}

/// Staff booking for an existing customer, always confirmed.
pub fn create_simple(conn: &mut Connection, input: &SimpleAppointment) -> Result<Appointment, AppError> {
    let start = requested_start(input.start_time)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    require_business(&tx, &input.business_id)?;
    let service = require_service(&tx, &input.business_id, &input.service_id)?;
    if !service.is_active {
        return Err(AppError::Validation(format!("service {} is not bookable", service.id)));
    }
    let employee = require_employee(&tx, &input.business_id, &input.employee_id)?;
    let customer_id = resolve_customer(&tx, &input.business_id, Some(&input.customer_id), None)?;

    let interval = service.timing().occupied_interval(start);
    ensure_no_conflict(&tx, &input.business_id, &employee.id, &interval, None)?;

    let now = queries::now();
    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        business_id: input.business_id.clone(),
        employee_id: employee.id,
        service_id: service.id,
        customer_id,
        start_time: interval.start,
        end_time: interval.end,
        status: AppointmentStatus::Confirmed,
        notes: input.notes.clone(),
        created_at: now,
        updated_at: now,
    };
    insert(&tx, &appointment)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment.id,
        employee_id = %appointment.employee_id,
        start = %appointment.start_time,
        end = %appointment.end_time,
        "appointment created"
    );
    Ok(appointment)
}

pub fn confirm(conn: &mut Connection, id: &str) -> Result<Appointment, AppError> {
    transition(conn, id, AppointmentStatus::Confirmed)
}

pub fn cancel(conn: &mut Connection, id: &str) -> Result<Appointment, AppError> {
    transition(conn, id, AppointmentStatus::Cancelled)
}

pub fn complete(conn: &mut Connection, id: &str) -> Result<Appointment, AppError> {
    transition(conn, id, AppointmentStatus::Completed)
}

pub fn mark_no_show(conn: &mut Connection, id: &str) -> Result<Appointment, AppError> {
    transition(conn, id, AppointmentStatus::NoShow)
}

fn transition(conn: &mut Connection, id: &str, next: AppointmentStatus) -> Result<Appointment, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = require_appointment(&tx, id)?;
    if !current.status.can_transition_to(next) {
        return Err(AppError::Validation(format!(
            "cannot change appointment from {} to {}",
            current.status.as_str(),
            next.as_str()
        )));
    }

    match queries::update_appointment_status(&tx, id, next) {
        Ok(_) => {}
        Err(e) if db::is_overlap_violation(&e) => return Err(AppError::SchedulingConflict),
        Err(e) => return Err(e.into()),
    }
    let updated = require_appointment(&tx, id)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %id,
        from = current.status.as_str(),
        to = next.as_str(),
        "appointment status changed"
    );
    Ok(updated)
}

/// Moves an active appointment to a new start time and/or employee. The
/// conflict check skips the appointment itself.
pub fn reschedule(conn: &mut Connection, id: &str, input: &Reschedule) -> Result<Appointment, AppError> {
    if input.start_time.is_none() && input.employee_id.is_none() {
        return Err(AppError::Validation("nothing to reschedule".to_string()));
    }
    let start = input.start_time.map(requested_start).transpose()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = require_appointment(&tx, id)?;
    if !current.status.is_active() {
        return Err(AppError::Validation(format!(
            "a {} appointment cannot be rescheduled",
            current.status.as_str()
        )));
    }

    let employee_id = match &input.employee_id {
        Some(employee_id) => require_employee(&tx, &current.business_id, employee_id)?.id,
        None => current.employee_id.clone(),
    };
    let interval = match start {
        Some(start) => require_service(&tx, &current.business_id, &current.service_id)?
            .timing()
            .occupied_interval(start),
        None => current.interval(),
    };

    ensure_no_conflict(&tx, &current.business_id, &employee_id, &interval, Some(id))?;

    match queries::update_appointment_schedule(&tx, id, &employee_id, &interval.start, &interval.end) {
        Ok(_) => {}
        Err(e) if db::is_overlap_violation(&e) => return Err(AppError::SchedulingConflict),
        Err(e) => return Err(e.into()),
    }
    let updated = require_appointment(&tx, id)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %id,
        employee_id = %updated.employee_id,
        start = %updated.start_time,
        end = %updated.end_time,
        "appointment rescheduled"
    );
    Ok(updated)
}

pub fn get(conn: &Connection, id: &str) -> Result<Appointment, AppError> {
    require_appointment(conn, id)
}

pub fn list(
    conn: &Connection,
    business_id: &str,
    date: Option<NaiveDate>,
    employee_id: Option<&str>,
) -> Result<Vec<Appointment>, AppError> {
    if let Some(date) = date {
        require_supported_date(date)?;
    }
    require_business(conn, business_id)?;
    let range = date.map(|d| {
        let day = schedule::day_bounds(d);
        (day.start, day.end)
    });
    Ok(queries::list_appointments(conn, business_id, range, employee_id)?)
}

/// Requested start times are kept to whole minutes, matching what the store
/// holds.
fn requested_start(start: NaiveDateTime) -> Result<NaiveDateTime, AppError> {
    require_supported_date(start.date())?;
    Ok(start
        .with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(start))
}

fn require_appointment(conn: &Connection, id: &str) -> Result<Appointment, AppError> {
    queries::get_appointment(conn, id)?.ok_or_else(|| AppError::NotFound(format!("appointment {id}")))
}

fn initial_status(business: &Business, input: &CreateAppointment) -> Result<AppointmentStatus, AppError> {
    match input.status {
        Some(status) if status.is_active() => Ok(status),
        Some(status) => Err(AppError::Validation(format!(
            "cannot create an appointment as {}",
            status.as_str()
        ))),
        None => Ok(match input.source {
            BookingSource::Staff => AppointmentStatus::Confirmed,
            BookingSource::Customer if business.auto_accept => AppointmentStatus::Confirmed,
            BookingSource::Customer => AppointmentStatus::Pending,
        }),
    }
}

fn ensure_within_working_hours(
    conn: &Connection,
    business: &Business,
    employee: &Employee,
    timing: &ServiceTiming,
    start: NaiveDateTime,
) -> Result<(), AppError> {
    let date = start.date();
    let check = exceptions::is_available(conn, &employee.id, date)?;
    let blocks = if check.available {
        schedule::resolve_working_blocks(
            date,
            &business.business_hours,
            employee.working_hours.as_ref(),
            check.exception.as_ref(),
        )
    } else {
        Vec::new()
    };

    if !schedule::fits_working_blocks(&blocks, timing, start) {
        tracing::info!(
            employee_id = %employee.id,
            start = %start,
            "requested time outside working hours"
        );
        return Err(AppError::OutsideWorkingHours);
    }
    Ok(())
}

fn ensure_no_conflict(
    conn: &Connection,
    business_id: &str,
    employee_id: &str,
    interval: &Interval,
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    require_supported_date(interval.start.date())?;
    require_supported_date(interval.end.date())?;

    let active = queries::list_active_appointments(conn, business_id, employee_id, &interval.start, &interval.end)?;
    if let Some(existing) = conflict::find_conflict(interval, &active, exclude_id) {
        tracing::info!(
            employee_id = %employee_id,
            start = %interval.start,
            end = %interval.end,
            conflicting_id = %existing.id,
            "scheduling conflict"
        );
        return Err(AppError::SchedulingConflict);
    }
    Ok(())
}

fn insert(conn: &Connection, appointment: &Appointment) -> Result<(), AppError> {
    match queries::create_appointment(conn, appointment) {
        Ok(()) => Ok(()),
        Err(e) if db::is_overlap_violation(&e) => {
            tracing::info!(
                employee_id = %appointment.employee_id,
                start = %appointment.start_time,
                "overlap rejected by database"
            );
            Err(AppError::SchedulingConflict)
        }
        Err(e) => Err(e.into()),
    }
}

/// Existing customer by id, else dedup within the business by email, then
/// phone, else a new customer.
fn resolve_customer(
    conn: &Connection,
    business_id: &str,
    customer_id: Option<&str>,
    data: Option<&CustomerData>,
) -> Result<String, AppError> {
    if let Some(id) = customer_id {
        return queries::get_customer(conn, id)?
            .filter(|c| c.business_id == business_id)
            .map(|c| c.id)
            .ok_or_else(|| AppError::NotFound(format!("customer {id}")));
    }

    let data = data.ok_or_else(|| {
        AppError::Validation("either customerId or customerData is required".to_string())
    })?;
    let email = data.email.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let phone = data.phone.as_deref().map(str::trim).filter(|s| !s.is_empty());

    if let Some(email) = email {
        if let Some(existing) = queries::find_customer_by_email(conn, business_id, email)? {
            return Ok(existing.id);
        }
    }
    if let Some(phone) = phone {
        if let Some(existing) = queries::find_customer_by_phone(conn, business_id, phone)? {
            return Ok(existing.id);
        }
    }

    let name = data.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("customer name is required".to_string()));
    }

    let customer = Customer {
        id: uuid::Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        name: name.to_string(),
        email: email.map(str::to_string),
        phone: phone.map(str::to_string),
    };
    queries::create_customer(conn, &customer)?;
    tracing::info!(customer_id = %customer.id, "customer created");
    Ok(customer.id)
}
