use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{DATETIME_FORMAT, DATE_FORMAT};
use crate::models::{
    Appointment, AppointmentStatus, Business, Customer, Employee, ExceptionType,
    ScheduleException, Service, WeeklyHours,
};

// ── Businesses ──

pub fn create_business(conn: &Connection, business: &Business) -> anyhow::Result<()> {
    business.business_hours.validate()?;
    conn.execute(
        "INSERT INTO businesses (id, name, business_hours, auto_accept) VALUES (?1, ?2, ?3, ?4)",
        params![
            business.id,
            business.name,
            business.business_hours.to_json()?,
            business.auto_accept as i32,
        ],
    )?;
    Ok(())
}

pub fn get_business(conn: &Connection, id: &str) -> anyhow::Result<Option<Business>> {
    let row = conn
        .query_row(
            "SELECT id, name, business_hours, auto_accept FROM businesses WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i32>(3)? != 0,
                ))
            },
        )
        .optional()?;

    Ok(row.map(|(id, name, hours_json, auto_accept)| {
        let business_hours = match WeeklyHours::from_json(&hours_json) {
            Ok(hours) => hours,
            Err(e) => {
                tracing::warn!(business_id = %id, error = %e, "malformed business hours, treating every day as closed");
                WeeklyHours::default()
            }
        };
        Business {
            id,
            name,
            business_hours,
            auto_accept,
        }
    }))
}

// ── Employees ──

pub fn create_employee(conn: &Connection, employee: &Employee) -> anyhow::Result<()> {
    if let Some(hours) = &employee.working_hours {
        hours.validate()?;
    }
    let working_hours = employee
        .working_hours
        .as_ref()
        .map(WeeklyHours::to_json)
        .transpose()?;
    conn.execute(
        "INSERT INTO employees (id, business_id, name, working_hours, is_active) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            employee.id,
            employee.business_id,
            employee.name,
            working_hours,
            employee.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn assign_service(conn: &Connection, employee_id: &str, service_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO employee_services (employee_id, service_id) VALUES (?1, ?2)",
        params![employee_id, service_id],
    )?;
    Ok(())
}

pub fn get_employee(conn: &Connection, id: &str) -> anyhow::Result<Option<Employee>> {
    let result = conn.query_row(
        "SELECT id, business_id, name, working_hours, is_active FROM employees WHERE id = ?1",
        params![id],
        |row| Ok(parse_employee_row(row)),
    );

    match result {
        Ok(employee) => Ok(Some(employee?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_active_employees(conn: &Connection, business_id: &str) -> anyhow::Result<Vec<Employee>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, name, working_hours, is_active
         FROM employees WHERE business_id = ?1 AND is_active = 1 ORDER BY name ASC, id ASC",
    )?;

    let rows = stmt.query_map(params![business_id], |row| Ok(parse_employee_row(row)))?;

    let mut employees = vec![];
    for row in rows {
        employees.push(row??);
    }
    Ok(employees)
}

/// Active employees offering the service. An employee with no service links
/// at all offers every service of the business.
pub fn list_service_employees(
    conn: &Connection,
    business_id: &str,
    service_id: &str,
) -> anyhow::Result<Vec<Employee>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.business_id, e.name, e.working_hours, e.is_active
         FROM employees e
         WHERE e.business_id = ?1 AND e.is_active = 1
           AND (
             EXISTS (SELECT 1 FROM employee_services es WHERE es.employee_id = e.id AND es.service_id = ?2)
             OR NOT EXISTS (SELECT 1 FROM employee_services es WHERE es.employee_id = e.id)
           )
         ORDER BY e.name ASC, e.id ASC",
    )?;

    let rows = stmt.query_map(params![business_id, service_id], |row| {
        Ok(parse_employee_row(row))
    })?;

    let mut employees = vec![];
    for row in rows {
        employees.push(row??);
    }
    Ok(employees)
}

fn parse_employee_row(row: &rusqlite::Row) -> anyhow::Result<Employee> {
    let id: String = row.get(0)?;
    let working_hours_json: Option<String> = row.get(3)?;
    let working_hours = parse_override_hours(&id, working_hours_json.as_deref());

    Ok(Employee {
        id,
        business_id: row.get(1)?,
        name: row.get(2)?,
        working_hours,
        is_active: row.get::<_, i32>(4)? != 0,
    })
}

/// An override with no days defined counts as no override. An unreadable
/// override becomes one with no working days, so the employee fails closed
/// instead of silently inheriting business hours.
fn parse_override_hours(employee_id: &str, json: Option<&str>) -> Option<WeeklyHours> {
    let json = json.map(str::trim).filter(|s| !s.is_empty() && *s != "null")?;
    match WeeklyHours::from_json(json) {
        Ok(hours) if hours.is_empty() => None,
        Ok(hours) => Some(hours),
        Err(e) => {
            tracing::warn!(employee_id = %employee_id, error = %e, "malformed working hours override, employee treated as not working");
            Some(WeeklyHours::default())
        }
    }
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, business_id, name, duration_minutes, buffer_before, buffer_after, price_cents, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            service.id,
            service.business_id,
            service.name,
            service.duration_minutes,
            service.buffer_before,
            service.buffer_after,
            service.price_cents,
            service.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let service = conn
        .query_row(
            "SELECT id, business_id, name, duration_minutes, buffer_before, buffer_after, price_cents, is_active
             FROM services WHERE id = ?1",
            params![id],
            |row| {
                Ok(Service {
                    id: row.get(0)?,
                    business_id: row.get(1)?,
                    name: row.get(2)?,
                    duration_minutes: row.get(3)?,
                    buffer_before: row.get(4)?,
                    buffer_after: row.get(5)?,
                    price_cents: row.get(6)?,
                    is_active: row.get::<_, i32>(7)? != 0,
                })
            },
        )
        .optional()?;
    Ok(service)
}

// ── Customers ──

pub fn create_customer(conn: &Connection, customer: &Customer) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO customers (id, business_id, name, email, phone) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            customer.id,
            customer.business_id,
            customer.name,
            customer.email,
            customer.phone,
        ],
    )?;
    Ok(())
}

pub fn get_customer(conn: &Connection, id: &str) -> anyhow::Result<Option<Customer>> {
    find_customer(conn, "SELECT id, business_id, name, email, phone FROM customers WHERE id = ?1", &[id])
}

pub fn find_customer_by_email(
    conn: &Connection,
    business_id: &str,
    email: &str,
) -> anyhow::Result<Option<Customer>> {
    find_customer(
        conn,
        "SELECT id, business_id, name, email, phone FROM customers
         WHERE business_id = ?1 AND lower(email) = lower(?2) ORDER BY created_at ASC LIMIT 1",
        &[business_id, email],
    )
}

pub fn find_customer_by_phone(
    conn: &Connection,
    business_id: &str,
    phone: &str,
) -> anyhow::Result<Option<Customer>> {
    find_customer(
        conn,
        "SELECT id, business_id, name, email, phone FROM customers
         WHERE business_id = ?1 AND phone = ?2 ORDER BY created_at ASC LIMIT 1",
        &[business_id, phone],
    )
}

fn find_customer(conn: &Connection, sql: &str, args: &[&str]) -> anyhow::Result<Option<Customer>> {
    let customer = conn
        .query_row(sql, rusqlite::params_from_iter(args.iter()), |row| {
            Ok(Customer {
                id: row.get(0)?,
                business_id: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
            })
        })
        .optional()?;
    Ok(customer)
}

// ── Schedule Exceptions ──

pub fn create_exception(conn: &Connection, exception: &ScheduleException) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO schedule_exceptions (id, employee_id, date, type, reason, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            exception.id,
            exception.employee_id,
            exception.date.format(DATE_FORMAT).to_string(),
            exception.exception_type.as_str(),
            exception.reason,
            exception.start_time,
            exception.end_time,
        ],
    )?;
    Ok(())
}

pub fn get_exception_for_date(
    conn: &Connection,
    employee_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Option<ScheduleException>> {
    let result = conn.query_row(
        "SELECT id, employee_id, date, type, reason, start_time, end_time
         FROM schedule_exceptions WHERE employee_id = ?1 AND date = ?2",
        params![employee_id, date.format(DATE_FORMAT).to_string()],
        |row| Ok(parse_exception_row(row)),
    );

    match result {
        Ok(exception) => Ok(Some(exception?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_exceptions(
    conn: &Connection,
    employee_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> anyhow::Result<Vec<ScheduleException>> {
    let from = from.map(|d| d.format(DATE_FORMAT).to_string());
    let to = to.map(|d| d.format(DATE_FORMAT).to_string());

    let mut stmt = conn.prepare(
        "SELECT id, employee_id, date, type, reason, start_time, end_time
         FROM schedule_exceptions
         WHERE employee_id = ?1
           AND (?2 IS NULL OR date >= ?2)
           AND (?3 IS NULL OR date <= ?3)
         ORDER BY date ASC",
    )?;

    let rows = stmt.query_map(params![employee_id, from, to], |row| {
        Ok(parse_exception_row(row))
    })?;

    let mut exceptions = vec![];
    for row in rows {
        exceptions.push(row??);
    }
    Ok(exceptions)
}

pub fn delete_exception(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM schedule_exceptions WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_exception_row(row: &rusqlite::Row) -> anyhow::Result<ScheduleException> {
    let date_str: String = row.get(2)?;
    let type_str: String = row.get(3)?;

    Ok(ScheduleException {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)?,
        exception_type: ExceptionType::parse(&type_str)
            .ok_or_else(|| anyhow::anyhow!("unknown exception type: {type_str}"))?,
        reason: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
    })
}

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, business_id, employee_id, service_id, customer_id, start_time, end_time, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appointment.id,
            appointment.business_id,
            appointment.employee_id,
            appointment.service_id,
            appointment.customer_id,
            fmt_datetime(&appointment.start_time),
            fmt_datetime(&appointment.end_time),
            appointment.status.as_str(),
            appointment.notes,
            fmt_datetime(&appointment.created_at),
            fmt_datetime(&appointment.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        "SELECT id, business_id, employee_id, service_id, customer_id, start_time, end_time, status, notes, created_at, updated_at
         FROM appointments WHERE id = ?1",
        params![id],
        |row| Ok(parse_appointment_row(row)),
    );

    match result {
        Ok(appointment) => Ok(Some(appointment?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Pending and confirmed appointments of one employee whose stored
/// (buffer-expanded) interval overlaps `[from, to)`.
pub fn list_active_appointments(
    conn: &Connection,
    business_id: &str,
    employee_id: &str,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, employee_id, service_id, customer_id, start_time, end_time, status, notes, created_at, updated_at
         FROM appointments
         WHERE business_id = ?1 AND employee_id = ?2
           AND status IN ('pending', 'confirmed')
           AND start_time < ?4 AND end_time > ?3
         ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(
        params![business_id, employee_id, fmt_datetime(from), fmt_datetime(to)],
        |row| Ok(parse_appointment_row(row)),
    )?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// Appointments of any status, optionally limited to those overlapping a
/// range and to one employee.
pub fn list_appointments(
    conn: &Connection,
    business_id: &str,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
    employee_id: Option<&str>,
) -> anyhow::Result<Vec<Appointment>> {
    let mut sql = "SELECT id, business_id, employee_id, service_id, customer_id, start_time, end_time, status, notes, created_at, updated_at \
                   FROM appointments WHERE business_id = ?1"
        .to_string();
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(business_id.to_string())];

    if let Some((from, to)) = range {
        params_vec.push(Box::new(fmt_datetime(&to)));
        sql.push_str(&format!(" AND start_time < ?{}", params_vec.len()));
        params_vec.push(Box::new(fmt_datetime(&from)));
        sql.push_str(&format!(" AND end_time > ?{}", params_vec.len()));
    }
    if let Some(employee_id) = employee_id {
        params_vec.push(Box::new(employee_id.to_string()));
        sql.push_str(&format!(" AND employee_id = ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY start_time ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_datetime(&now()), id],
    )?;
    Ok(count > 0)
}

pub fn update_appointment_schedule(
    conn: &Connection,
    id: &str,
    employee_id: &str,
    start_time: &NaiveDateTime,
    end_time: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET employee_id = ?1, start_time = ?2, end_time = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            employee_id,
            fmt_datetime(start_time),
            fmt_datetime(end_time),
            fmt_datetime(&now()),
            id,
        ],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let start_str: String = row.get(5)?;
    let end_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    Ok(Appointment {
        id: row.get(0)?,
        business_id: row.get(1)?,
        employee_id: row.get(2)?,
        service_id: row.get(3)?,
        customer_id: row.get(4)?,
        start_time: NaiveDateTime::parse_from_str(&start_str, DATETIME_FORMAT)?,
        end_time: NaiveDateTime::parse_from_str(&end_str, DATETIME_FORMAT)?,
        status: AppointmentStatus::parse(&status_str)
            .ok_or_else(|| anyhow::anyhow!("unknown appointment status: {status_str}"))?,
        notes: row.get(8)?,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FORMAT)
            .unwrap_or_else(|_| now()),
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FORMAT)
            .unwrap_or_else(|_| now()),
    })
}

fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::db;
    use crate::errors::AppError;
    use crate::models::{ConfigurationError, DayHours};

    fn inverted() -> WeeklyHours {
        WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("17:00", "09:00"))
    }

    fn business(hours: WeeklyHours) -> Business {
        Business {
            id: "biz".to_string(),
            name: "Biz".to_string(),
            business_hours: hours,
            auto_accept: false,
        }
    }

    #[test]
    fn test_inverted_business_hours_refused() {
        let conn = db::init_db(":memory:").unwrap();
        let err = create_business(&conn, &business(inverted())).unwrap_err();
        assert!(matches!(
            AppError::from(err),
            AppError::Configuration(ConfigurationError::EmptyRange { .. })
        ));
        assert!(get_business(&conn, "biz").unwrap().is_none());
    }

    #[test]
    fn test_inverted_employee_hours_refused() {
        let conn = db::init_db(":memory:").unwrap();
        create_business(&conn, &business(WeeklyHours::default())).unwrap();

        let mut employee = Employee {
            id: "ana".to_string(),
            business_id: "biz".to_string(),
            name: "Ana".to_string(),
            working_hours: Some(inverted()),
            is_active: true,
        };
        let err = create_employee(&conn, &employee).unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Configuration(_)));

        employee.working_hours = None;
        create_employee(&conn, &employee).unwrap();
    }

    #[test]
    fn test_lunch_outside_hours_refused() {
        let conn = db::init_db(":memory:").unwrap();
        let day = DayHours::new("09:00", "17:00").with_lunch("08:00", "10:00");
        let hours = WeeklyHours::default().with_day(Weekday::Tue, day);

        let err = create_business(&conn, &business(hours)).unwrap_err();
        assert!(matches!(
            AppError::from(err),
            AppError::Configuration(ConfigurationError::LunchOutOfRange)
        ));
    }
}
