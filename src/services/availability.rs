//! Bookable slots for a business, service and date, across one or many
//! employees.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Deserialize;

use super::fairness::{AssignmentStrategy, Candidate};
use super::{
    exceptions, require_business, require_employee, require_service, require_supported_date, schedule, slots,
};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Business, Employee, EmployeeRef, Interval, ServiceTiming, TimeSlot};

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub business_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub employee_id: Option<String>,
}

/// Free slots of a single employee plus how busy that employee already is.
#[derive(Debug, Clone)]
pub struct EmployeeSlots {
    pub employee: EmployeeRef,
    pub slots: Vec<Interval>,
    pub appointments_today: usize,
}

/// Ascending by start time. With an explicit employee every slot belongs to
/// that employee; otherwise each start time appears once, merged over every
/// free employee, with a default picked by `strategy`.
pub fn get_available_slots(
    conn: &Connection,
    strategy: &dyn AssignmentStrategy,
    query: &SlotQuery,
) -> Result<Vec<TimeSlot>, AppError> {
    require_supported_date(query.date)?;
    let business = require_business(conn, &query.business_id)?;
    let service = require_service(conn, &business.id, &query.service_id)?;
    if !service.is_active {
        tracing::debug!(service_id = %service.id, "service inactive, no availability");
        return Ok(Vec::new());
    }
    let timing = service.timing();

    if let Some(employee_id) = &query.employee_id {
        let employee = require_employee(conn, &business.id, employee_id)?;
        let found = employee_slots(conn, &business, &employee, &timing, query.date)?;
        return Ok(found
            .slots
            .into_iter()
            .map(|slot| TimeSlot::for_employee(slot, &found.employee))
            .collect());
    }

    let employees = queries::list_service_employees(conn, &business.id, &service.id)?;
    let mut per_employee = Vec::with_capacity(employees.len());
    for employee in &employees {
        per_employee.push(employee_slots(conn, &business, employee, &timing, query.date)?);
    }

    Ok(merge_slots(per_employee, strategy))
}

pub fn employee_slots(
    conn: &Connection,
    business: &Business,
    employee: &Employee,
    timing: &ServiceTiming,
    date: NaiveDate,
) -> Result<EmployeeSlots, AppError> {
    let _span = tracing::debug_span!("employee_slots", employee_id = %employee.id, %date).entered();

    let mut found = EmployeeSlots {
        employee: employee.to_ref(),
        slots: Vec::new(),
        appointments_today: 0,
    };

    let check = exceptions::is_available(conn, &employee.id, date)?;
    if !check.available {
        tracing::debug!("employee has a blocking exception");
        return Ok(found);
    }

    let blocks = schedule::resolve_working_blocks(
        date,
        &business.business_hours,
        employee.working_hours.as_ref(),
        check.exception.as_ref(),
    );

    // Candidates may reach back before midnight by the buffer before.
    let day = schedule::day_bounds(date);
    let from = day
        .start
        .checked_sub_signed(Duration::minutes(timing.buffer_before.max(0)))
        .unwrap_or(NaiveDateTime::MIN);
    let active = queries::list_active_appointments(conn, &business.id, &employee.id, &from, &day.end)?;

    found.appointments_today = active
        .iter()
        .filter(|a| a.start_time.date() == date)
        .count();
    found.slots = slots::generate_slots(&blocks, &active, timing, slots::SLOT_STEP_MINUTES);
    Ok(found)
}

pub fn merge_slots(per_employee: Vec<EmployeeSlots>, strategy: &dyn AssignmentStrategy) -> Vec<TimeSlot> {
    let mut by_start: BTreeMap<NaiveDateTime, (Interval, Vec<Candidate>)> = BTreeMap::new();

    for found in per_employee {
        for slot in found.slots {
            by_start
                .entry(slot.start)
                .or_insert_with(|| (slot, Vec::new()))
                .1
                .push(Candidate {
                    employee: found.employee.clone(),
                    appointments_today: found.appointments_today,
                });
        }
    }

    by_start
        .into_values()
        .filter_map(|(slot, candidates)| {
            let default = strategy
                .choose(&candidates)
                .or_else(|| candidates.first())?
                .employee
                .clone();
            let employees = candidates.into_iter().map(|c| c.employee).collect();
            Some(TimeSlot::merged(slot, &default, employees))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Appointment, AppointmentStatus, DayHours, ExceptionType, NewException, WeeklyHours,
    };
    use crate::services::fairness::LeastBooked;
    use crate::services::testing::*;
    use chrono::Weekday;

    // 2025-06-16 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2025-06-16 {s}"), "%Y-%m-%d %H:%M").unwrap()
    }

    fn query(employee_id: Option<&str>) -> SlotQuery {
        SlotQuery {
            business_id: "biz".to_string(),
            service_id: "cut".to_string(),
            date: monday(),
            employee_id: employee_id.map(str::to_string),
        }
    }

    fn book(conn: &Connection, employee_id: &str, start: &str, end: &str, status: AppointmentStatus) {
        let now = queries::now();
        queries::create_appointment(
            conn,
            &Appointment {
                id: uuid::Uuid::new_v4().to_string(),
                business_id: "biz".to_string(),
                employee_id: employee_id.to_string(),
                service_id: "cut".to_string(),
                customer_id: "cust".to_string(),
                start_time: dt(start),
                end_time: dt(end),
                status,
                notes: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    /// Business open 09:00-11:00 on weekdays, 60 minute service, no buffers.
    fn setup() -> Connection {
        let conn = setup_db();
        seed_business(&conn, "biz", weekdays("09:00", "11:00"), false);
        seed_service(&conn, "biz", "cut", 60, 0, 0);
        seed_customer(&conn, "biz", "cust");
        conn
    }

    fn starts(slots: &[TimeSlot]) -> Vec<String> {
        slots.iter().map(|s| s.start_time.format("%H:%M").to_string()).collect()
    }

    #[test]
    fn test_single_employee_slots() {
        let conn = setup();
        seed_employee(&conn, "biz", "ana", None);
        book(&conn, "ana", "09:30", "10:00", AppointmentStatus::Confirmed);

        let slots = get_available_slots(&conn, &LeastBooked, &query(Some("ana"))).unwrap();
        assert_eq!(starts(&slots), vec!["10:00"]);
        assert_eq!(slots[0].employee_id, "ana");
        assert_eq!(slots[0].end_time, dt("11:00"));
        assert!(slots[0].available);
        assert!(slots[0].available_employee_count.is_none());
    }

    #[test]
    fn test_cancelled_appointments_do_not_block() {
        let conn = setup();
        seed_employee(&conn, "biz", "ana", None);
        book(&conn, "ana", "09:00", "10:00", AppointmentStatus::Cancelled);

        let slots = get_available_slots(&conn, &LeastBooked, &query(Some("ana"))).unwrap();
        assert_eq!(starts(&slots), vec!["09:00", "09:15", "09:30", "09:45", "10:00"]);
    }

    #[test]
    fn test_merged_slots_one_entry_per_start() {
        let conn = setup();
        seed_employee(&conn, "biz", "ana", None);
        seed_employee(&conn, "biz", "ben", None);
        book(&conn, "ana", "09:00", "10:00", AppointmentStatus::Confirmed);

        let slots = get_available_slots(&conn, &LeastBooked, &query(None)).unwrap();
        assert_eq!(starts(&slots), vec!["09:00", "09:15", "09:30", "09:45", "10:00"]);

        let first = &slots[0];
        assert_eq!(first.available_employee_count, Some(1));
        assert_eq!(first.employee_id, "ben");

        let last = &slots[4];
        assert_eq!(last.available_employee_count, Some(2));
        // ben has no appointments today, ana has one
        assert_eq!(last.employee_id, "ben");
        let ids: Vec<&str> = last
            .available_employees
            .as_ref()
            .unwrap()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["ana", "ben"]);
    }

    #[test]
    fn test_blocking_exception_contributes_no_slots() {
        let conn = setup();
        seed_employee(&conn, "biz", "ana", None);
        seed_employee(&conn, "biz", "ben", None);
        exceptions::create_exception(
            &conn,
            "ben",
            &NewException {
                date: monday(),
                exception_type: ExceptionType::Unavailable,
                reason: None,
                start_time: None,
                end_time: None,
            },
        )
        .unwrap();

        let slots = get_available_slots(&conn, &LeastBooked, &query(None)).unwrap();
        assert!(!slots.is_empty());
        assert!(slots.iter().all(|s| s.available_employee_count == Some(1) && s.employee_id == "ana"));
    }

    #[test]
    fn test_modified_hours_exception_used() {
        let conn = setup();
        seed_employee(&conn, "biz", "ana", None);
        exceptions::create_exception(
            &conn,
            "ana",
            &NewException {
                date: monday(),
                exception_type: ExceptionType::ModifiedHours,
                reason: None,
                start_time: Some("14:00".to_string()),
                end_time: Some("15:00".to_string()),
            },
        )
        .unwrap();

        let slots = get_available_slots(&conn, &LeastBooked, &query(Some("ana"))).unwrap();
        assert_eq!(starts(&slots), vec!["14:00"]);
    }

    #[test]
    fn test_override_without_the_day_yields_nothing() {
        let conn = setup();
        let tuesday_only = WeeklyHours::default().with_day(Weekday::Tue, DayHours::new("09:00", "17:00"));
        seed_employee(&conn, "biz", "ana", Some(tuesday_only));

        let slots = get_available_slots(&conn, &LeastBooked, &query(Some("ana"))).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_service_links_limit_candidates() {
        let conn = setup();
        seed_service(&conn, "biz", "color", 60, 0, 0);
        seed_employee(&conn, "biz", "ana", None);
        seed_employee(&conn, "biz", "ben", None);
        queries::assign_service(&conn, "ben", "color").unwrap();

        // ben only offers "color"; ana has no links and offers everything
        let slots = get_available_slots(&conn, &LeastBooked, &query(None)).unwrap();
        assert!(slots.iter().all(|s| s.available_employee_count == Some(1) && s.employee_id == "ana"));
    }

    #[test]
    fn test_unknown_service_and_employee() {
        let conn = setup();
        seed_employee(&conn, "biz", "ana", None);

        let mut q = query(None);
        q.service_id = "missing".to_string();
        assert!(matches!(get_available_slots(&conn, &LeastBooked, &q), Err(AppError::NotFound(_))));

        assert!(matches!(
            get_available_slots(&conn, &LeastBooked, &query(Some("ghost"))),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_out_of_range_date_rejected() {
        let conn = setup();
        seed_employee(&conn, "biz", "ana", None);

        let mut q = query(None);
        q.date = NaiveDate::MAX;
        assert!(matches!(get_available_slots(&conn, &LeastBooked, &q), Err(AppError::Validation(_))));
        q.date = NaiveDate::from_ymd_opt(10_000, 1, 3).unwrap();
        assert!(matches!(get_available_slots(&conn, &LeastBooked, &q), Err(AppError::Validation(_))));

        assert_eq!(get_available_slots(&conn, &LeastBooked, &query(None)).unwrap().len(), 5);
    }

    #[test]
    fn test_buffer_before_sees_previous_day_appointment() {
        let conn = setup_db();
        let hours = WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("00:00", "02:00"));
        seed_business(&conn, "biz", hours, false);
        seed_service(&conn, "biz", "cut", 30, 30, 0);
        seed_customer(&conn, "biz", "cust");
        seed_employee(&conn, "biz", "ana", None);

        let sunday = |t: &str| NaiveDateTime::parse_from_str(&format!("2025-06-15 {t}"), "%Y-%m-%d %H:%M").unwrap();
        let now = queries::now();
        queries::create_appointment(
            &conn,
            &Appointment {
                id: "late".to_string(),
                business_id: "biz".to_string(),
                employee_id: "ana".to_string(),
                service_id: "cut".to_string(),
                customer_id: "cust".to_string(),
                start_time: sunday("23:00"),
                end_time: sunday("23:50"),
                status: AppointmentStatus::Confirmed,
                notes: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();

        let slots = get_available_slots(&conn, &LeastBooked, &query(Some("ana"))).unwrap();
        // 00:00 and 00:15 would need the employee from 23:30 and 23:45
        assert_eq!(starts(&slots)[0], "00:30");
        assert_eq!(slots.len(), 3);
    }
}
