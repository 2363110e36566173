//! Overlap checks between a candidate interval and existing appointments.
//!
//! Both sides must already be buffer-expanded; nothing here adds buffers.

use crate::models::{Appointment, Interval};

/// First active appointment overlapping `candidate`, skipping `exclude_id`.
pub fn find_conflict<'a>(
    candidate: &Interval,
    existing: &'a [Appointment],
    exclude_id: Option<&str>,
) -> Option<&'a Appointment> {
    existing.iter().find(|appointment| {
        appointment.status.is_active()
            && Some(appointment.id.as_str()) != exclude_id
            && candidate.overlaps(&appointment.interval())
    })
}

pub fn has_conflict(candidate: &Interval, existing: &[Appointment]) -> bool {
    find_conflict(candidate, existing, None).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn span(start: &str, end: &str) -> Interval {
        Interval::new(dt(&format!("2025-06-16 {start}")), dt(&format!("2025-06-16 {end}")))
    }

    fn appointment(id: &str, start: &str, end: &str, status: AppointmentStatus) -> Appointment {
        let interval = span(start, end);
        Appointment {
            id: id.to_string(),
            business_id: "biz-1".to_string(),
            employee_id: "emp-1".to_string(),
            service_id: "svc-1".to_string(),
            customer_id: "cust-1".to_string(),
            start_time: interval.start,
            end_time: interval.end,
            status,
            notes: None,
            created_at: interval.start,
            updated_at: interval.start,
        }
    }

    #[test]
    fn test_touching_boundary_is_not_a_conflict() {
        let existing = vec![appointment("a", "10:00", "10:30", AppointmentStatus::Confirmed)];
        assert!(!has_conflict(&span("10:30", "11:00"), &existing));
        assert!(!has_conflict(&span("09:30", "10:00"), &existing));
    }

    #[test]
    fn test_partial_and_full_overlap() {
        let existing = vec![appointment("a", "10:00", "10:30", AppointmentStatus::Pending)];
        assert!(has_conflict(&span("10:15", "10:45"), &existing));
        assert!(has_conflict(&span("09:45", "10:15"), &existing));
        assert!(has_conflict(&span("10:05", "10:10"), &existing));
        assert!(has_conflict(&span("09:00", "12:00"), &existing));
    }

    #[test]
    fn test_inactive_appointments_ignored() {
        let existing = vec![
            appointment("a", "10:00", "11:00", AppointmentStatus::Cancelled),
            appointment("b", "10:00", "11:00", AppointmentStatus::Completed),
            appointment("c", "10:00", "11:00", AppointmentStatus::NoShow),
        ];
        assert!(!has_conflict(&span("10:00", "11:00"), &existing));
    }

    #[test]
    fn test_excluded_id_is_skipped() {
        let existing = vec![
            appointment("self", "10:00", "11:00", AppointmentStatus::Confirmed),
            appointment("other", "12:00", "13:00", AppointmentStatus::Confirmed),
        ];
        assert!(find_conflict(&span("10:30", "11:30"), &existing, Some("self")).is_none());
        let hit = find_conflict(&span("10:30", "12:30"), &existing, Some("self"));
        assert_eq!(hit.map(|a| a.id.as_str()), Some("other"));
    }
}
