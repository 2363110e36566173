//! Working-hours resolution shared by availability, booking and calendar views.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::hours::{parse_hhmm, weekday_name, DayWindow};
use crate::models::{ExceptionType, Interval, ScheduleException, ServiceTiming, WeeklyHours, WorkingBlock};

/// Open working blocks for one employee on `date`, in local wall-clock time.
///
/// Precedence: a schedule exception wins outright; otherwise the employee's
/// override is used if the employee has one (a day it omits is a day off,
/// business hours are not consulted); otherwise business hours apply.
/// Malformed hours resolve to no blocks.
pub fn resolve_working_blocks(
    date: NaiveDate,
    business_hours: &WeeklyHours,
    employee_hours: Option<&WeeklyHours>,
    exception: Option<&ScheduleException>,
) -> Vec<WorkingBlock> {
    if let Some(exception) = exception {
        return match exception.exception_type {
            ExceptionType::ModifiedHours => modified_hours_block(date, exception),
            ExceptionType::Unavailable | ExceptionType::Holiday => Vec::new(),
        };
    }

    let weekday = date.weekday();
    let day = match employee_hours {
        Some(hours) => hours.day(weekday),
        None => business_hours.day(weekday),
    };
    let Some(day) = day else {
        return Vec::new();
    };

    match day.window() {
        Ok(window) => window_blocks(date, &window),
        Err(e) => {
            tracing::warn!(
                %date,
                weekday = weekday_name(weekday),
                error = %e,
                "malformed working hours, treating day as closed"
            );
            Vec::new()
        }
    }
}

// Lunch breaks are not carved out of modified hours.
fn modified_hours_block(date: NaiveDate, exception: &ScheduleException) -> Vec<WorkingBlock> {
    let start = exception.start_time.as_deref().and_then(parse_hhmm);
    let end = exception.end_time.as_deref().and_then(parse_hhmm);
    match (start, end) {
        (Some(start), Some(end)) if start < end => vec![block(date, start, end)],
        _ => {
            tracing::warn!(
                %date,
                exception_id = %exception.id,
                "modified hours exception without a valid time range, treating day as closed"
            );
            Vec::new()
        }
    }
}

fn window_blocks(date: NaiveDate, window: &DayWindow) -> Vec<WorkingBlock> {
    let spans = match window.lunch {
        None => vec![(window.open, window.close)],
        Some((lunch_start, lunch_end)) => vec![(window.open, lunch_start), (lunch_end, window.close)],
    };
    // A lunch break touching opening or closing time leaves an empty span.
    spans
        .into_iter()
        .filter(|(start, end)| start < end)
        .map(|(start, end)| block(date, start, end))
        .collect()
}

fn block(date: NaiveDate, start_minute: u32, end_minute: u32) -> WorkingBlock {
    Interval::new(at_minute(date, start_minute), at_minute(date, end_minute))
}

pub fn at_minute(date: NaiveDate, minute: u32) -> NaiveDateTime {
    let midnight = date.and_time(NaiveTime::MIN);
    midnight
        .checked_add_signed(Duration::minutes(i64::from(minute)))
        .unwrap_or(NaiveDateTime::MAX)
}

/// `[00:00, next day 00:00)` of `date`. Saturates at the end of the
/// representable range.
pub fn day_bounds(date: NaiveDate) -> Interval {
    let start = date.and_time(NaiveTime::MIN);
    let end = start
        .checked_add_signed(Duration::days(1))
        .unwrap_or(NaiveDateTime::MAX);
    Interval::new(start, end)
}

/// Same placement rule the slot generator applies: the requested start lies
/// in a block and start plus the whole buffered duration ends inside it.
pub fn fits_working_blocks(blocks: &[WorkingBlock], timing: &ServiceTiming, start: NaiveDateTime) -> bool {
    let Some(end) = start.checked_add_signed(Duration::minutes(timing.total_minutes())) else {
        return false;
    };
    blocks.iter().any(|b| start >= b.start && end <= b.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayHours;
    use chrono::Weekday;

    // 2025-06-16 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 17).unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn weekdays_9_to_5() -> WeeklyHours {
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .into_iter()
            .fold(WeeklyHours::default(), |h, d| h.with_day(d, DayHours::new("09:00", "17:00")))
    }

    fn exception(kind: ExceptionType, start: Option<&str>, end: Option<&str>) -> ScheduleException {
        ScheduleException {
            id: "ex-1".to_string(),
            employee_id: "emp-1".to_string(),
            date: monday(),
            exception_type: kind,
            reason: None,
            start_time: start.map(str::to_string),
            end_time: end.map(str::to_string),
        }
    }

    #[test]
    fn test_business_hours_single_block() {
        let blocks = resolve_working_blocks(monday(), &weekdays_9_to_5(), None, None);
        assert_eq!(blocks, vec![Interval::new(dt("2025-06-16 09:00"), dt("2025-06-16 17:00"))]);
    }

    #[test]
    fn test_closed_day_has_no_blocks() {
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert!(resolve_working_blocks(sunday, &weekdays_9_to_5(), None, None).is_empty());
    }

    #[test]
    fn test_lunch_split() {
        let hours = WeeklyHours::default().with_day(
            Weekday::Mon,
            DayHours::new("09:00", "18:00").with_lunch("12:00", "13:00"),
        );
        let blocks = resolve_working_blocks(monday(), &hours, None, None);
        assert_eq!(
            blocks,
            vec![
                Interval::new(dt("2025-06-16 09:00"), dt("2025-06-16 12:00")),
                Interval::new(dt("2025-06-16 13:00"), dt("2025-06-16 18:00")),
            ]
        );
    }

    #[test]
    fn test_override_replaces_business_hours() {
        let own = WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("12:00", "20:00"));
        let blocks = resolve_working_blocks(monday(), &weekdays_9_to_5(), Some(&own), None);
        assert_eq!(blocks, vec![Interval::new(dt("2025-06-16 12:00"), dt("2025-06-16 20:00"))]);
    }

    #[test]
    fn test_override_missing_day_does_not_fall_back() {
        let own = WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("09:00", "17:00"));
        assert!(resolve_working_blocks(tuesday(), &weekdays_9_to_5(), Some(&own), None).is_empty());
    }

    #[test]
    fn test_inverted_hours_fail_closed() {
        let hours = WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("17:00", "09:00"));
        assert!(resolve_working_blocks(monday(), &hours, None, None).is_empty());

        let same = WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("09:00", "09:00"));
        assert!(resolve_working_blocks(monday(), &same, None, None).is_empty());
    }

    #[test]
    fn test_missing_or_garbage_times_fail_closed() {
        let missing = WeeklyHours::default().with_day(
            Weekday::Mon,
            DayHours {
                open: Some("09:00".to_string()),
                ..DayHours::default()
            },
        );
        assert!(resolve_working_blocks(monday(), &missing, None, None).is_empty());

        let garbage = WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("9am", "5pm"));
        assert!(resolve_working_blocks(monday(), &garbage, None, None).is_empty());
    }

    #[test]
    fn test_numeric_not_string_comparison() {
        // "9:30" sorts after "10:00" as a string
        let hours = WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("9:30", "10:00"));
        assert_eq!(
            resolve_working_blocks(monday(), &hours, None, None),
            vec![Interval::new(dt("2025-06-16 09:30"), dt("2025-06-16 10:00"))]
        );
    }

    #[test]
    fn test_unavailable_and_holiday_void_the_day() {
        for kind in [ExceptionType::Unavailable, ExceptionType::Holiday] {
            let ex = exception(kind, None, None);
            assert!(resolve_working_blocks(monday(), &weekdays_9_to_5(), None, Some(&ex)).is_empty());
        }
    }

    #[test]
    fn test_modified_hours_takes_precedence_without_lunch() {
        let hours = WeeklyHours::default().with_day(
            Weekday::Mon,
            DayHours::new("09:00", "18:00").with_lunch("12:00", "13:00"),
        );
        let ex = exception(ExceptionType::ModifiedHours, Some("10:00"), Some("15:00"));
        let blocks = resolve_working_blocks(monday(), &hours, None, Some(&ex));
        assert_eq!(blocks, vec![Interval::new(dt("2025-06-16 10:00"), dt("2025-06-16 15:00"))]);
    }

    #[test]
    fn test_modified_hours_apply_on_a_closed_day() {
        let own = WeeklyHours::default().with_day(Weekday::Tue, DayHours::new("09:00", "17:00"));
        let ex = exception(ExceptionType::ModifiedHours, Some("08:00"), Some("12:00"));
        assert_eq!(resolve_working_blocks(monday(), &WeeklyHours::default(), Some(&own), Some(&ex)).len(), 1);
    }

    #[test]
    fn test_modified_hours_invalid_range_fails_closed() {
        let ex = exception(ExceptionType::ModifiedHours, Some("15:00"), Some("10:00"));
        assert!(resolve_working_blocks(monday(), &weekdays_9_to_5(), None, Some(&ex)).is_empty());

        let ex = exception(ExceptionType::ModifiedHours, None, Some("10:00"));
        assert!(resolve_working_blocks(monday(), &weekdays_9_to_5(), None, Some(&ex)).is_empty());
    }

    #[test]
    fn test_close_at_midnight() {
        let hours = WeeklyHours::default().with_day(Weekday::Mon, DayHours::new("18:00", "24:00"));
        let blocks = resolve_working_blocks(monday(), &hours, None, None);
        assert_eq!(blocks, vec![Interval::new(dt("2025-06-16 18:00"), dt("2025-06-17 00:00"))]);
    }

    #[test]
    fn test_fits_working_blocks() {
        let blocks = vec![Interval::new(dt("2025-06-16 09:00"), dt("2025-06-16 10:00"))];
        let timing = ServiceTiming::new(45, 0, 5);
        assert!(fits_working_blocks(&blocks, &timing, dt("2025-06-16 09:00")));
        assert!(!fits_working_blocks(&blocks, &timing, dt("2025-06-16 09:15")));
        assert!(!fits_working_blocks(&blocks, &timing, dt("2025-06-16 08:45")));
    }

    #[test]
    fn test_lunch_at_opening_leaves_no_empty_block() {
        let hours = WeeklyHours::default().with_day(
            Weekday::Mon,
            DayHours::new("09:00", "18:00").with_lunch("09:00", "10:00"),
        );
        let blocks = resolve_working_blocks(monday(), &hours, None, None);
        assert_eq!(blocks, vec![Interval::new(dt("2025-06-16 10:00"), dt("2025-06-16 18:00"))]);

        let hours = WeeklyHours::default().with_day(
            Weekday::Mon,
            DayHours::new("09:00", "18:00").with_lunch("17:00", "18:00"),
        );
        let blocks = resolve_working_blocks(monday(), &hours, None, None);
        assert_eq!(blocks, vec![Interval::new(dt("2025-06-16 09:00"), dt("2025-06-16 17:00"))]);
    }

    #[test]
    fn test_bounds_saturate_at_end_of_range() {
        let day = day_bounds(NaiveDate::MAX);
        assert_eq!(day.start, NaiveDate::MAX.and_time(NaiveTime::MIN));
        assert_eq!(day.end, NaiveDateTime::MAX);
        assert_eq!(at_minute(NaiveDate::MAX, 24 * 60), NaiveDateTime::MAX);

        let blocks = vec![day];
        assert!(!fits_working_blocks(&blocks, &ServiceTiming::new(30, 0, 0), NaiveDateTime::MAX));
    }
}
