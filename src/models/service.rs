use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::Interval;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub buffer_before: i64,
    pub buffer_after: i64,
    pub price_cents: i64,
    pub is_active: bool,
}

impl Service {
    pub fn timing(&self) -> ServiceTiming {
        ServiceTiming {
            duration: self.duration_minutes,
            buffer_before: self.buffer_before,
            buffer_after: self.buffer_after,
        }
    }
}

/// Duration and buffers of a service, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTiming {
    pub duration: i64,
    pub buffer_before: i64,
    pub buffer_after: i64,
}

impl ServiceTiming {
    pub fn new(duration: i64, buffer_before: i64, buffer_after: i64) -> Self {
        Self {
            duration,
            buffer_before,
            buffer_after,
        }
    }

    pub fn total_minutes(&self) -> i64 {
        self.duration + self.buffer_before + self.buffer_after
    }

    /// `[start - bufferBefore, start + duration + bufferAfter)`, saturating at
    /// the ends of the representable range.
    pub fn occupied_interval(&self, start: NaiveDateTime) -> Interval {
        Interval::new(
            start
                .checked_sub_signed(Duration::minutes(self.buffer_before))
                .unwrap_or(NaiveDateTime::MIN),
            plus_minutes(start, self.duration + self.buffer_after),
        )
    }

    pub fn service_interval(&self, start: NaiveDateTime) -> Interval {
        Interval::new(start, plus_minutes(start, self.duration))
    }
}

fn plus_minutes(start: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    start
        .checked_add_signed(Duration::minutes(minutes))
        .unwrap_or(NaiveDateTime::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_occupied_interval_includes_buffers() {
        let timing = ServiceTiming::new(30, 10, 5);
        let occupied = timing.occupied_interval(dt("2025-06-16 10:00"));
        assert_eq!(occupied, Interval::new(dt("2025-06-16 09:50"), dt("2025-06-16 10:35")));
        assert_eq!(timing.total_minutes(), 45);
    }

    #[test]
    fn test_intervals_saturate_instead_of_overflowing() {
        let timing = ServiceTiming::new(30, 10, 5);
        assert_eq!(timing.occupied_interval(NaiveDateTime::MAX).end, NaiveDateTime::MAX);
        assert_eq!(timing.occupied_interval(NaiveDateTime::MIN).start, NaiveDateTime::MIN);
        assert_eq!(timing.service_interval(NaiveDateTime::MAX).end, NaiveDateTime::MAX);
    }
}
