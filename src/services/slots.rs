//! Candidate start-time enumeration inside working blocks.

use chrono::{Duration, Timelike};

use super::conflict;
use crate::models::{Appointment, Interval, ServiceTiming, TimeSlot, WorkingBlock};

/// Generation granularity. Fixed for every service; display coarsening is
/// applied afterwards with [`coarsen_to_interval`].
pub const SLOT_STEP_MINUTES: i64 = 15;

/// Free service intervals (`[start, start + duration)`) within `blocks`.
///
/// Each block is walked separately from its start in `step_minutes`
/// increments. A candidate is kept when its buffer-expanded interval does not
/// overlap any existing appointment.
pub fn generate_slots(
    blocks: &[WorkingBlock],
    existing: &[Appointment],
    timing: &ServiceTiming,
    step_minutes: i64,
) -> Vec<Interval> {
    if step_minutes <= 0 || timing.duration <= 0 {
        return Vec::new();
    }

    let total = Duration::minutes(timing.total_minutes());
    let step = Duration::minutes(step_minutes);
    let mut slots = Vec::new();

    for block in blocks {
        let mut candidate = block.start;
        while let Some(end) = candidate.checked_add_signed(total) {
            if end > block.end {
                break;
            }
            let occupied = timing.occupied_interval(candidate);
            if !conflict::has_conflict(&occupied, existing) {
                slots.push(timing.service_interval(candidate));
            }
            match candidate.checked_add_signed(step) {
                Some(next) => candidate = next,
                None => break,
            }
        }
    }

    slots
}

/// Presentation filter: keeps slots whose start minute-of-day is a multiple
/// of `interval_minutes`.
pub fn coarsen_to_interval(slots: Vec<TimeSlot>, interval_minutes: u32) -> Vec<TimeSlot> {
    if i64::from(interval_minutes) <= SLOT_STEP_MINUTES {
        return slots;
    }
    slots
        .into_iter()
        .filter(|slot| {
            let minute_of_day = slot.start_time.hour() * 60 + slot.start_time.minute();
            minute_of_day % interval_minutes == 0
        })
        .collect()
}
