use std::collections::BTreeMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("missing {0} time")]
    MissingTime(&'static str),

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("opening time {open} is not before closing time {close}")]
    EmptyRange { open: String, close: String },

    #[error("lunch break must lie within opening hours and start before it ends")]
    LunchOutOfRange,

    #[error("unknown weekday: {0}")]
    UnknownWeekday(String),
}

/// Opening hours for one weekday, as stored.
///
/// Both `open`/`close` and `start`/`end` spellings are accepted, as are
/// camelCase and snake_case lunch keys. Values stay as written so that a
/// malformed entry can be detected (and treated as closed) when resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    #[serde(default, alias = "start")]
    pub open: Option<String>,
    #[serde(default, alias = "end")]
    pub close: Option<String>,
    #[serde(default, alias = "has_lunch_break")]
    pub has_lunch_break: bool,
    #[serde(default, alias = "lunch_start", skip_serializing_if = "Option::is_none")]
    pub lunch_start: Option<String>,
    #[serde(default, alias = "lunch_end", skip_serializing_if = "Option::is_none")]
    pub lunch_end: Option<String>,
}

/// A validated day, in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub open: u32,
    pub close: u32,
    pub lunch: Option<(u32, u32)>,
}

impl DayHours {
    pub fn new(open: &str, close: &str) -> Self {
        Self {
            open: Some(open.to_string()),
            close: Some(close.to_string()),
            ..Self::default()
        }
    }

    pub fn with_lunch(mut self, start: &str, end: &str) -> Self {
        self.has_lunch_break = true;
        self.lunch_start = Some(start.to_string());
        self.lunch_end = Some(end.to_string());
        self
    }

    pub fn window(&self) -> Result<DayWindow, ConfigurationError> {
        let open_raw = self
            .open
            .as_deref()
            .ok_or(ConfigurationError::MissingTime("opening"))?;
        let close_raw = self
            .close
            .as_deref()
            .ok_or(ConfigurationError::MissingTime("closing"))?;
        let open = minutes_of(open_raw)?;
        let close = minutes_of(close_raw)?;
        if open >= close {
            return Err(ConfigurationError::EmptyRange {
                open: open_raw.to_string(),
                close: close_raw.to_string(),
            });
        }

        if !self.has_lunch_break {
            return Ok(DayWindow {
                open,
                close,
                lunch: None,
            });
        }

        let lunch_start = minutes_of(
            self.lunch_start
                .as_deref()
                .ok_or(ConfigurationError::MissingTime("lunch start"))?,
        )?;
        let lunch_end = minutes_of(
            self.lunch_end
                .as_deref()
                .ok_or(ConfigurationError::MissingTime("lunch end"))?,
        )?;
        if lunch_start < open || lunch_start >= lunch_end || lunch_end > close {
            return Err(ConfigurationError::LunchOutOfRange);
        }

        Ok(DayWindow {
            open,
            close,
            lunch: Some((lunch_start, lunch_end)),
        })
    }
}

/// Weekday-keyed opening hours. A weekday with no entry is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Option<DayHours>>",
    into = "BTreeMap<String, Option<DayHours>>"
)]
pub struct WeeklyHours {
    days: [Option<DayHours>; 7],
}

impl WeeklyHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: WeeklyHours = serde_json::from_str(s)?;
        Ok(hours)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_day(mut self, weekday: Weekday, hours: DayHours) -> Self {
        self.days[weekday.num_days_from_monday() as usize] = Some(hours);
        self
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DayHours> {
        self.days[weekday.num_days_from_monday() as usize].as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Option::is_none)
    }

    /// Strict check used when hours are written, so bad data is refused
    /// up front instead of silently closing a day later.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for day in self.days.iter().flatten() {
            day.window()?;
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, Option<DayHours>>> for WeeklyHours {
    type Error = ConfigurationError;

    fn try_from(map: BTreeMap<String, Option<DayHours>>) -> Result<Self, Self::Error> {
        let mut hours = WeeklyHours::default();
        for (key, day) in map {
            let weekday =
                parse_weekday(&key).ok_or_else(|| ConfigurationError::UnknownWeekday(key))?;
            hours.days[weekday.num_days_from_monday() as usize] = day;
        }
        Ok(hours)
    }
}

impl From<WeeklyHours> for BTreeMap<String, Option<DayHours>> {
    fn from(hours: WeeklyHours) -> Self {
        WEEK.iter()
            .zip(hours.days)
            .filter_map(|(weekday, day)| day.map(|d| (weekday_name(*weekday).to_string(), Some(d))))
            .collect()
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

pub fn parse_weekday(s: &str) -> Option<Weekday> {
    let lower = s.trim().to_lowercase();
    WEEK.iter().copied().find(|weekday| {
        let name = weekday_name(*weekday);
        lower == name || lower == name[..3]
    })
}

/// Parses `HH:MM` (or `H:MM`, `HH:MM:SS`) into minutes since midnight.
/// `24:00` is accepted as the end of the day.
pub fn parse_hhmm(s: &str) -> Option<u32> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let field = |p: &str, min_len: usize| -> Option<u32> {
        if p.len() < min_len || p.len() > 2 || !p.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        p.parse().ok()
    };
    let hour = field(parts[0], 1)?;
    let minute = field(parts[1], 2)?;
    let second = match parts.get(2) {
        Some(p) => field(p, 2)?,
        None => 0,
    };
    if minute > 59 || second > 59 {
        return None;
    }
    match hour {
        0..=23 => Some(hour * 60 + minute),
        24 if minute == 0 && second == 0 => Some(MINUTES_PER_DAY),
        _ => None,
    }
}

fn minutes_of(s: &str) -> Result<u32, ConfigurationError> {
    parse_hhmm(s).ok_or_else(|| ConfigurationError::InvalidTime(s.to_string()))
}
