use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionType {
    Unavailable,
    ModifiedHours,
    /// Reported separately, but blocks the day exactly like `Unavailable`.
    Holiday,
}

impl ExceptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionType::Unavailable => "unavailable",
            ExceptionType::ModifiedHours => "modified_hours",
            ExceptionType::Holiday => "holiday",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unavailable" => Some(ExceptionType::Unavailable),
            "modified_hours" => Some(ExceptionType::ModifiedHours),
            "holiday" => Some(ExceptionType::Holiday),
            _ => None,
        }
    }

    pub fn blocks_day(&self) -> bool {
        matches!(self, ExceptionType::Unavailable | ExceptionType::Holiday)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleException {
    pub id: String,
    pub employee_id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub exception_type: ExceptionType,
    pub reason: Option<String>,
    /// `HH:MM`, only meaningful for `modified_hours`.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewException {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub exception_type: ExceptionType,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionCheck {
    pub available: bool,
    pub exception: Option<ScheduleException>,
}
