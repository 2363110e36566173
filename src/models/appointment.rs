use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{CustomerData, Interval};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub business_id: String,
    pub employee_id: String,
    pub service_id: String,
    pub customer_id: String,
    /// Buffer-expanded: requested time minus the service's buffer before.
    pub start_time: NaiveDateTime,
    /// Buffer-expanded: requested time plus duration plus buffer after.
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "completed" => Some(AppointmentStatus::Completed),
            "no_show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    /// Active appointments hold their interval and take part in conflict checks.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending | Confirmed, Cancelled)
                | (Pending | Confirmed, Completed)
                | (Pending | Confirmed, NoShow)
        )
    }
}

/// Who initiated a booking; decides the default status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    #[default]
    Staff,
    Customer,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointment {
    pub service_id: String,
    pub employee_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_data: Option<CustomerData>,
    /// Requested service start, before buffer expansion.
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub source: BookingSource,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleAppointment {
    pub business_id: String,
    pub service_id: String,
    pub employee_id: String,
    pub customer_id: String,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reschedule {
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub employee_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
            AppointmentStatus::NoShow,
        ] {
            assert_eq!(AppointmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AppointmentStatus::parse("archived"), None);
    }

    #[test]
    fn test_terminal_statuses_do_not_transition() {
        use AppointmentStatus::*;
        for terminal in [Cancelled, Completed, NoShow] {
            for next in [Pending, Confirmed, Cancelled, Completed, NoShow] {
                assert!(!terminal.can_transition_to(next));
            }
        }
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_create_appointment_defaults() {
        let json = r#"{"serviceId":"s1","employeeId":"e1","customerId":"c1","startTime":"2025-06-16T10:00:00"}"#;
        let input: CreateAppointment = serde_json::from_str(json).unwrap();
        assert_eq!(input.source, BookingSource::Staff);
        assert!(input.status.is_none());
        assert!(input.customer_data.is_none());
    }
}
