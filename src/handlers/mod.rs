pub mod appointments;
pub mod availability;
pub mod calendar;
pub mod exceptions;
pub mod health;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::errors::AppError;
use crate::state::AppState;

/// Staff endpoints expect `Authorization: Bearer <ADMIN_TOKEN>`.
fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/businesses/:business_id/availability",
            get(availability::get_availability),
        )
        .route(
            "/api/public/businesses/:business_id/bookings",
            post(appointments::public_booking),
        )
        .route(
            "/api/businesses/:business_id/appointments",
            post(appointments::create_appointment).get(appointments::list_appointments),
        )
        .route("/api/appointments", post(appointments::create_simple))
        .route("/api/appointments/:id", get(appointments::get_appointment))
        .route("/api/appointments/:id/confirm", post(appointments::confirm))
        .route("/api/appointments/:id/cancel", post(appointments::cancel))
        .route("/api/appointments/:id/complete", post(appointments::complete))
        .route("/api/appointments/:id/no-show", post(appointments::no_show))
        .route(
            "/api/appointments/:id/reschedule",
            post(appointments::reschedule),
        )
        .route(
            "/api/employees/:employee_id/exceptions",
            post(exceptions::create_exception).get(exceptions::list_exceptions),
        )
        .route("/api/exceptions/:id", delete(exceptions::delete_exception))
        .route(
            "/api/businesses/:business_id/calendar",
            get(calendar::calendar_day),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_check_auth() {
        assert!(check_auth(&headers("Bearer secret"), "secret").is_ok());
        assert!(check_auth(&headers("Bearer nope"), "secret").is_err());
        assert!(check_auth(&headers("secret"), "secret").is_err());
        assert!(check_auth(&HeaderMap::new(), "secret").is_err());
        assert!(check_auth(&headers("Bearer "), "").is_err());
    }
}
