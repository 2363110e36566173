use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use super::check_auth;
use crate::errors::AppError;
use crate::models::{Appointment, BookingSource, CreateAppointment, Reschedule, SimpleAppointment};
use crate::services::appointments;
use crate::state::AppState;

// POST /api/public/businesses/:business_id/bookings
pub async fn public_booking(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
    Json(mut input): Json<CreateAppointment>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    // Customers identify themselves by contact details only and never pick a status.
    input.source = BookingSource::Customer;
    input.status = None;
    input.customer_id = None;

    let mut db = state.db()?;
    let appointment = appointments::create(&mut db, &business_id, &input)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

// POST /api/businesses/:business_id/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<CreateAppointment>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let mut db = state.db()?;
    let appointment = appointments::create(&mut db, &business_id, &input)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

// POST /api/appointments
pub async fn create_simple(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<SimpleAppointment>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let mut db = state.db()?;
    let appointment = appointments::create_simple(&mut db, &input)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub date: Option<NaiveDate>,
    pub employee_id: Option<String>,
}

// GET /api/businesses/:business_id/appointments
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    let found = appointments::list(&db, &business_id, params.date, params.employee_id.as_deref())?;
    Ok(Json(found))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Appointment>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    Ok(Json(appointments::get(&db, &id)?))
}

type Transition = fn(&mut rusqlite::Connection, &str) -> Result<Appointment, AppError>;

fn apply(state: &AppState, headers: &HeaderMap, id: &str, transition: Transition) -> Result<Json<Appointment>, AppError> {
    check_auth(headers, &state.config.admin_token)?;

    let mut db = state.db()?;
    Ok(Json(transition(&mut db, id)?))
}

// POST /api/appointments/:id/confirm
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Appointment>, AppError> {
    apply(&state, &headers, &id, appointments::confirm)
}

// POST /api/appointments/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Appointment>, AppError> {
    apply(&state, &headers, &id, appointments::cancel)
}

// POST /api/appointments/:id/complete
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Appointment>, AppError> {
    apply(&state, &headers, &id, appointments::complete)
}

// POST /api/appointments/:id/no-show
pub async fn no_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Appointment>, AppError> {
    apply(&state, &headers, &id, appointments::mark_no_show)
}

// POST /api/appointments/:id/reschedule
pub async fn reschedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Reschedule>,
) -> Result<Json<Appointment>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let mut db = state.db()?;
    Ok(Json(appointments::reschedule(&mut db, &id, &input)?))
}
