use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use super::check_auth;
use crate::errors::AppError;
use crate::models::{NewException, ScheduleException};
use crate::services::exceptions;
use crate::state::AppState;

// POST /api/employees/:employee_id/exceptions
pub async fn create_exception(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<NewException>,
) -> Result<(StatusCode, Json<ScheduleException>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    let exception = exceptions::create_exception(&db, &employee_id, &input)?;
    Ok((StatusCode::CREATED, Json(exception)))
}

#[derive(Deserialize)]
pub struct ExceptionRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// GET /api/employees/:employee_id/exceptions
pub async fn list_exceptions(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
    headers: HeaderMap,
    Query(range): Query<ExceptionRange>,
) -> Result<Json<Vec<ScheduleException>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    let found = exceptions::list_exceptions(&db, &employee_id, range.from, range.to)?;
    Ok(Json(found))
}

// DELETE /api/exceptions/:id
pub async fn delete_exception(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    exceptions::delete_exception(&db, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
