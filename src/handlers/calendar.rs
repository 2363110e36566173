use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use super::check_auth;
use crate::errors::AppError;
use crate::services::calendar::{self, EmployeeDay};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CalendarParams {
    pub date: NaiveDate,
    pub employee_id: Option<String>,
}

// GET /api/businesses/:business_id/calendar
pub async fn calendar_day(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<CalendarParams>,
) -> Result<Json<Vec<EmployeeDay>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    let days = calendar::calendar_day(&db, &business_id, params.date, params.employee_id.as_deref())?;
    Ok(Json(days))
}
