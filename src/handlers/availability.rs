use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::TimeSlot;
use crate::services::availability::{self, SlotQuery};
use crate::services::slots;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AvailabilityParams {
    pub service_id: String,
    pub date: NaiveDate,
    pub employee_id: Option<String>,
    /// Display granularity in minutes; generation stays at 15.
    pub interval: Option<u32>,
}

// GET /api/businesses/:business_id/availability
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let query = SlotQuery {
        business_id,
        service_id: params.service_id,
        date: params.date,
        employee_id: params.employee_id.filter(|id| !id.is_empty()),
    };

    let found = {
        let db = state.db()?;
        availability::get_available_slots(&db, state.assignment.as_ref(), &query)?
    };

    let found = match params.interval {
        Some(interval) => slots::coarsen_to_interval(found, interval),
        None => found,
    };
    Ok(Json(found))
}
