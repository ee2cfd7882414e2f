use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AppointmentDetail, Doctor};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/doctors
pub async fn get_doctors(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Doctor>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let doctors = {
        let db = state.db.lock().unwrap();
        queries::list_doctors(&db).map_err(|e| AppError::Database(e.to_string()))?
    };
    Ok(Json(doctors))
}

// GET /api/appointments
pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<AppointmentDetail>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let appointments = {
        let db = state.db.lock().unwrap();
        queries::list_appointments(&db).map_err(|e| AppError::Database(e.to_string()))?
    };
    Ok(Json(appointments))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<AppointmentDetail>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let appointment = {
        let db = state.db.lock().unwrap();
        queries::get_appointment(&db, id).map_err(|e| AppError::Database(e.to_string()))?
    };
    appointment
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))
}
