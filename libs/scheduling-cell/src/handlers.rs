// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AppointmentStatus, BookAppointmentRequest, ScheduleError};
use crate::SchedulingState;

// ==============================================================================
// QUERY AND BODY STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct FreeSlotsQuery {
    pub worker_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// HANDLERS
// ==============================================================================

/// Free slots for a worker on a date, as clinic-local ISO-8601 starts.
#[axum::debug_handler]
pub async fn get_free_slots(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let worker_id = query
        .worker_id
        .as_deref()
        .ok_or_else(|| AppError::ValidationError("worker_id is required".to_string()))?;
    let worker_id = Uuid::parse_str(worker_id)
        .map_err(|_| AppError::ValidationError("worker_id must be a UUID".to_string()))?;

    let date = query
        .date
        .as_deref()
        .ok_or_else(|| AppError::ValidationError("date is required".to_string()))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        AppError::ValidationError("Invalid date format, expected YYYY-MM-DD".to_string())
    })?;

    let slots = state
        .availability
        .free_slots(worker_id, date, None)
        .await
        .map_err(map_schedule_error)?;

    let slots: Vec<String> = slots.iter().map(|slot| slot.to_rfc3339()).collect();

    Ok(Json(json!({ "slots": slots })))
}

/// Book an appointment for the authenticated patient.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Caller identity is not a valid patient id".to_string()))?;

    let appointment = state
        .booking
        .create_appointment(request, patient_id)
        .await
        .map_err(map_schedule_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "appointment_id": appointment.id,
            "message": "Appointment booked successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn change_appointment_status(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .change_status(appointment_id, request.status)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "message": "Appointment status updated",
        "appointment": appointment
    })))
}

/// The authenticated patient's active appointments.
#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Caller identity is not a valid patient id".to_string()))?;

    let appointments = state
        .store
        .active_appointments_for_patient(patient_id)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn get_worker_appointments(
    State(state): State<Arc<SchedulingState>>,
    Path(worker_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .store
        .appointments_for_worker(worker_id)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        ScheduleError::WorkerNotFound => AppError::NotFound("Worker not found".to_string()),
        ScheduleError::ServiceNotFound => AppError::NotFound("Service not found".to_string()),
        ScheduleError::SlotConflict => AppError::Conflict(
            "Appointment slot conflicts with an existing booking".to_string(),
        ),
        ScheduleError::MissingDuration(detail) => AppError::BadRequest(format!(
            "No procedure duration configured for {}",
            detail
        )),
        ScheduleError::OutsideWorkingHours => AppError::BadRequest(
            "Requested time is outside clinic working hours".to_string(),
        ),
        ScheduleError::IllegalTransition { from, to } => {
            AppError::BadRequest(format!("Illegal status transition: {} -> {}", from, to))
        }
        ScheduleError::Validation(msg) => AppError::ValidationError(msg),
        ScheduleError::Database(msg) => AppError::Database(msg),
    }
}
