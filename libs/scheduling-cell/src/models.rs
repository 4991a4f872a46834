// libs/scheduling-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Half-open interval overlap test against `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_time && self.start_time < end
    }
}

/// The one documented status vocabulary. Every appointment starts out
/// `planned`; `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Planned,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Whether this status counts toward a worker's occupancy.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Planned | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Planned => write!(f, "planned"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub description: Option<String>,
    pub profession_id: Option<Uuid>,
    pub status: Option<String>,
}

impl Worker {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profession {
    pub id: Uuid,
    pub title: String,
    pub procedure_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub price: Option<i32>,
    pub profession_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Row to persist for a freshly validated booking. `end_time` is derived
/// from the resolved service duration at construction and never recomputed.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub worker_id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
}

impl NewAppointment {
    pub fn planned(
        worker_id: Uuid,
        patient_id: Uuid,
        service_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Self {
        Self {
            worker_id,
            patient_id,
            service_id,
            start_time,
            end_time: start_time + Duration::minutes(duration_minutes as i64),
            duration_minutes,
            status: AppointmentStatus::Planned,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub worker_id: Uuid,
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Worker not found")]
    WorkerNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("No procedure duration configured for {0}")]
    MissingDuration(String),

    #[error("Requested time is outside clinic working hours")]
    OutsideWorkingHours,

    #[error("Appointment slot conflicts with an existing booking")]
    SlotConflict,

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
