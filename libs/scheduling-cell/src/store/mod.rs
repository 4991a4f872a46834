pub mod memory;
pub mod postgrest;

pub use memory::InMemoryScheduleStore;
pub use postgrest::PostgrestScheduleStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, NewAppointment, Profession, ScheduleError, Service, Worker,
};

/// Persistence seam for the scheduling core. The production implementation
/// talks to the relational store over PostgREST; tests run against the
/// in-memory implementation. Appointment rows are never deleted through
/// this interface - status transitions are the only mutation.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn worker(&self, id: Uuid) -> Result<Option<Worker>, ScheduleError>;

    async fn service(&self, id: Uuid) -> Result<Option<Service>, ScheduleError>;

    async fn profession(&self, id: Uuid) -> Result<Option<Profession>, ScheduleError>;

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, ScheduleError>;

    /// Active-status appointments for a worker whose `[start_time, end_time)`
    /// overlaps `[from, to)`, ordered by start time.
    async fn active_appointments_overlapping(
        &self,
        worker_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, ScheduleError>;

    async fn active_appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, ScheduleError>;

    async fn appointments_for_worker(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<Appointment>, ScheduleError>;

    async fn insert_appointment(
        &self,
        new: NewAppointment,
    ) -> Result<Appointment, ScheduleError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, ScheduleError>;

    /// Bulk-cancel planned appointments that started before the cutoff.
    /// The status filter makes repeated sweeps a no-op; returns the number
    /// of rows transitioned.
    async fn cancel_stale_planned(&self, cutoff: DateTime<Utc>) -> Result<u64, ScheduleError>;

    /// Contact address for outbound notifications, when one is on file.
    async fn patient_contact(&self, patient_id: Uuid) -> Result<Option<String>, ScheduleError>;
}
