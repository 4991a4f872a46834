use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, NewAppointment, Profession, ScheduleError, Service, Worker,
};
use crate::store::ScheduleStore;

/// In-memory store used by the test suites and for local development
/// without a database.
#[derive(Default)]
pub struct InMemoryScheduleStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    workers: HashMap<Uuid, Worker>,
    professions: HashMap<Uuid, Profession>,
    services: HashMap<Uuid, Service>,
    appointments: HashMap<Uuid, Appointment>,
    contacts: HashMap<Uuid, String>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_worker(&self, worker: Worker) {
        self.inner.write().await.workers.insert(worker.id, worker);
    }

    pub async fn put_profession(&self, profession: Profession) {
        self.inner.write().await.professions.insert(profession.id, profession);
    }

    pub async fn put_service(&self, service: Service) {
        self.inner.write().await.services.insert(service.id, service);
    }

    pub async fn put_contact(&self, patient_id: Uuid, email: &str) {
        self.inner.write().await.contacts.insert(patient_id, email.to_string());
    }

    /// Seed an appointment in an arbitrary state, bypassing the booking path.
    pub async fn put_appointment(&self, appointment: Appointment) {
        self.inner.write().await.appointments.insert(appointment.id, appointment);
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn worker(&self, id: Uuid) -> Result<Option<Worker>, ScheduleError> {
        Ok(self.inner.read().await.workers.get(&id).cloned())
    }

    async fn service(&self, id: Uuid) -> Result<Option<Service>, ScheduleError> {
        Ok(self.inner.read().await.services.get(&id).cloned())
    }

    async fn profession(&self, id: Uuid) -> Result<Option<Profession>, ScheduleError> {
        Ok(self.inner.read().await.professions.get(&id).cloned())
    }

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, ScheduleError> {
        Ok(self.inner.read().await.appointments.get(&id).cloned())
    }

    async fn active_appointments_overlapping(
        &self,
        worker_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|apt| {
                apt.worker_id == worker_id && apt.status.is_active() && apt.overlaps(from, to)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|apt| apt.start_time);
        Ok(matches)
    }

    async fn active_appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|apt| apt.patient_id == patient_id && apt.status.is_active())
            .cloned()
            .collect();
        matches.sort_by_key(|apt| apt.start_time);
        Ok(matches)
    }

    async fn appointments_for_worker(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|apt| apt.worker_id == worker_id)
            .cloned()
            .collect();
        matches.sort_by_key(|apt| apt.start_time);
        Ok(matches)
    }

    async fn insert_appointment(
        &self,
        new: NewAppointment,
    ) -> Result<Appointment, ScheduleError> {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            worker_id: new.worker_id,
            patient_id: new.patient_id,
            service_id: new.service_id,
            start_time: new.start_time,
            end_time: new.end_time,
            duration_minutes: new.duration_minutes,
            status: new.status,
            created_at: now,
            updated_at: now,
        };

        self.inner
            .write()
            .await
            .appointments
            .insert(appointment.id, appointment.clone());

        Ok(appointment)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, ScheduleError> {
        let mut inner = self.inner.write().await;
        let appointment = inner.appointments.get_mut(&id).ok_or(ScheduleError::NotFound)?;
        appointment.status = status;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn cancel_stale_planned(&self, cutoff: DateTime<Utc>) -> Result<u64, ScheduleError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let mut expired = 0;

        for appointment in inner.appointments.values_mut() {
            if appointment.status == AppointmentStatus::Planned && appointment.start_time < cutoff {
                appointment.status = AppointmentStatus::Cancelled;
                appointment.updated_at = now;
                expired += 1;
            }
        }

        Ok(expired)
    }

    async fn patient_contact(&self, patient_id: Uuid) -> Result<Option<String>, ScheduleError> {
        Ok(self.inner.read().await.contacts.get(&patient_id).cloned())
    }
}
