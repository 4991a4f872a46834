// libs/scheduling-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Appointment, BookAppointmentRequest, NewAppointment, ScheduleError,
};
use crate::services::calendar::ClinicCalendar;
use crate::services::duration::DurationResolver;
use crate::services::notify::Notifier;
use crate::store::ScheduleStore;

/// Per-worker advisory locks. Holding a worker's lock serializes the
/// overlap-check-and-insert sequence for that worker; bookings for
/// different workers proceed in parallel.
struct WorkerLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl WorkerLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, worker_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.inner.lock().expect("worker lock registry poisoned");
            Arc::clone(registry.entry(worker_id).or_default())
        };

        lock.lock_owned().await
    }
}

pub struct BookingService {
    store: Arc<dyn ScheduleStore>,
    calendar: Arc<ClinicCalendar>,
    durations: DurationResolver,
    notifier: Arc<dyn Notifier>,
    worker_locks: WorkerLocks,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        calendar: Arc<ClinicCalendar>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            durations: DurationResolver::new(Arc::clone(&store)),
            store,
            calendar,
            notifier,
            worker_locks: WorkerLocks::new(),
        }
    }

    /// Validate and commit a new booking. After a successful return no other
    /// committed appointment for the same worker overlaps this one, even
    /// under concurrent booking attempts.
    pub async fn create_appointment(
        &self,
        request: BookAppointmentRequest,
        patient_id: Uuid,
    ) -> Result<Appointment, ScheduleError> {
        info!(
            "Booking appointment for patient {} with worker {}",
            patient_id, request.worker_id
        );

        let service = self
            .store
            .service(request.service_id)
            .await?
            .ok_or(ScheduleError::ServiceNotFound)?;

        let duration_minutes = self.durations.for_service(&service).await?;

        let worker = self
            .store
            .worker(request.worker_id)
            .await?
            .ok_or(ScheduleError::WorkerNotFound)?;

        let start_time = request.start_time;
        let end_time = start_time + Duration::minutes(duration_minutes as i64);

        // The whole interval must fit the working window of the start's
        // clinic-local date.
        let date = self.calendar.local_date(start_time);
        let (open, close) = self.calendar.working_window(date)?;
        if start_time < open || end_time > close {
            debug!(
                "Rejected booking at {}: outside working window {} - {}",
                start_time, open, close
            );
            return Err(ScheduleError::OutsideWorkingHours);
        }

        // Serialize the overlap check and insert per worker, so two
        // concurrent bookings can never both observe a free slot.
        let guard = self.worker_locks.acquire(worker.id).await;

        let occupied = self
            .store
            .active_appointments_overlapping(worker.id, start_time, end_time)
            .await?;

        if occupied
            .iter()
            .any(|apt| apt.status.is_active() && apt.overlaps(start_time, end_time))
        {
            warn!(
                "Booking conflict for worker {} at {}",
                worker.id, start_time
            );
            return Err(ScheduleError::SlotConflict);
        }

        let appointment = self
            .store
            .insert_appointment(NewAppointment::planned(
                worker.id,
                patient_id,
                service.id,
                start_time,
                duration_minutes,
            ))
            .await?;

        drop(guard);

        self.notify_booked(&appointment);

        info!(
            "Appointment {} booked for worker {} at {}",
            appointment.id, worker.id, start_time
        );
        Ok(appointment)
    }

    /// Best-effort booking notification on a detached task. A delivery
    /// failure never unwinds into the committed booking.
    fn notify_booked(&self, appointment: &Appointment) {
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let patient_id = appointment.patient_id;
        let appointment_id = appointment.id;
        let start_local = self.calendar.to_local(appointment.start_time);

        tokio::spawn(async move {
            let email = match store.patient_contact(patient_id).await {
                Ok(Some(email)) => email,
                Ok(None) => {
                    debug!("No contact on file for patient {}", patient_id);
                    return;
                }
                Err(e) => {
                    warn!("Contact lookup failed for patient {}: {}", patient_id, e);
                    return;
                }
            };

            let subject = "Your appointment is booked".to_string();
            let body = format!(
                "Your appointment on {} has been registered and is awaiting confirmation.",
                start_local.format("%Y-%m-%d %H:%M"),
            );

            if let Err(e) = notifier.send(&email, &subject, &body).await {
                warn!(
                    "Failed to send booking notification for appointment {}: {}",
                    appointment_id, e
                );
            }
        });
    }
}
