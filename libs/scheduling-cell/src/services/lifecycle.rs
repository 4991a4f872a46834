// libs/scheduling-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, ScheduleError};
use crate::services::calendar::ClinicCalendar;
use crate::services::notify::Notifier;
use crate::store::ScheduleStore;

pub struct LifecycleService {
    store: Arc<dyn ScheduleStore>,
    calendar: Arc<ClinicCalendar>,
    notifier: Arc<dyn Notifier>,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        calendar: Arc<ClinicCalendar>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            calendar,
            notifier,
        }
    }

    /// Validate that a status transition is allowed.
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), ScheduleError> {
        debug!(
            "Validating status transition from {} to {}",
            current_status, new_status
        );

        let valid_transitions = Self::valid_transitions(current_status);

        if !valid_transitions.contains(new_status) {
            warn!(
                "Invalid status transition attempted: {} -> {}",
                current_status, new_status
            );
            return Err(ScheduleError::IllegalTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        Ok(())
    }

    /// All valid next statuses for a given current status.
    pub fn valid_transitions(current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Planned => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Move an appointment through the transition table and notify the
    /// patient of the outcome. Notification failures are logged, never
    /// propagated as transaction failures.
    pub async fn change_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, ScheduleError> {
        let current = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or(ScheduleError::NotFound)?;

        self.validate_status_transition(&current.status, &new_status)?;

        let updated = self.store.update_status(appointment_id, new_status).await?;

        self.notify_status_change(&updated).await;

        info!("Appointment {} moved to {}", appointment_id, new_status);
        Ok(updated)
    }

    async fn notify_status_change(&self, appointment: &Appointment) {
        let email = match self.store.patient_contact(appointment.patient_id).await {
            Ok(Some(email)) => email,
            Ok(None) => {
                debug!("No contact on file for patient {}", appointment.patient_id);
                return;
            }
            Err(e) => {
                warn!(
                    "Contact lookup failed for patient {}: {}",
                    appointment.patient_id, e
                );
                return;
            }
        };

        let start_local = self.calendar.to_local(appointment.start_time);
        let subject = "Your appointment status changed".to_string();
        let body = format!(
            "Your appointment on {} is now {}.",
            start_local.format("%Y-%m-%d %H:%M"),
            appointment.status,
        );

        if let Err(e) = self.notifier.send(&email, &subject, &body).await {
            warn!(
                "Failed to send status notification for appointment {}: {}",
                appointment.id, e
            );
        }
    }
}
