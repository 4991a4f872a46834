// libs/scheduling-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::debug;
use uuid::Uuid;

use crate::models::ScheduleError;
use crate::services::calendar::ClinicCalendar;
use crate::services::duration::DurationResolver;
use crate::store::ScheduleStore;

pub struct AvailabilityService {
    store: Arc<dyn ScheduleStore>,
    calendar: Arc<ClinicCalendar>,
    durations: DurationResolver,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn ScheduleStore>, calendar: Arc<ClinicCalendar>) -> Self {
        Self {
            durations: DurationResolver::new(Arc::clone(&store)),
            store,
            calendar,
        }
    }

    /// Free slot starts for a worker on a calendar date, in clinic-local
    /// time, chronological. A pure function of the worker, the date and the
    /// bookings on record - recomputed fresh on every call.
    pub async fn free_slots(
        &self,
        worker_id: Uuid,
        date: NaiveDate,
        slot_minutes: Option<i32>,
    ) -> Result<Vec<DateTime<Tz>>, ScheduleError> {
        debug!("Calculating free slots for worker {} on {}", worker_id, date);

        let worker = self
            .store
            .worker(worker_id)
            .await?
            .ok_or(ScheduleError::WorkerNotFound)?;

        let slot_minutes = match slot_minutes {
            Some(minutes) if minutes > 0 => minutes,
            Some(_) => {
                return Err(ScheduleError::Validation(
                    "slot_minutes must be positive".to_string(),
                ))
            }
            None => self.durations.for_worker(&worker).await?,
        };

        let (open, close) = self.calendar.working_window(date)?;

        // Every appointment occupies [start, start + its own service's
        // duration); slot sizes across appointments are not uniform.
        let occupied = self
            .store
            .active_appointments_overlapping(worker_id, open, close)
            .await?;

        let step = Duration::minutes(slot_minutes as i64);
        let mut slots = Vec::new();
        let mut current = open;

        while current + step <= close {
            let candidate_end = current + step;

            let taken = occupied.iter().any(|apt| apt.overlaps(current, candidate_end));
            if !taken {
                slots.push(self.calendar.to_local(current));
            }

            current = candidate_end;
        }

        debug!(
            "Found {} free slots for worker {} on {}",
            slots.len(),
            worker_id,
            date
        );
        Ok(slots)
    }
}
