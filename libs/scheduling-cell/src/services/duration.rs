// libs/scheduling-cell/src/services/duration.rs
use std::sync::Arc;

use crate::models::{Profession, ScheduleError, Service, Worker};
use crate::store::ScheduleStore;

/// Resolves procedure durations through the profession chain. Pure lookups
/// with no cached state; callers reuse the resolved value within a request.
pub struct DurationResolver {
    store: Arc<dyn ScheduleStore>,
}

impl DurationResolver {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    /// Duration for a booked service, via its associated profession.
    pub async fn for_service(&self, service: &Service) -> Result<i32, ScheduleError> {
        let profession_id = service
            .profession_id
            .ok_or_else(|| ScheduleError::MissingDuration(format!("service {}", service.id)))?;

        let profession = self
            .store
            .profession(profession_id)
            .await?
            .ok_or_else(|| ScheduleError::MissingDuration(format!("service {}", service.id)))?;

        configured_minutes(&profession)
            .ok_or_else(|| ScheduleError::MissingDuration(format!("profession {}", profession.id)))
    }

    /// Fallback duration for a worker, via their own profession.
    pub async fn for_worker(&self, worker: &Worker) -> Result<i32, ScheduleError> {
        let profession_id = worker
            .profession_id
            .ok_or_else(|| ScheduleError::MissingDuration(format!("worker {}", worker.id)))?;

        let profession = self
            .store
            .profession(profession_id)
            .await?
            .ok_or_else(|| ScheduleError::MissingDuration(format!("worker {}", worker.id)))?;

        configured_minutes(&profession)
            .ok_or_else(|| ScheduleError::MissingDuration(format!("profession {}", profession.id)))
    }
}

fn configured_minutes(profession: &Profession) -> Option<i32> {
    profession.procedure_minutes.filter(|minutes| *minutes > 0)
}
