pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use router::scheduling_routes;

use std::sync::Arc;

use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingService;
use crate::services::calendar::ClinicCalendar;
use crate::services::lifecycle::LifecycleService;
use crate::services::notify::Notifier;
use crate::store::ScheduleStore;

/// Shared state for the scheduling routes: the store seam, the clinic
/// calendar, and the services wired on top of them.
pub struct SchedulingState {
    pub store: Arc<dyn ScheduleStore>,
    pub calendar: Arc<ClinicCalendar>,
    pub availability: AvailabilityService,
    pub booking: BookingService,
    pub lifecycle: LifecycleService,
}

impl SchedulingState {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        calendar: ClinicCalendar,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let calendar = Arc::new(calendar);

        Self {
            availability: AvailabilityService::new(Arc::clone(&store), Arc::clone(&calendar)),
            booking: BookingService::new(
                Arc::clone(&store),
                Arc::clone(&calendar),
                Arc::clone(&notifier),
            ),
            lifecycle: LifecycleService::new(Arc::clone(&store), Arc::clone(&calendar), notifier),
            store,
            calendar,
        }
    }
}
