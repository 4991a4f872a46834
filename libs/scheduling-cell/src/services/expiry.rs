// libs/scheduling-cell/src/services/expiry.rs
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use shared_config::ClinicConfig;

use crate::models::ScheduleError;
use crate::store::ScheduleStore;

/// Recurring sweep that cancels stale unconfirmed bookings: every planned
/// appointment whose start lies further in the past than the grace period.
pub struct ExpirySweeper {
    store: Arc<dyn ScheduleStore>,
    grace: Duration,
    interval: StdDuration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn ScheduleStore>, config: &ClinicConfig) -> Self {
        Self {
            store,
            grace: Duration::minutes(config.booking_grace_minutes),
            interval: StdDuration::from_secs(config.expiry_sweep_seconds),
        }
    }

    /// One sweep pass. Idempotent: the planned-status filter in the store
    /// makes a repeated run with nothing newly expired a no-op.
    pub async fn sweep_once(&self) -> Result<u64, ScheduleError> {
        let cutoff = Utc::now() - self.grace;
        let expired = self.store.cancel_stale_planned(cutoff).await?;

        if expired > 0 {
            info!("Cancelled {} expired appointments", expired);
        } else {
            debug!("No expired appointments found");
        }

        Ok(expired)
    }

    /// Run forever on the configured interval. Intended for `tokio::spawn`
    /// at startup, decoupled from request handling.
    pub async fn run(self) {
        info!("Expiry sweeper started, interval {:?}", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(e) = self.sweep_once().await {
                error!("Expiry sweep failed: {}", e);
            }
        }
    }
}
