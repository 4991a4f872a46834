// libs/scheduling-cell/src/services/calendar.rs
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use shared_config::ClinicConfig;

use crate::models::ScheduleError;

/// Clinic-local time arithmetic. Instants are stored in UTC everywhere;
/// this is the single place where wall-clock working hours meet them.
#[derive(Debug, Clone)]
pub struct ClinicCalendar {
    tz: Tz,
    opens_at: NaiveTime,
    closes_at: NaiveTime,
}

impl ClinicCalendar {
    pub fn from_config(config: &ClinicConfig) -> Result<Self, ScheduleError> {
        let tz: Tz = config.clinic_timezone.parse().map_err(|_| {
            ScheduleError::Validation(format!(
                "Unknown clinic timezone: {}",
                config.clinic_timezone
            ))
        })?;

        let opens_at = parse_wall_time(&config.clinic_opens_at)?;
        let closes_at = parse_wall_time(&config.clinic_closes_at)?;

        Self::with_hours(tz, opens_at, closes_at)
    }

    pub fn with_hours(
        tz: Tz,
        opens_at: NaiveTime,
        closes_at: NaiveTime,
    ) -> Result<Self, ScheduleError> {
        if opens_at >= closes_at {
            return Err(ScheduleError::Validation(
                "Clinic opening time must precede closing time".to_string(),
            ));
        }

        Ok(Self { tz, opens_at, closes_at })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The clinic's open and close instants for a calendar date, in UTC.
    pub fn working_window(
        &self,
        date: NaiveDate,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ScheduleError> {
        let open = self.resolve_local(date.and_time(self.opens_at))?;
        let close = self.resolve_local(date.and_time(self.closes_at))?;
        Ok((open.with_timezone(&Utc), close.with_timezone(&Utc)))
    }

    /// The clinic-local calendar date an instant falls on.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    fn resolve_local(&self, local: NaiveDateTime) -> Result<DateTime<Tz>, ScheduleError> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(instant) => Ok(instant),
            // DST fold: take the earlier of the two candidate instants.
            LocalResult::Ambiguous(earliest, _) => Ok(earliest),
            LocalResult::None => Err(ScheduleError::Validation(format!(
                "Local time {} does not exist in {}",
                local, self.tz
            ))),
        }
    }
}

fn parse_wall_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ScheduleError::Validation(format!("Invalid clinic hours value: {}", value)))
}
