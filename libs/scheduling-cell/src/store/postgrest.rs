use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::postgrest::PostgrestClient;

use crate::models::{
    Appointment, AppointmentStatus, NewAppointment, Profession, ScheduleError, Service, Worker,
};
use crate::store::ScheduleStore;

pub struct PostgrestScheduleStore {
    client: PostgrestClient,
}

impl PostgrestScheduleStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }

    async fn fetch_one<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        id: Uuid,
    ) -> Result<Option<T>, ScheduleError> {
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        let result: Vec<Value> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let parsed = serde_json::from_value(row)
                    .map_err(|e| ScheduleError::Database(format!("Failed to parse {} row: {}", table, e)))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    async fn fetch_appointments(&self, path: &str) -> Result<Vec<Appointment>, ScheduleError> {
        let result: Vec<Value> = self
            .client
            .request(Method::GET, path, None)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| ScheduleError::Database(format!("Failed to parse appointments: {}", e)))
    }

    fn active_status_filter() -> String {
        format!(
            "status=in.({},{})",
            AppointmentStatus::Planned,
            AppointmentStatus::Confirmed
        )
    }

    fn return_representation() -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );
        headers
    }

    fn encode_instant(instant: DateTime<Utc>) -> String {
        // RFC 3339 values carry '+', which must not reach the query string raw.
        urlencoding::encode(&instant.to_rfc3339()).into_owned()
    }
}

#[async_trait]
impl ScheduleStore for PostgrestScheduleStore {
    async fn worker(&self, id: Uuid) -> Result<Option<Worker>, ScheduleError> {
        self.fetch_one("workers", id).await
    }

    async fn service(&self, id: Uuid) -> Result<Option<Service>, ScheduleError> {
        self.fetch_one("services", id).await
    }

    async fn profession(&self, id: Uuid) -> Result<Option<Profession>, ScheduleError> {
        self.fetch_one("professions", id).await
    }

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, ScheduleError> {
        self.fetch_one("appointments", id).await
    }

    async fn active_appointments_overlapping(
        &self,
        worker_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        let path = format!(
            "/rest/v1/appointments?worker_id=eq.{}&{}&start_time=lt.{}&end_time=gt.{}&order=start_time.asc",
            worker_id,
            Self::active_status_filter(),
            Self::encode_instant(to),
            Self::encode_instant(from),
        );

        self.fetch_appointments(&path).await
    }

    async fn active_appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&{}&order=start_time.asc",
            patient_id,
            Self::active_status_filter(),
        );

        self.fetch_appointments(&path).await
    }

    async fn appointments_for_worker(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        let path = format!(
            "/rest/v1/appointments?worker_id=eq.{}&order=start_time.asc",
            worker_id,
        );

        self.fetch_appointments(&path).await
    }

    async fn insert_appointment(
        &self,
        new: NewAppointment,
    ) -> Result<Appointment, ScheduleError> {
        let now = Utc::now();

        let appointment_data = json!({
            "worker_id": new.worker_id,
            "patient_id": new.patient_id,
            "service_id": new.service_id,
            "start_time": new.start_time.to_rfc3339(),
            "end_time": new.end_time.to_rfc3339(),
            "duration_minutes": new.duration_minutes,
            "status": new.status.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self
            .client
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(appointment_data),
                Some(Self::return_representation()),
            )
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| ScheduleError::Database("Failed to create appointment".to_string()))?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| ScheduleError::Database(format!("Failed to parse created appointment: {}", e)))?;

        debug!("Appointment {} persisted", appointment.id);
        Ok(appointment)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, ScheduleError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let update_data = json!({
            "status": status.to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(update_data),
                Some(Self::return_representation()),
            )
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let row = result.into_iter().next().ok_or(ScheduleError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| ScheduleError::Database(format!("Failed to parse updated appointment: {}", e)))
    }

    async fn cancel_stale_planned(&self, cutoff: DateTime<Utc>) -> Result<u64, ScheduleError> {
        let path = format!(
            "/rest/v1/appointments?status=eq.{}&start_time=lt.{}",
            AppointmentStatus::Planned,
            Self::encode_instant(cutoff),
        );
        let update_data = json!({
            "status": AppointmentStatus::Cancelled.to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(update_data),
                Some(Self::return_representation()),
            )
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        Ok(result.len() as u64)
    }

    async fn patient_contact(&self, patient_id: Uuid) -> Result<Option<String>, ScheduleError> {
        let path = format!("/rest/v1/users?id=eq.{}&select=email", patient_id);
        let result: Vec<Value> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        Ok(result
            .first()
            .and_then(|row| row["email"].as_str())
            .map(|email| email.to_string()))
    }
}
