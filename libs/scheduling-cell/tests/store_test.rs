// libs/scheduling-cell/tests/store_test.rs
//
// Wiremock coverage for the PostgREST-backed store: query shapes, row
// parsing and error mapping. Scheduling semantics are covered against the
// in-memory store in the sibling suites.
use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::models::{AppointmentStatus, NewAppointment, ScheduleError};
use scheduling_cell::store::{PostgrestScheduleStore, ScheduleStore};
use shared_database::postgrest::PostgrestClient;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn store_for(mock_server: &MockServer) -> PostgrestScheduleStore {
    let mut config = TestConfig::default().to_clinic_config();
    config.store_url = mock_server.uri();
    PostgrestScheduleStore::new(PostgrestClient::new(&config))
}

#[tokio::test]
async fn worker_row_parses() {
    let mock_server = MockServer::start().await;
    let worker_id = Uuid::new_v4();
    let profession_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/workers"))
        .and(query_param("id", format!("eq.{}", worker_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::worker_response(&worker_id.to_string(), Some(&profession_id)),
        ]))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let worker = store.worker(worker_id).await.unwrap().unwrap();

    assert_eq!(worker.id, worker_id);
    assert_eq!(worker.first_name, "Anna");
    assert_eq!(worker.profession_id.unwrap().to_string(), profession_id);
}

#[tokio::test]
async fn absent_worker_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/workers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    assert!(store.worker(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn overlap_query_filters_on_active_statuses() {
    let mock_server = MockServer::start().await;
    let worker_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("worker_id", format!("eq.{}", worker_id)))
        .and(query_param("status", "in.(planned,confirmed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockStoreResponses::appointment_response(
                &appointment_id.to_string(),
                &worker_id.to_string(),
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "2026-03-02T06:00:00Z",
                "2026-03-02T06:30:00Z",
                "planned",
            ),
        ]))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let from = Utc.with_ymd_and_hms(2026, 3, 2, 4, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 2, 13, 0, 0).unwrap();

    let appointments = store
        .active_appointments_overlapping(worker_id, from, to)
        .await
        .unwrap();

    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].id, appointment_id);
    assert_eq!(appointments[0].status, AppointmentStatus::Planned);
}

#[tokio::test]
async fn insert_parses_the_created_row() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let worker_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(serde_json::json!({ "status": "planned" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(vec![
            MockStoreResponses::appointment_response(
                &appointment_id.to_string(),
                &worker_id.to_string(),
                &patient_id.to_string(),
                &service_id.to_string(),
                "2026-03-02T06:00:00Z",
                "2026-03-02T06:30:00Z",
                "planned",
            ),
        ]))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let start_time = Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap();

    let appointment = store
        .insert_appointment(NewAppointment::planned(
            worker_id, patient_id, service_id, start_time, 30,
        ))
        .await
        .unwrap();

    assert_eq!(appointment.id, appointment_id);
    assert_eq!(appointment.status, AppointmentStatus::Planned);
}

#[tokio::test]
async fn empty_insert_response_is_a_database_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let start_time = Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap();

    let result = store
        .insert_appointment(NewAppointment::planned(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            start_time,
            30,
        ))
        .await;

    assert_matches!(result, Err(ScheduleError::Database(_)));
}

#[tokio::test]
async fn status_update_on_missing_row_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let result = store
        .update_status(Uuid::new_v4(), AppointmentStatus::Confirmed)
        .await;

    assert_matches!(result, Err(ScheduleError::NotFound));
}

#[tokio::test]
async fn stale_sweep_targets_planned_rows_and_counts_them() {
    let mock_server = MockServer::start().await;
    let worker_id = Uuid::new_v4().to_string();

    let row = |id: &str| {
        MockStoreResponses::appointment_response(
            id,
            &worker_id,
            &Uuid::new_v4().to_string(),
            &Uuid::new_v4().to_string(),
            "2026-03-02T06:00:00Z",
            "2026-03-02T06:30:00Z",
            "cancelled",
        )
    };

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.planned"))
        .and(body_partial_json(serde_json::json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            row(&Uuid::new_v4().to_string()),
            row(&Uuid::new_v4().to_string()),
        ]))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let cutoff = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();

    assert_eq!(store.cancel_stale_planned(cutoff).await.unwrap(), 2);
}

#[tokio::test]
async fn patient_contact_reads_the_email_column() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .and(query_param("select", "email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            serde_json::json!({ "email": "patient@example.com" }),
        ]))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let contact = store.patient_contact(patient_id).await.unwrap();

    assert_eq!(contact.as_deref(), Some("patient@example.com"));
}

#[tokio::test]
async fn store_failure_surfaces_as_database_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/workers"))
        .respond_with(ResponseTemplate::new(500).set_body_string("relation does not exist"))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let result = store.worker(Uuid::new_v4()).await;

    assert_matches!(result, Err(ScheduleError::Database(_)));
}
