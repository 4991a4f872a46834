// libs/scheduling-cell/tests/lifecycle_test.rs
use std::sync::Arc;

use anyhow::{anyhow, Result};
use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use scheduling_cell::models::{Appointment, AppointmentStatus, ScheduleError};
use scheduling_cell::services::calendar::ClinicCalendar;
use scheduling_cell::services::lifecycle::LifecycleService;
use scheduling_cell::services::notify::Notifier;
use scheduling_cell::store::{InMemoryScheduleStore, ScheduleStore};

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.lock().await.push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<()> {
        Err(anyhow!("mail relay is down"))
    }
}

struct TestSetup {
    store: Arc<InMemoryScheduleStore>,
    notifier: Arc<RecordingNotifier>,
    lifecycle: LifecycleService,
}

impl TestSetup {
    fn new() -> Self {
        let store = Arc::new(InMemoryScheduleStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let lifecycle = LifecycleService::new(
            store.clone() as Arc<dyn ScheduleStore>,
            Arc::new(calendar()),
            notifier.clone() as Arc<dyn Notifier>,
        );

        Self {
            store,
            notifier,
            lifecycle,
        }
    }

    fn with_notifier(notifier: Arc<dyn Notifier>) -> (Arc<InMemoryScheduleStore>, LifecycleService) {
        let store = Arc::new(InMemoryScheduleStore::new());
        let lifecycle = LifecycleService::new(
            store.clone() as Arc<dyn ScheduleStore>,
            Arc::new(calendar()),
            notifier,
        );
        (store, lifecycle)
    }
}

fn calendar() -> ClinicCalendar {
    ClinicCalendar::with_hours(
        chrono_tz::Asia::Yekaterinburg,
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    )
    .unwrap()
}

async fn seed_appointment(store: &InMemoryScheduleStore, status: AppointmentStatus) -> Appointment {
    let start_time = Utc::now() + Duration::days(1);
    let appointment = Appointment {
        id: Uuid::new_v4(),
        worker_id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        service_id: Uuid::new_v4(),
        start_time,
        end_time: start_time + Duration::minutes(30),
        duration_minutes: 30,
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    store.put_appointment(appointment.clone()).await;
    store.put_contact(appointment.patient_id, "patient@example.com").await;
    appointment
}

#[tokio::test]
async fn planned_can_be_confirmed() {
    let setup = TestSetup::new();
    let appointment = seed_appointment(&setup.store, AppointmentStatus::Planned).await;

    let updated = setup
        .lifecycle
        .change_status(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Confirmed);

    let stored = setup.store.appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn planned_can_be_cancelled() {
    let setup = TestSetup::new();
    let appointment = seed_appointment(&setup.store, AppointmentStatus::Planned).await;

    let updated = setup
        .lifecycle
        .change_status(appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn confirmed_can_complete_or_cancel() {
    let setup = TestSetup::new();

    let appointment = seed_appointment(&setup.store, AppointmentStatus::Confirmed).await;
    let completed = setup
        .lifecycle
        .change_status(appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let appointment = seed_appointment(&setup.store, AppointmentStatus::Confirmed).await;
    let cancelled = setup
        .lifecycle
        .change_status(appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn planned_cannot_skip_to_completed() {
    let setup = TestSetup::new();
    let appointment = seed_appointment(&setup.store, AppointmentStatus::Planned).await;

    let result = setup
        .lifecycle
        .change_status(appointment.id, AppointmentStatus::Completed)
        .await;

    assert_matches!(result, Err(ScheduleError::IllegalTransition { .. }));
}

#[tokio::test]
async fn cancelled_is_terminal() {
    let setup = TestSetup::new();
    let appointment = seed_appointment(&setup.store, AppointmentStatus::Cancelled).await;

    for target in [
        AppointmentStatus::Planned,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ] {
        let result = setup.lifecycle.change_status(appointment.id, target).await;
        assert_matches!(
            result,
            Err(ScheduleError::IllegalTransition { .. }),
            "cancelled -> {} must be rejected",
            target
        );
    }
}

#[tokio::test]
async fn uncancelling_is_rejected() {
    let setup = TestSetup::new();
    let appointment = seed_appointment(&setup.store, AppointmentStatus::Cancelled).await;

    let result = setup
        .lifecycle
        .change_status(appointment.id, AppointmentStatus::Planned)
        .await;

    assert_matches!(
        result,
        Err(ScheduleError::IllegalTransition {
            from: AppointmentStatus::Cancelled,
            to: AppointmentStatus::Planned,
        })
    );
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let setup = TestSetup::new();

    let result = setup
        .lifecycle
        .change_status(Uuid::new_v4(), AppointmentStatus::Confirmed)
        .await;

    assert_matches!(result, Err(ScheduleError::NotFound));
}

#[tokio::test]
async fn successful_transition_notifies_the_patient() {
    let setup = TestSetup::new();
    let appointment = seed_appointment(&setup.store, AppointmentStatus::Planned).await;

    setup
        .lifecycle
        .change_status(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    let sent = setup.notifier.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "patient@example.com");
    assert!(sent[0].2.contains("confirmed"));
}

#[tokio::test]
async fn rejected_transition_sends_nothing() {
    let setup = TestSetup::new();
    let appointment = seed_appointment(&setup.store, AppointmentStatus::Cancelled).await;

    let _ = setup
        .lifecycle
        .change_status(appointment.id, AppointmentStatus::Confirmed)
        .await;

    assert!(setup.notifier.sent.lock().await.is_empty());
}

#[tokio::test]
async fn notifier_failure_does_not_fail_the_transition() {
    let (store, lifecycle) = TestSetup::with_notifier(Arc::new(FailingNotifier));
    let appointment = seed_appointment(&store, AppointmentStatus::Planned).await;

    let updated = lifecycle
        .change_status(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Confirmed);

    let stored = store.appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
}
