// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
    middleware,
};

use shared_config::ClinicConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::SchedulingState;

pub fn scheduling_routes(state: Arc<SchedulingState>, config: Arc<ClinicConfig>) -> Router {
    // All scheduling operations require authentication
    let protected_routes = Router::new()
        .route("/slots", get(handlers::get_free_slots))
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}/status", patch(handlers::change_appointment_status))

        // Appointment listings
        .route("/mine", get(handlers::get_my_appointments))
        .route("/workers/{worker_id}", get(handlers::get_worker_appointments))

        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
