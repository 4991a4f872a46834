use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use scheduling_cell::router::scheduling_routes;
use scheduling_cell::SchedulingState;
use shared_config::ClinicConfig;

pub fn create_router(state: Arc<SchedulingState>, config: Arc<ClinicConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/appointments", scheduling_routes(state, config))
}
