use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use shared_config::ClinicConfig;
use shared_database::postgrest::PostgrestClient;
use scheduling_cell::SchedulingState;
use scheduling_cell::services::calendar::ClinicCalendar;
use scheduling_cell::services::expiry::ExpirySweeper;
use scheduling_cell::services::notify::{LogOnlyNotifier, MailRelayNotifier, Notifier};
use scheduling_cell::store::{PostgrestScheduleStore, ScheduleStore};

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic booking API server");

    // Load configuration
    let config = Arc::new(ClinicConfig::from_env());

    let calendar = ClinicCalendar::from_config(&config)
        .expect("Clinic calendar configuration is invalid");

    let store: Arc<dyn ScheduleStore> =
        Arc::new(PostgrestScheduleStore::new(PostgrestClient::new(&config)));

    let notifier: Arc<dyn Notifier> = if config.is_mailer_configured() {
        Arc::new(MailRelayNotifier::new(&config))
    } else {
        Arc::new(LogOnlyNotifier)
    };

    let state = Arc::new(SchedulingState::new(Arc::clone(&store), calendar, notifier));

    // Stale planned bookings are cancelled on a timer, independent of requests
    let sweeper = ExpirySweeper::new(store, &config);
    tokio::spawn(sweeper.run());

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state, config)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .await
        .unwrap();
}
