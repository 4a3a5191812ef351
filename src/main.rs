use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::services::calendar::google::GoogleCalendarProvider;
use salonbook::services::notifications::InboxNotifier;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let db = Arc::new(Mutex::new(db::init_db(&config.database_url)?));

    tracing::info!(
        api_url = %config.google_calendar_api_url,
        time_zone = %config.calendar_time_zone,
        timeout_secs = config.calendar_sync_timeout.as_secs(),
        "using Google Calendar provider"
    );
    let calendar = GoogleCalendarProvider::new(
        config.google_calendar_api_url.clone(),
        config.calendar_time_zone.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::clone(&db),
        config: config.clone(),
        notifier: Box::new(InboxNotifier::new(db)),
        calendar: Box::new(calendar),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
