use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use studio_bookings::config::AppConfig;
use studio_bookings::db;
use studio_bookings::handlers;
use studio_bookings::services::mailer::resend::ResendProvider;
use studio_bookings::services::mailer::EmailProvider;
use studio_bookings::services::notify;
use studio_bookings::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let mailer: Box<dyn EmailProvider> = Box::new(ResendProvider::new(
        config.mailer_api_url.clone(),
        config.mailer_api_key.clone(),
        config.mailer_from.clone(),
    ));
    if config.mailer_api_key.is_empty() {
        tracing::warn!("MAILER_API_KEY not set, notification emails will fail");
    }

    let (notifier, rx) = notify::notification_channel(256);
    tokio::spawn(notify::run_worker(rx, mailer, config.clone()));

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/admin/bookings", get(handlers::admin::list_bookings))
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route(
            "/api/admin/bookings/:id/status",
            post(handlers::admin::transition_booking),
        )
        .route(
            "/api/admin/bookings/:id/modification-link",
            post(handlers::admin::create_modification_link),
        )
        .route("/modify", get(handlers::modify::modify_page))
        .route("/api/modify", post(handlers::modify::apply_modification))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
