use dining_room::{
    config::{database, seed, server},
    errors::Result,
    web::{self, AppState, auth::StaffSessions, view::JsonRenderer},
};
use dotenvy::dotenv;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load seed configuration
    let config_path = server::get_config_path();
    let app_config = seed::load_config_or_default(&config_path)
        .inspect_err(|e| error!("Failed to load {config_path}: {e}"))?;
    if app_config.staff.is_empty() {
        warn!("No staff sessions configured; all write operations will be rejected.");
    }

    // 4. Initialize database
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    seed::seed_from_config(&db, &app_config)
        .await
        .inspect(|_| info!("Seed data applied successfully."))
        .inspect_err(|e| error!("Failed to seed database: {e}"))?;

    // 5. Serve
    let state = AppState {
        db,
        authenticator: Arc::new(StaffSessions::from_config(&app_config.staff)),
        renderer: Arc::new(JsonRenderer),
    };
    let app = web::build_router(state).layer(TraceLayer::new_for_http());

    let address = server::get_bind_address()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}
