//! Work Exchange Notification Server
//!
//! Receives signed events from the form bot and the admin panel and turns
//! them into Telegram notifications for workers, employers and admins.

mod api;
mod config;
mod server;
mod shutdown;
mod state;
mod transport;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use transport::TelegramTransport;
use workx_core::config::ConfigStore;
use workx_core::dispatch::TokioPacer;
use workx_core::events::notification_event_channel;
use workx_core::processors::NotificationCenter;
use workx_core::store::{PgStore, PgTemplates};
use workx_sdk::client::BotClient;

/// Work Exchange - notification service for the job-matching bots
#[derive(Parser, Debug)]
#[command(name = "workx-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./workx-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting workx-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Notification center
    let notification_config = ConfigStore::new(loaded_config.notification);
    let bot = BotClient::with_timeout(
        loaded_config.telegram.api_url,
        loaded_config.telegram.bot_token,
        loaded_config.telegram.request_timeout,
    );
    let center = NotificationCenter::new(
        Arc::new(PgStore::new(db_pool.clone())),
        Arc::new(PgTemplates::new(db_pool.clone())),
        Arc::new(TelegramTransport::new(bot)),
        Arc::new(TokioPacer),
        notification_config.clone(),
    );
    let (event_tx, event_rx) = notification_event_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let center_handle = tokio::spawn(center.run(event_rx, shutdown_rx));

    // Create application state
    let state = AppState::new(loaded_config.intake, event_tx);

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify =
        spawn_config_reload_handler(state.clone(), config_loader, notification_config);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    reload_notify.notify_one();

    // Let in-flight notifications finish
    tracing::info!("Waiting for the notification center to finish...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = center_handle.await {
        tracing::error!("Notification center task failed: {}", e);
    }

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
