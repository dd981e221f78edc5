use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_api::config::Config;
use campus_api::db::kv::{KeyValueStore, MemoryStore};
use campus_api::db::store::{DataStore, MemoryDataStore};
use campus_api::services::accounts;
use campus_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing; env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;
    let sweep_interval = config.reminder_sweep_interval;

    let store: Arc<dyn DataStore> = Arc::new(MemoryDataStore::new());
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    if let Some(seed) = &config.admin_seed {
        match accounts::seed_admin(store.as_ref(), seed).await {
            Ok(()) => tracing::info!(email = %seed.email, "admin account ready"),
            Err(e) => tracing::error!(%e, "failed to seed admin account"),
        }
    }

    let state = AppState::new(config, store, kv);

    state.reminders.clone().spawn(sweep_interval);
    tracing::info!(interval_secs = sweep_interval.as_secs(), "reminder sweep scheduled");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(campus_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "campus-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
