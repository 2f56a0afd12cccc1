//! HTTP surface for the Vocassion core.
//!
//! # Responsibility
//! - Map JSON requests onto core use cases and core errors onto status codes.
//! - Own process startup: logging, database, listener and shutdown.
//!
//! # Invariants
//! - Handlers never touch SQL directly; every state change goes through a
//!   core service.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method};
use axum::Router;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use vocassion_core::{init_logging, open_db, SystemClock};

pub mod auth;
pub mod config;
pub mod error;
pub mod realtime;
mod routes;
pub mod state;

use auth::USER_ID_HEADER;
use config::ServerConfig;
use error::StartupError;
use realtime::ChannelBroadcaster;
use state::AppState;

/// Builds the full router with CORS applied.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    routes::router().layer(cors).with_state(state)
}

/// Starts logging, opens the database and serves until a shutdown signal.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    init_logging(&config.logging_config()?)?;

    let conn = open_db(&config.db_path)?;
    info!(
        "event=db_open module=api status=ok path={}",
        config.db_path.display()
    );
    let state = AppState::new(
        conn,
        Arc::new(SystemClock),
        Arc::new(ChannelBroadcaster::default()),
    );

    let listener = TcpListener::bind(config.bind).await?;
    info!(
        "event=http_start module=api status=ok bind={}",
        config.bind
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=http_stop module=api status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("event=shutdown_signal module=api status=ok signal=ctrl_c"),
            Err(err) => {
                error!(
                    "event=shutdown_signal module=api status=error signal=ctrl_c error={}",
                    err
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=shutdown_signal module=api status=ok signal=terminate");
            }
            Err(err) => {
                error!(
                    "event=shutdown_signal module=api status=error signal=terminate error={}",
                    err
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
