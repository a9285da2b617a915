//! memberd-server: generic read/write HTTP host
//!
//! Maps any `RwService` implementor onto the conventional read/write
//! contract: GET/PUT/DELETE on `/memberships/{uuid}`, a count endpoint,
//! a health document, and a good-to-go probe. Routing and status-code
//! policy live here; everything record-shaped stays behind the trait.

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use memberd_core::RwService;

pub use error::{ApiError, ApiResult, ServeError};
pub use state::{AppState, SystemInfo};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub system_code: String,
    pub description: String,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            system_code: "memberd".to_string(),
            description: "Writes memberships to a graph database".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Build the router for a service, with the full middleware stack.
pub fn build_router<S: RwService>(state: AppState<S>, request_timeout: Duration) -> Router {
    // CORS stays permissive: the service sits behind internal routing.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors);

    Router::new()
        .route("/memberships/__count", get(routes::count_records::<S>))
        .route(
            "/memberships/{uuid}",
            get(routes::read_record::<S>)
                .put(routes::write_record::<S>)
                .delete(routes::delete_record::<S>),
        )
        .route("/__health", get(routes::health::<S>))
        .route("/__gtg", get(routes::good_to_go::<S>))
        .layer(middleware)
        .with_state(state)
}

/// Start the HTTP server and block until shutdown.
pub async fn serve<S: RwService>(service: S, config: ServerConfig) -> Result<(), ServeError> {
    let state = AppState::new(
        service,
        SystemInfo {
            system_code: config.system_code.clone(),
            description: config.description.clone(),
        },
    );
    let app = build_router(state, config.request_timeout);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("starting {} on http://{}", config.system_code, addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
