//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the relay, scan and status handlers
//! - Wire up middleware (tracing, request ID, CORS, body limit, timeout)
//! - Serve on a listener until the shutdown coordinator fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::cors::cors_middleware;
use crate::http::status::get_status;
use crate::relay::handler::relay_handler;
use crate::relay::ExecutionClient;
use crate::scan::handler::scan_handler;
use crate::scan::ScanScheduler;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ExecutionClient>,
    pub scanner: Arc<ScanScheduler>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            relay: Arc::new(ExecutionClient::new(config.relay.clone())),
            scanner: Arc::new(ScanScheduler::new(config.scan.clone())),
        }
    }
}

/// HTTP server for the relay service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig) -> Self {
        let state = AppState::from_config(&config);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &AppConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/cors-proxy", post(relay_handler))
            .route("/port-scan", post(scan_handler))
            .route("/status", get(get_status))
            .fallback(not_found)
            .with_state(state);

        if let Some(secs) = config.timeouts.request_secs {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(secs)));
        }

        router.layer(DefaultBodyLimit::disable()).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::from_fn(cors_middleware))
                .layer(RequestBodyLimitLayer::new(config.security.max_body_size)),
        )
    }

    /// Serve until a value is broadcast on `shutdown` (or its sender drops).
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_body_size = self.config.security.max_body_size,
            request_timeout_secs = ?self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))).into_response()
}
