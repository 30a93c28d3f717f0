//! Local web server for the map page.
//!
//! The [`MapDocument`] is built before the server starts and shared
//! read-only with every handler; nothing is refetched while it runs.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};

use crate::map::{Legend, MapDocument, OverlaySummary};
use crate::projector::MarkerDescriptor;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

/// Session-wide map context shared by the handlers.
#[derive(Clone)]
pub struct AppState {
    document: Arc<MapDocument>,
    summary: OverlaySummary,
}

impl AppState {
    #[must_use]
    pub fn new(document: MapDocument, summary: OverlaySummary) -> Self {
        Self {
            document: Arc::new(document),
            summary,
        }
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/markers.json", get(markers_handler))
        .route("/legend.json", get(legend_handler))
        .route("/summary.json", get(summary_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve the map until the process is stopped.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("map server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("map server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {}", e);
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Map page.
async fn index_handler(State(state): State<AppState>) -> Response {
    match state.document.render_html() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("failed to render map page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render map").into_response()
        }
    }
}

async fn markers_handler(State(state): State<AppState>) -> Json<Vec<MarkerDescriptor>> {
    Json(state.document.markers.clone())
}

async fn legend_handler(State(state): State<AppState>) -> Json<Legend> {
    Json(state.document.legend.clone())
}

async fn summary_handler(State(state): State<AppState>) -> Json<OverlaySummary> {
    Json(state.summary)
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}
