//! HTTP boundary for the connection search: a single POST endpoint plus a
//! health check. Internal error categories map to stable response codes;
//! everything the search distinguishes internally beyond that stays in the
//! logs.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::directory::HttpDirectory;
use crate::error::{Result, SixDegreesError};
use crate::service::ConnectionService;

/// HTTP server wrapper around the connection service
pub struct HttpServer {
    service: Arc<ConnectionService<HttpDirectory>>,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(service: Arc<ConnectionService<HttpDirectory>>, config: ServerConfig) -> Self {
        Self { service, config }
    }

    /// Run the HTTP server
    pub async fn run(&self) -> Result<()> {
        let app = self.create_router();

        let addr = format!("127.0.0.1:{}", self.config.port);
        log::info!("Starting connection API on http://{}", addr);
        log::info!("Connect endpoint: http://{}/api/connect", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            SixDegreesError::Config(format!(
                "Failed to bind to {}: {}. If the port is in use, pick another via server.port in config.toml",
                addr, e
            ))
        })?;

        axum::serve(listener, app).await.map_err(|e| {
            SixDegreesError::Io(std::io::Error::other(format!("HTTP server error: {}", e)))
        })?;

        Ok(())
    }

    /// Create the axum router
    fn create_router(&self) -> Router {
        // Build CORS layer.
        // - If allowed_origins is configured: restrict to exactly those.
        // - If empty (local dev): allow Any for convenience.
        let cors = if self.config.allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = self
                .config
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/api/connect", post(handle_connect))
            .route("/health", get(handle_health))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
            .with_state(Arc::clone(&self.service))
    }
}

/// Request body for the connect endpoint
#[derive(Debug, Deserialize)]
struct ConnectRequest {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

async fn handle_connect(
    State(service): State<Arc<ConnectionService<HttpDirectory>>>,
    Json(request): Json<ConnectRequest>,
) -> Response {
    let (from, to) = match (request.from, request.to) {
        (Some(from), Some(to)) => (from, to),
        _ => return error_response(StatusCode::BAD_REQUEST, "missing from/to"),
    };

    match service.find_connection(&from, &to).await {
        Ok(connection) => (StatusCode::OK, Json(connection)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                log::error!("connect failed: {}", e);
            }
            error_response(status, &e.to_string())
        }
    }
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Stable mapping of error categories to response codes
fn status_for(err: &SixDegreesError) -> StatusCode {
    match err {
        SixDegreesError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SixDegreesError::FromNotFound(_)
        | SixDegreesError::ToNotFound(_)
        | SixDegreesError::NoConnectionFound => StatusCode::NOT_FOUND,
        SixDegreesError::Transient(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
