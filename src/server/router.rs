use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};
use tracing::{info, warn};

use super::admin::admin_router;
use super::user::user_router;
use crate::auth::TokenGenerator;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::store::Store;

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: ServerConfig,
    /// Hashes and verifies API tokens with the server's argon2 parameters.
    pub tokens: TokenGenerator,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Result<Self> {
        Ok(Self {
            store,
            config,
            tokens: TokenGenerator::new()?,
        })
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        warn!(%method, %path, status, latency_ms, "request failed");
    } else {
        info!(%method, %path, status, latency_ms, "request");
    }

    response
}

/// Builds the full HTTP surface: `/health`, the admin API under
/// `/api/v1/admin` and the user API under `/api/v1`.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", user_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
