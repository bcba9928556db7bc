// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use nimba_core::{NimbaError, TenantId};
use nimba_sms::CallbackProcessor;
use tokio_util::sync::CancellationToken;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers::{self, WEBHOOK_PATH};

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            start_time: std::time::Instant::now(),
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Applies parsed delivery reports to tenant databases.
    pub processor: Arc<CallbackProcessor>,
    /// Webhook secret per tenant. Tenants without an entry accept unsigned
    /// reports (with a security warning).
    pub webhook_secrets: Arc<HashMap<TenantId, String>>,
    /// Authentication for operator routes.
    pub auth: AuthConfig,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(processor: Arc<CallbackProcessor>) -> Self {
        Self {
            processor,
            webhook_secrets: Arc::new(HashMap::new()),
            auth: AuthConfig::default(),
            health: HealthState::default(),
        }
    }

    pub fn with_webhook_secrets(mut self, secrets: HashMap<TenantId, String>) -> Self {
        self.webhook_secrets = Arc::new(secrets);
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn webhook_secret(&self, tenant: &TenantId) -> Option<&str> {
        self.webhook_secrets.get(tenant).map(String::as_str)
    }
}

/// Listener address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the gateway router.
///
/// - GET|POST /sms/webhook/nimba (fan-out across tenants)
/// - GET|POST /sms/webhook/nimba/{tenant} (signature checked)
/// - GET /sms/webhook/test (bearer auth)
/// - GET /health
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route(
            WEBHOOK_PATH,
            get(handlers::webhook_ready).post(handlers::post_webhook),
        )
        .route(
            &format!("{WEBHOOK_PATH}/{{tenant}}"),
            get(handlers::webhook_ready).post(handlers::post_tenant_webhook),
        )
        .with_state(state);

    let operator_routes = Router::new()
        .route("/sms/webhook/test", get(handlers::get_webhook_test))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(operator_routes)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(handlers::WebhookResponse {
            status: "error",
            message: Some("Internal server error".to_string()),
        }),
    )
        .into_response()
}

/// Serve the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), NimbaError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NimbaError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| NimbaError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
