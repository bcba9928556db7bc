// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook gateway.
//!
//! Unmatched reports are acknowledged with `200` and a warning so the
//! provider does not retry them.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use nimba_core::{CallbackPayload, NimbaError, TenantId};
use nimba_sms::{CallbackOutcome, signature};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::payload::parse_payload;
use crate::server::GatewayState;

/// Path the provider posts delivery reports to.
pub const WEBHOOK_PATH: &str = "/sms/webhook/nimba";

/// JSON body of every webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookResponse {
    fn new(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    fn with_code(self, code: StatusCode) -> Response {
        (code, Json(self)).into_response()
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response body for GET /sms/webhook/test.
#[derive(Debug, Serialize)]
pub struct WebhookTestResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub endpoint: &'static str,
}

/// GET on either webhook route. Providers check the URL before use.
pub async fn webhook_ready() -> Json<WebhookResponse> {
    Json(WebhookResponse::new("ok", "Webhook endpoint is ready"))
}

/// POST /sms/webhook/nimba
///
/// The caller does not name a tenant, so every tenant is searched in order.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match parse_payload(&headers, query.as_deref(), &body) {
        Ok(payload) => payload,
        Err(e) => return error_response(&e),
    };
    log_received(None, &payload);

    match state.processor.process_fan_out(&payload).await {
        Ok(outcome) => outcome_response(outcome, "SMS not found in any database"),
        Err(e) => error_response(&e),
    }
}

/// POST /sms/webhook/nimba/{tenant}
///
/// The signature is checked against the raw body before anything is parsed.
pub async fn post_tenant_webhook(
    State(state): State<GatewayState>,
    Path(tenant): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let tenant = TenantId::new(tenant);
    let secret = state.webhook_secret(&tenant).unwrap_or_default();
    let presented = headers
        .get(signature::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    if !signature::is_valid(secret, presented, &body) {
        warn!(tenant = %tenant, "rejected webhook with invalid signature");
        return WebhookResponse::new("error", "Invalid signature")
            .with_code(StatusCode::UNAUTHORIZED);
    }

    let payload = match parse_payload(&headers, query.as_deref(), &body) {
        Ok(payload) => payload,
        Err(e) => return error_response(&e),
    };
    log_received(Some(&tenant), &payload);

    match state.processor.process_tenant(&tenant, &payload).await {
        Ok(outcome) => outcome_response(outcome, "SMS not found"),
        Err(e) => error_response(&e),
    }
}

/// GET /sms/webhook/test
pub async fn get_webhook_test() -> Json<WebhookTestResponse> {
    Json(WebhookTestResponse {
        status: "active",
        message: "Nimba SMS webhook is active",
        endpoint: WEBHOOK_PATH,
    })
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

fn log_received(tenant: Option<&TenantId>, payload: &CallbackPayload) {
    info!(
        tenant = tenant.map(TenantId::as_str).unwrap_or("*"),
        request_id = %payload.request_id,
        contact = payload.contact.as_deref().unwrap_or(""),
        status = %payload.status,
        "delivery report received"
    );
}

fn outcome_response(outcome: CallbackOutcome, miss: &str) -> Response {
    match outcome {
        CallbackOutcome::Applied { .. } => WebhookResponse {
            status: "success",
            message: None,
        }
        .with_code(StatusCode::OK),
        CallbackOutcome::NotFound => WebhookResponse::new("warning", miss).with_code(StatusCode::OK),
    }
}

fn error_response(err: &NimbaError) -> Response {
    match err {
        NimbaError::Payload(message) => {
            warn!(error = %message, "malformed delivery report");
            WebhookResponse::new("error", message.clone()).with_code(StatusCode::BAD_REQUEST)
        }
        other => {
            error!(error = %other, "failed to process delivery report");
            WebhookResponse::new("error", other.to_string())
                .with_code(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_omits_message() {
        let json = serde_json::to_string(&WebhookResponse {
            status: "success",
            message: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"success"}"#);
    }

    #[test]
    fn payload_errors_are_client_errors() {
        let resp = error_response(&NimbaError::Payload("Missing messageid".into()));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = error_response(&NimbaError::Internal("boom".into()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_is_acknowledged() {
        let resp = outcome_response(CallbackOutcome::NotFound, "SMS not found");
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
