// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests for the webhook gateway.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use nimba_core::{DeliveryState, TenantId};
use nimba_gateway::{AuthConfig, GatewayState, build_router};
use nimba_sms::{CallbackProcessor, CallbackResolver, signature};
use nimba_test_utils::MemoryTenantDirectory;
use serde_json::Value;
use tower::ServiceExt;

fn router(directory: &MemoryTenantDirectory, secrets: &[(&str, &str)]) -> Router {
    let processor = CallbackProcessor::new(Arc::new(directory.clone()), CallbackResolver::new("GN"));
    let secrets: HashMap<TenantId, String> = secrets
        .iter()
        .map(|(t, s)| (TenantId::new(*t), s.to_string()))
        .collect();
    let state = GatewayState::new(Arc::new(processor))
        .with_webhook_secrets(secrets)
        .with_auth(AuthConfig {
            bearer_token: Some("operator-token".to_string()),
        });
    build_router(state)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_signed(uri: &str, body: &str, secret: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(signature::SIGNATURE_HEADER, signature::sign(secret, body.as_bytes()))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn get_on_webhook_reports_ready() {
    let directory = MemoryTenantDirectory::new();
    let request = Request::get("/sms/webhook/nimba").body(Body::empty()).unwrap();
    let (status, json) = send(router(&directory, &[]), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["message"], "Webhook endpoint is ready");
}

#[tokio::test]
async fn tenant_route_applies_report() {
    let directory = MemoryTenantDirectory::new();
    let acme = directory.add_tenant("acme").await;
    let message = directory
        .insert_message(&acme, "622000001", "hi", Some("abc"), false)
        .await;

    let request = post_json(
        "/sms/webhook/nimba/acme",
        r#"{"messageid":"abc","contact":"224622000001","status":"received"}"#,
    );
    let (status, json) = send(router(&directory, &[]), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    let stored = directory.message(&acme, message.id).await.unwrap();
    assert_eq!(stored.state, DeliveryState::Delivered);
}

#[tokio::test]
async fn signed_report_is_accepted() {
    let directory = MemoryTenantDirectory::new();
    let acme = directory.add_tenant("acme").await;
    directory
        .insert_message(&acme, "622000001", "hi", Some("abc"), false)
        .await;

    let body = r#"{"messageid":"abc","contact":"622000001","status":"failed"}"#;
    let request = post_signed("/sms/webhook/nimba/acme", body, "hook-secret");
    let (status, json) = send(router(&directory, &[("acme", "hook-secret")]), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
}

#[tokio::test]
async fn bad_signature_is_rejected_without_mutation() {
    let directory = MemoryTenantDirectory::new();
    let acme = directory.add_tenant("acme").await;
    let message = directory
        .insert_message(&acme, "622000001", "hi", Some("abc"), false)
        .await;

    let body = r#"{"messageid":"abc","contact":"622000001","status":"received"}"#;
    let request = post_signed("/sms/webhook/nimba/acme", body, "wrong-secret");
    let (status, json) = send(router(&directory, &[("acme", "hook-secret")]), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["status"], "error");
    let stored = directory.message(&acme, message.id).await.unwrap();
    assert_eq!(stored.state, DeliveryState::Pending);
    assert_eq!(directory.commits(&acme).await, 0);
}

#[tokio::test]
async fn missing_signature_is_rejected_when_secret_configured() {
    let directory = MemoryTenantDirectory::new();
    directory.add_tenant("acme").await;
    let request = post_json(
        "/sms/webhook/nimba/acme",
        r#"{"messageid":"abc","status":"received"}"#,
    );
    let (status, _) = send(router(&directory, &[("acme", "hook-secret")]), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_request_id_is_a_warning() {
    let directory = MemoryTenantDirectory::new();
    let acme = directory.add_tenant("acme").await;
    let message = directory
        .insert_message(&acme, "622000001", "hi", Some("abc"), false)
        .await;

    let request = post_json(
        "/sms/webhook/nimba/acme",
        r#"{"messageid":"zzz","contact":"622000001","status":"received"}"#,
    );
    let (status, json) = send(router(&directory, &[]), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "warning");
    let stored = directory.message(&acme, message.id).await.unwrap();
    assert_eq!(stored.state, DeliveryState::Pending);
}

#[tokio::test]
async fn unknown_tenant_is_a_warning() {
    let directory = MemoryTenantDirectory::new();
    let request = post_json(
        "/sms/webhook/nimba/ghost",
        r#"{"messageid":"abc","status":"received"}"#,
    );
    let (status, json) = send(router(&directory, &[]), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "warning");
}

#[tokio::test]
async fn missing_messageid_is_a_bad_request() {
    let directory = MemoryTenantDirectory::new();
    directory.add_tenant("acme").await;

    for uri in ["/sms/webhook/nimba", "/sms/webhook/nimba/acme"] {
        let request = post_json(uri, r#"{"status":"received"}"#);
        let (status, json) = send(router(&directory, &[]), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Missing messageid");
    }
}

#[tokio::test]
async fn fan_out_finds_the_owning_tenant() {
    let directory = MemoryTenantDirectory::new();
    let acme = directory.add_tenant("acme").await;
    let zeta = directory.add_tenant("zeta").await;
    directory
        .insert_message(&acme, "622000001", "hi", Some("other"), false)
        .await;
    let message = directory
        .insert_message(&zeta, "622000001", "hi", Some("abc"), false)
        .await;

    let request = post_json(
        "/sms/webhook/nimba",
        r#"{"messageid":"abc","contact":"622000001","status":"received"}"#,
    );
    let (status, json) = send(router(&directory, &[]), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    let stored = directory.message(&zeta, message.id).await.unwrap();
    assert_eq!(stored.state, DeliveryState::Delivered);
    assert_eq!(directory.commits(&acme).await, 0);
}

#[tokio::test]
async fn fan_out_miss_is_a_warning() {
    let directory = MemoryTenantDirectory::new();
    directory.add_tenant("acme").await;
    let request = post_json("/sms/webhook/nimba", r#"{"messageid":"abc","status":"failed"}"#);
    let (status, json) = send(router(&directory, &[]), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "warning");
    assert_eq!(json["message"], "SMS not found in any database");
}

#[tokio::test]
async fn form_encoded_report_is_accepted() {
    let directory = MemoryTenantDirectory::new();
    let acme = directory.add_tenant("acme").await;
    let message = directory
        .insert_message(&acme, "622000001", "hi", Some("abc"), false)
        .await;

    let request = Request::post("/sms/webhook/nimba/acme")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("messageid=abc&contact=622000001&status=failed&error=Handset+off"))
        .unwrap();
    let (status, _) = send(router(&directory, &[]), request).await;

    assert_eq!(status, StatusCode::OK);
    let stored = directory.message(&acme, message.id).await.unwrap();
    assert_eq!(stored.state, DeliveryState::Error);
    assert_eq!(stored.failure_reason.as_deref(), Some("Handset off"));
}

#[tokio::test]
async fn storage_failure_is_a_server_error() {
    let directory = MemoryTenantDirectory::new();
    directory.add_tenant("acme").await;
    directory.fail_tenant("acme").await;

    let request = post_json(
        "/sms/webhook/nimba/acme",
        r#"{"messageid":"abc","status":"received"}"#,
    );
    let (status, json) = send(router(&directory, &[]), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn webhook_test_requires_bearer_token() {
    let directory = MemoryTenantDirectory::new();

    let request = Request::get("/sms/webhook/test").body(Body::empty()).unwrap();
    let (status, _) = send(router(&directory, &[]), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::get("/sms/webhook/test")
        .header(header::AUTHORIZATION, "Bearer operator-token")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(router(&directory, &[]), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "active");
    assert_eq!(json["endpoint"], "/sms/webhook/nimba");
}

#[tokio::test]
async fn health_is_public() {
    let directory = MemoryTenantDirectory::new();
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, json) = send(router(&directory, &[]), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}
