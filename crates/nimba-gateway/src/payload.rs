// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery-report parsing.
//!
//! Reports arrive as JSON or as form parameters. A JSON body that fails to
//! decode is logged and the form parameters (query string) are used instead.

use std::collections::HashMap;

use axum::http::{HeaderMap, header::CONTENT_TYPE};
use nimba_core::{CallbackPayload, NimbaError};
use serde_json::Value;
use tracing::error;

/// Build a [`CallbackPayload`] from the request pieces.
///
/// Fails only when no `messageid` can be found by either path.
pub fn parse_payload(
    headers: &HeaderMap,
    query: Option<&str>,
    body: &[u8],
) -> Result<CallbackPayload, NimbaError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut params: HashMap<String, Value> = query
        .map(form_pairs)
        .unwrap_or_default();

    if content_type.contains("json") {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => params.extend(fields),
            Ok(other) => {
                error!(kind = %json_kind(&other), "webhook JSON body is not an object, using form parameters");
            }
            Err(e) => {
                error!(error = %e, "failed to decode webhook JSON body, using form parameters");
            }
        }
    } else if !body.is_empty() {
        params.extend(form_pairs_bytes(body));
    }

    let request_id = text(params.get("messageid"))
        .ok_or_else(|| NimbaError::Payload("Missing messageid".to_string()))?;

    Ok(CallbackPayload {
        request_id,
        contact: text(params.get("contact")),
        status: text(params.get("status")).unwrap_or_default(),
        error: text(params.get("error")),
        metadata: params.remove("metadata").filter(|v| !v.is_null()),
    })
}

fn form_pairs(raw: &str) -> HashMap<String, Value> {
    form_pairs_bytes(raw.as_bytes())
}

fn form_pairs_bytes(raw: &[u8]) -> HashMap<String, Value> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw)
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

/// Non-empty text of a scalar JSON value.
fn text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    #[test]
    fn parses_json_body() {
        let body = br#"{"messageid":"abc","contact":"224622000001","status":"failed","error":"x","metadata":{"k":1}}"#;
        let payload = parse_payload(&json_headers(), None, body).unwrap();
        assert_eq!(payload.request_id, "abc");
        assert_eq!(payload.contact.as_deref(), Some("224622000001"));
        assert_eq!(payload.status, "failed");
        assert_eq!(payload.error.as_deref(), Some("x"));
        assert_eq!(payload.metadata, Some(serde_json::json!({"k": 1})));
    }

    #[test]
    fn numeric_fields_become_text() {
        let body = br#"{"messageid":12345,"contact":224622000001,"status":"received"}"#;
        let payload = parse_payload(&json_headers(), None, body).unwrap();
        assert_eq!(payload.request_id, "12345");
        assert_eq!(payload.contact.as_deref(), Some("224622000001"));
    }

    #[test]
    fn parses_form_body() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let payload = parse_payload(
            &headers,
            None,
            b"messageid=abc&contact=%2B224622000001&status=received",
        )
        .unwrap();
        assert_eq!(payload.request_id, "abc");
        assert_eq!(payload.contact.as_deref(), Some("+224622000001"));
    }

    #[test]
    fn broken_json_falls_back_to_query_parameters() {
        let payload = parse_payload(
            &json_headers(),
            Some("messageid=abc&status=received"),
            b"{not json",
        )
        .unwrap();
        assert_eq!(payload.request_id, "abc");
        assert_eq!(payload.status, "received");
    }

    #[test]
    fn missing_messageid_is_a_payload_error() {
        let err = parse_payload(&json_headers(), None, br#"{"status":"received"}"#).unwrap_err();
        assert!(matches!(err, NimbaError::Payload(msg) if msg == "Missing messageid"));

        let err = parse_payload(&json_headers(), None, br#"{"messageid":"  "}"#).unwrap_err();
        assert!(matches!(err, NimbaError::Payload(_)));
    }
}
