// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Nimba SMS API.
//!
//! Authenticates with HTTP Basic (`service_id:secret_token`) and exposes the
//! two endpoints the relay needs: message submission and account lookup.

use std::time::Duration;

use nimba_core::{FailureCategory, NimbaError};
use serde::Serialize;
use tracing::debug;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.nimbasms.com";

/// Body of `POST /v1/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessagesRequest {
    pub sender_name: String,
    /// Wire-formatted recipient numbers.
    pub to: Vec<String>,
    pub message: String,
}

/// A non-2xx answer from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: u16,
    pub message: String,
}

impl Rejection {
    /// Best-effort classification of the rejection.
    pub fn category(&self) -> FailureCategory {
        let message = self.message.to_lowercase();
        match self.status {
            401 | 403 => FailureCategory::AuthError,
            402 => FailureCategory::InsufficientBalance,
            _ if message.contains("balance") || message.contains("credit") => {
                FailureCategory::InsufficientBalance
            }
            _ if message.contains("sender") => FailureCategory::InvalidSender,
            _ if message.contains("number") || message.contains("contact") => {
                FailureCategory::WrongNumberFormat
            }
            500..=599 => FailureCategory::ServerError,
            _ => FailureCategory::Unknown,
        }
    }
}

/// Outcome of a message submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResponse {
    /// Accepted. The id is shared by every recipient of the request.
    Accepted { request_id: Option<String> },
    Rejected(Rejection),
}

/// Outcome of an account lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountResponse {
    Balance(f64),
    Rejected(Rejection),
}

/// Nimba API client.
#[derive(Clone)]
pub struct NimbaClient {
    client: reqwest::Client,
    base_url: String,
    service_id: String,
    secret_token: String,
}

impl std::fmt::Debug for NimbaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NimbaClient")
            .field("base_url", &self.base_url)
            .field("service_id", &self.service_id)
            .field("secret_token", &"[redacted]")
            .finish()
    }
}

impl NimbaClient {
    /// Build a client for one account.
    pub fn new(
        service_id: impl Into<String>,
        secret_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NimbaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NimbaError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            service_id: service_id.into(),
            secret_token: secret_token.into(),
        })
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit one message body to a list of recipients.
    pub async fn send_messages(
        &self,
        request: &SendMessagesRequest,
    ) -> Result<SendResponse, NimbaError> {
        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.service_id, Some(&self.secret_token))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(status = %status, recipients = request.to.len(), "send response received");

        if status.is_success() {
            Ok(SendResponse::Accepted {
                request_id: request_id_from(&body),
            })
        } else {
            Ok(SendResponse::Rejected(Rejection {
                status: status.as_u16(),
                message: error_message(&body),
            }))
        }
    }

    /// Fetch the account balance.
    pub async fn account(&self) -> Result<AccountResponse, NimbaError> {
        let url = format!("{}/v1/accounts", self.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.service_id, Some(&self.secret_token))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Ok(AccountResponse::Rejected(Rejection {
                status: status.as_u16(),
                message: error_message(&body),
            }));
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| NimbaError::Provider {
                message: format!("unreadable account response: {e}"),
                source: Some(Box::new(e)),
            })?;
        let balance = value
            .get("balance")
            .and_then(json_number)
            .ok_or_else(|| NimbaError::Provider {
                message: "account response has no balance".to_string(),
                source: None,
            })?;
        Ok(AccountResponse::Balance(balance))
    }
}

fn transport_error(e: reqwest::Error) -> NimbaError {
    NimbaError::Provider {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The `messageid` of a success body, as a string.
fn request_id_from(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("messageid")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Error text: JSON `message`, then `detail`, then the raw body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "detail"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                    return s.clone();
                }
                Some(other) if !other.is_null() && !other.is_string() => {
                    return other.to_string();
                }
                _ => {}
            }
        }
    }
    let raw = body.trim();
    if raw.is_empty() {
        "No error details available".to_string()
    } else {
        raw.to_string()
    }
}
