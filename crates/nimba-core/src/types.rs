// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the sender, the callback resolver, and storage.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies one tenant (one isolated host database).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery state of an outbound message, in the host's vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Queued locally, not yet submitted to a provider.
    Outgoing,
    /// Accepted by the provider, waiting for a delivery report.
    Pending,
    /// Delivered to the handset.
    Delivered,
    /// Submission or delivery failed.
    Error,
}

impl DeliveryState {
    /// `Delivered` and `Error` are terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryState::Delivered | DeliveryState::Error)
    }

    /// Terminal states may be overwritten by other terminal states but never
    /// regress to a non-terminal one.
    pub fn can_transition_to(self, next: DeliveryState) -> bool {
        !self.is_terminal() || next.is_terminal()
    }
}

/// Why a message failed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    ServerError,
    DeliveryFailure,
    AuthError,
    InvalidSender,
    InsufficientBalance,
    WrongNumberFormat,
    Unknown,
}

impl FailureCategory {
    /// Human-readable explanation shown next to a failed message.
    pub fn description(self) -> &'static str {
        match self {
            FailureCategory::ServerError => "Server error - please try again",
            FailureCategory::DeliveryFailure => "The provider could not deliver the message",
            FailureCategory::AuthError => "Authentication error - check API credentials",
            FailureCategory::InvalidSender => "Invalid sender name - verify it's approved",
            FailureCategory::InsufficientBalance => "Insufficient balance in your account",
            FailureCategory::WrongNumberFormat => "Invalid phone number format",
            FailureCategory::Unknown => "Unknown error - contact support",
        }
    }
}

/// SMS provider selected by a tenant's account configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    /// The host framework's own gateway.
    Iap,
    Twilio,
    #[default]
    Nimba,
}

/// Outcome of submitting one message to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    Success,
    ServerError,
}

/// One outbound SMS as stored by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    /// Stable correlation key linking the message to its tracker.
    pub uuid: String,
    /// Destination number in the form the user entered it.
    pub number: String,
    pub body: String,
    pub state: DeliveryState,
    /// Provider request identifier, shared by every message of a batch.
    pub request_id: Option<String>,
    pub failure_category: Option<FailureCategory>,
    pub failure_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Status-tracking companion of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: i64,
    /// Equals the linked message's `uuid`.
    pub sms_uuid: String,
    pub request_id: Option<String>,
    pub state: DeliveryState,
    pub failure_reason: Option<String>,
    pub updated_at: String,
}

/// One entry in a tracker's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    pub id: i64,
    pub tracker_id: i64,
    pub state: DeliveryState,
    pub failure_reason: Option<String>,
    pub created_at: String,
}

/// A state change to apply to a message or tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub state: DeliveryState,
    pub failure_category: Option<FailureCategory>,
    pub failure_reason: Option<String>,
}

/// Input of the batch sender: one message to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
    pub message_id: i64,
    pub number: String,
    pub body: String,
}

impl From<&Message> for OutboundSms {
    fn from(msg: &Message) -> Self {
        Self {
            message_id: msg.id,
            number: msg.number.clone(),
            body: msg.body.clone(),
        }
    }
}

/// Per-message result of a batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    pub message_id: i64,
    pub outcome: SendOutcome,
    pub request_id: Option<String>,
    pub failure_category: Option<FailureCategory>,
    pub failure_reason: Option<String>,
}

impl SendResult {
    pub fn success(message_id: i64, request_id: Option<String>) -> Self {
        Self {
            message_id,
            outcome: SendOutcome::Success,
            request_id,
            failure_category: None,
            failure_reason: None,
        }
    }

    pub fn server_error(message_id: i64, reason: impl Into<String>) -> Self {
        Self {
            message_id,
            outcome: SendOutcome::ServerError,
            request_id: None,
            failure_category: Some(FailureCategory::ServerError),
            failure_reason: Some(reason.into()),
        }
    }

    /// The host-side state this result translates to. A successful
    /// submission is only in flight; the delivery report settles it later.
    pub fn status_update(&self) -> StatusUpdate {
        match self.outcome {
            SendOutcome::Success => StatusUpdate {
                state: DeliveryState::Pending,
                failure_category: None,
                failure_reason: None,
            },
            SendOutcome::ServerError => StatusUpdate {
                state: DeliveryState::Error,
                failure_category: self.failure_category.or(Some(FailureCategory::ServerError)),
                failure_reason: self.failure_reason.clone(),
            },
        }
    }
}

/// Per-tenant provider credentials. Read-only to the core.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccountConfig {
    pub provider: SmsProvider,
    pub service_id: String,
    pub secret_token: String,
    pub sender_name: String,
}

impl AccountConfig {
    /// Names of the credential fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.service_id.trim().is_empty() {
            missing.push("service_id");
        }
        if self.secret_token.trim().is_empty() {
            missing.push("secret_token");
        }
        if self.sender_name.trim().is_empty() {
            missing.push("sender_name");
        }
        missing
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("provider", &self.provider)
            .field("service_id", &self.service_id)
            .field("secret_token", &"[redacted]")
            .field("sender_name", &self.sender_name)
            .finish()
    }
}

/// Delivery report pushed by the provider. Consumed once, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackPayload {
    /// Provider request identifier (`messageid`).
    pub request_id: String,
    /// Recipient number the report is about (`contact`).
    pub contact: Option<String>,
    /// Provider status word, e.g. `received` or `failed`.
    pub status: String,
    pub error: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
