// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider status vocabulary to host delivery states.

use nimba_core::{DeliveryState, FailureCategory, StatusUpdate};

/// Result of mapping one provider status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedStatus {
    pub state: DeliveryState,
    pub failure_category: Option<FailureCategory>,
}

/// Map a provider status, case-insensitively.
///
/// Anything other than `received` is a delivery failure, so an unknown
/// status can never be mistaken for success.
pub fn map_status(provider_status: &str) -> MappedStatus {
    if provider_status.trim().eq_ignore_ascii_case("received") {
        MappedStatus {
            state: DeliveryState::Delivered,
            failure_category: None,
        }
    } else {
        MappedStatus {
            state: DeliveryState::Error,
            failure_category: Some(FailureCategory::DeliveryFailure),
        }
    }
}

/// The full update a delivery report applies to a message.
///
/// The reason is the report's error text when present, otherwise a default
/// naming the status. Delivered messages carry no reason.
pub fn status_update(provider_status: &str, error: Option<&str>) -> StatusUpdate {
    let mapped = map_status(provider_status);
    let failure_reason = match mapped.state {
        DeliveryState::Delivered => None,
        _ => Some(
            error
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_reason(provider_status)),
        ),
    };
    StatusUpdate {
        state: mapped.state,
        failure_category: mapped.failure_category,
        failure_reason,
    }
}

fn default_reason(provider_status: &str) -> String {
    if provider_status.trim().eq_ignore_ascii_case("failed") {
        "Delivery failed".to_string()
    } else {
        format!("unrecognized provider status '{}'", provider_status.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_is_delivered_in_any_case() {
        for status in ["received", "RECEIVED", "Received", " received "] {
            let mapped = map_status(status);
            assert_eq!(mapped.state, DeliveryState::Delivered, "{status}");
            assert_eq!(mapped.failure_category, None);
        }
    }

    #[test]
    fn failed_and_unknown_are_delivery_failures() {
        for status in ["failed", "FAILED", "anything-else", ""] {
            let mapped = map_status(status);
            assert_eq!(mapped.state, DeliveryState::Error, "{status}");
            assert_eq!(
                mapped.failure_category,
                Some(FailureCategory::DeliveryFailure)
            );
        }
    }

    #[test]
    fn failure_reason_prefers_report_text() {
        let update = status_update("failed", Some("Handset unreachable"));
        assert_eq!(update.failure_reason.as_deref(), Some("Handset unreachable"));

        let update = status_update("failed", Some("  "));
        assert_eq!(update.failure_reason.as_deref(), Some("Delivery failed"));

        let update = status_update("expired", None);
        assert_eq!(
            update.failure_reason.as_deref(),
            Some("unrecognized provider status 'expired'")
        );
    }

    #[test]
    fn delivered_clears_reason() {
        let update = status_update("received", Some("ignored"));
        assert_eq!(update.state, DeliveryState::Delivered);
        assert!(update.failure_reason.is_none());
        assert!(update.failure_category.is_none());
    }
}
