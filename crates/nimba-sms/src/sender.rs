// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound batch submission.
//!
//! Messages are grouped by body and each group goes out as one API request
//! with every recipient. The provider answers with a single request id,
//! which is copied onto each message of the group.

use std::time::Duration;

use nimba_core::{AccountConfig, OutboundSms, SendResult};
use tracing::{error, info, warn};

use crate::client::{NimbaClient, SendMessagesRequest, SendResponse};
use crate::phone;

/// Messages sharing one body, as indices into the input slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyGroup<'a> {
    pub body: &'a str,
    pub indices: Vec<usize>,
}

/// Group messages by exact body text, in order of first appearance.
pub fn group_by_body(messages: &[OutboundSms]) -> Vec<BodyGroup<'_>> {
    let mut groups: Vec<BodyGroup<'_>> = Vec::new();
    for (idx, message) in messages.iter().enumerate() {
        match groups.iter_mut().find(|g| g.body == message.body) {
            Some(group) => group.indices.push(idx),
            None => groups.push(BodyGroup {
                body: &message.body,
                indices: vec![idx],
            }),
        }
    }
    groups
}

/// Submits batches through the Nimba API.
#[derive(Debug, Clone)]
pub struct OutboundBatchSender {
    base_url: String,
    timeout: Duration,
    default_region: String,
}

impl OutboundBatchSender {
    pub fn new(base_url: impl Into<String>, timeout: Duration, default_region: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
            default_region: default_region.into(),
        }
    }

    /// Send `messages` with `account` and return one result per message,
    /// in input order.
    pub async fn send_batch(
        &self,
        account: &AccountConfig,
        messages: &[OutboundSms],
    ) -> Vec<SendResult> {
        if messages.is_empty() {
            return Vec::new();
        }

        let missing = account.missing_fields();
        if !missing.is_empty() {
            let reason = format!("Provider not configured: missing {}", missing.join(", "));
            error!(missing = %missing.join(", "), count = messages.len(), "cannot send batch");
            return fail_all(messages, &reason);
        }

        let client = match NimbaClient::new(
            account.service_id.clone(),
            account.secret_token.clone(),
            self.timeout,
        ) {
            Ok(client) => client.with_base_url(self.base_url.clone()),
            Err(e) => {
                error!(error = %e, "cannot build provider client");
                return fail_all(messages, &e.to_string());
            }
        };

        let mut results: Vec<Option<SendResult>> = vec![None; messages.len()];
        for group in group_by_body(messages) {
            let request = SendMessagesRequest {
                sender_name: account.sender_name.clone(),
                to: group
                    .indices
                    .iter()
                    .map(|&i| phone::format_for_wire(&messages[i].number, &self.default_region))
                    .collect(),
                message: group.body.to_string(),
            };

            let outcome = client.send_messages(&request).await;
            for &i in &group.indices {
                let id = messages[i].message_id;
                results[i] = Some(match &outcome {
                    Ok(SendResponse::Accepted { request_id }) => {
                        SendResult::success(id, request_id.clone())
                    }
                    Ok(SendResponse::Rejected(rejection)) => {
                        SendResult::server_error(id, rejection.message.clone())
                    }
                    Err(e) => SendResult::server_error(id, e.to_string()),
                });
            }

            match &outcome {
                Ok(SendResponse::Accepted {
                    request_id: Some(request_id),
                }) => info!(
                    request_id = %request_id,
                    recipients = group.indices.len(),
                    "batch accepted by provider"
                ),
                Ok(SendResponse::Accepted { request_id: None }) => warn!(
                    recipients = group.indices.len(),
                    "provider accepted batch without a messageid; delivery reports cannot be matched"
                ),
                Ok(SendResponse::Rejected(rejection)) => warn!(
                    status = rejection.status,
                    message = %rejection.message,
                    recipients = group.indices.len(),
                    "batch rejected by provider"
                ),
                Err(e) => warn!(
                    error = %e,
                    recipients = group.indices.len(),
                    "batch submission failed"
                ),
            }
        }

        results.into_iter().flatten().collect()
    }
}

fn fail_all(messages: &[OutboundSms], reason: &str) -> Vec<SendResult> {
    messages
        .iter()
        .map(|m| SendResult::server_error(m.message_id, reason))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sms(id: i64, number: &str, body: &str) -> OutboundSms {
        OutboundSms {
            message_id: id,
            number: number.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn groups_by_exact_body_in_first_seen_order() {
        let messages = vec![
            sms(1, "622000001", "b"),
            sms(2, "622000002", "a"),
            sms(3, "622000003", "b"),
            sms(4, "622000004", "B"),
        ];
        let groups = group_by_body(&messages);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], BodyGroup { body: "b", indices: vec![0, 2] });
        assert_eq!(groups[1], BodyGroup { body: "a", indices: vec![1] });
        assert_eq!(groups[2], BodyGroup { body: "B", indices: vec![3] });
    }

    #[test]
    fn grouping_is_deterministic() {
        let messages = vec![sms(1, "1", "x"), sms(2, "2", "y"), sms(3, "3", "x")];
        assert_eq!(group_by_body(&messages), group_by_body(&messages));
    }
}
