// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message fixtures.

use nimba_core::{DeliveryState, Message, OutboundSms};

pub const TIMESTAMP: &str = "2026-01-01T00:00:00.000Z";

/// A stored message with the given id, number, state and request id.
pub fn message(id: i64, number: &str, state: DeliveryState, request_id: Option<&str>) -> Message {
    Message {
        id,
        uuid: format!("sms-{id}"),
        number: number.to_string(),
        body: "hello".to_string(),
        state,
        request_id: request_id.map(str::to_string),
        failure_category: None,
        failure_reason: None,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    }
}

/// Batch-sender input.
pub fn outbound(id: i64, number: &str, body: &str) -> OutboundSms {
    OutboundSms {
        message_id: id,
        number: number.to_string(),
        body: body.to_string(),
    }
}
