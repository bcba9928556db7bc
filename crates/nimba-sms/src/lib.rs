// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nimba SMS dispatch and delivery-report reconciliation.
//!
//! Outbound, [`OutboundBatchSender`] groups messages by body and submits one
//! API request per group. Inbound, [`CallbackProcessor`] matches a report's
//! shared request id and contact number back to a single stored message,
//! either in a named tenant or by trying every tenant in turn.

pub mod callback;
pub mod client;
pub mod dispatch;
pub mod phone;
pub mod resolver;
pub mod routing;
pub mod sender;
pub mod signature;
pub mod status;

pub use callback::{CallbackOutcome, CallbackProcessor};
pub use client::{AccountResponse, NimbaClient, Rejection, SendMessagesRequest, SendResponse};
pub use dispatch::{DispatchSummary, flush_tenant};
pub use resolver::CallbackResolver;
pub use routing::{SenderRoute, select_route};
pub use sender::OutboundBatchSender;
