// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Nimba Relay.
//!
//! This crate provides the error type, the domain types, and the tenant
//! collaborator traits shared by the sender, the callback resolver, the
//! webhook gateway, and the storage layer.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::NimbaError;
pub use traits::{TenantDirectory, TenantSession};
pub use types::{
    AccountConfig, CallbackPayload, DeliveryState, FailureCategory, Message, OutboundSms,
    SendOutcome, SendResult, SmsProvider, StatusUpdate, TenantId, Tracker, TrackerEvent,
};
