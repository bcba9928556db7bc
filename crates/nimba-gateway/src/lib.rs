// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway receiving Nimba SMS delivery reports.
//!
//! Reports posted to `/sms/webhook/nimba/{tenant}` are signature-checked and
//! applied to that tenant. Reports posted to `/sms/webhook/nimba` are tried
//! against every tenant in turn.

pub mod auth;
pub mod handlers;
pub mod payload;
pub mod server;

pub use auth::AuthConfig;
pub use payload::parse_payload;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
