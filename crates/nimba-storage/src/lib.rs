// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant SQLite persistence for Nimba Relay.
//!
//! Each tenant lives in its own database file. [`SqliteTenantDirectory`]
//! enumerates them and hands out isolated sessions whose writes are applied
//! in a single transaction on commit.

pub mod database;
pub mod directory;
pub mod migrations;
pub mod queries;

pub use database::Database;
pub use directory::{SqliteTenantDirectory, SqliteTenantSession};
pub use queries::messages::NewMessage;
