// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Nimba Relay integration tests.
//!
//! - [`MemoryTenantDirectory`]: in-memory tenants with failure injection
//! - [`SqliteHarness`]: real SQLite tenants in a temp directory
//! - [`fixtures`]: message builders

pub mod fixtures;
pub mod harness;
pub mod memory;

pub use harness::SqliteHarness;
pub use memory::MemoryTenantDirectory;
