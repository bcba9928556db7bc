// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits implemented by the host's persistence layer.

pub mod tenant;

pub use tenant::{TenantDirectory, TenantSession};
