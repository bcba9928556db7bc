// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Nimba Relay.

use thiserror::Error;

/// The primary error type used across the Nimba Relay crates.
#[derive(Debug, Error)]
pub enum NimbaError {
    /// Configuration errors (invalid TOML, bad values, unusable settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// SMS provider errors (transport failure, unreadable response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The requested tenant database does not exist.
    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    /// An inbound payload could not be understood.
    #[error("invalid payload: {0}")]
    Payload(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NimbaError {
    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        NimbaError::Storage {
            source: Box::new(err),
        }
    }
}
