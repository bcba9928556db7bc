// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! SQL files under `migrations/` are compiled into the binary with
//! `embed_migrations!` and applied whenever a tenant database is opened.

use nimba_core::NimbaError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), NimbaError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(NimbaError::storage)?;
    Ok(())
}
