// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection management for one tenant database.
//!
//! Every statement runs on tokio-rusqlite's background thread. A `Database`
//! belongs to exactly one tenant and is never shared across tenants.

use std::path::{Path, PathBuf};

use nimba_core::NimbaError;
use tracing::debug;

use crate::migrations;

/// A migrated SQLite database for one tenant.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) and migrate the database at `path`.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, NimbaError> {
        let path = path.as_ref().to_path_buf();

        // Journal mode and migrations run once on a plain connection so the
        // async connection below only carries per-connection pragmas.
        let setup_path = path.clone();
        tokio::task::spawn_blocking(move || prepare(&setup_path, wal_mode))
            .await
            .map_err(|e| NimbaError::Internal(format!("database setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(NimbaError::storage)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path.display(), "tenant database opened");
        Ok(Self { conn, path })
    }

    /// The tokio-rusqlite connection all queries go through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), NimbaError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(NimbaError::storage)?;
        Ok(())
    }
}

fn prepare(path: &Path, wal_mode: bool) -> Result<(), NimbaError> {
    let mut conn = rusqlite::Connection::open(path).map_err(NimbaError::storage)?;
    if wal_mode {
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(NimbaError::storage)?;
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(NimbaError::storage)?;
    migrations::run_migrations(&mut conn)
}

/// Map a tokio-rusqlite error into a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> NimbaError {
    NimbaError::Storage {
        source: Box::new(e),
    }
}
