// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed tenant directory: one database file per tenant.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nimba_core::{
    Message, NimbaError, SendResult, StatusUpdate, TenantDirectory, TenantId, TenantSession,
    Tracker,
};
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::queries::{messages, trackers};

const DB_EXTENSION: &str = "db";

/// Tenants stored as `<tenants_dir>/<tenant>.db`.
#[derive(Debug, Clone)]
pub struct SqliteTenantDirectory {
    tenants_dir: PathBuf,
    wal_mode: bool,
}

impl SqliteTenantDirectory {
    pub fn new(tenants_dir: impl Into<PathBuf>, wal_mode: bool) -> Self {
        Self {
            tenants_dir: tenants_dir.into(),
            wal_mode,
        }
    }

    pub fn tenants_dir(&self) -> &Path {
        &self.tenants_dir
    }

    /// Create (or migrate) a tenant database.
    pub async fn create_tenant(&self, name: &str) -> Result<TenantId, NimbaError> {
        let tenant = TenantId::new(name);
        let path = self.tenant_path(&tenant)?;
        tokio::fs::create_dir_all(&self.tenants_dir)
            .await
            .map_err(NimbaError::storage)?;
        Database::open(&path, self.wal_mode).await?.close().await?;
        debug!(tenant = %tenant, path = %path.display(), "tenant database created");
        Ok(tenant)
    }

    /// Open an existing tenant's database directly.
    pub async fn open_database(&self, tenant: &TenantId) -> Result<Database, NimbaError> {
        let path = self.tenant_path(tenant)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(NimbaError::TenantNotFound(tenant.to_string()));
        }
        Database::open(&path, self.wal_mode).await
    }

    fn tenant_path(&self, tenant: &TenantId) -> Result<PathBuf, NimbaError> {
        let name = tenant.as_str();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(NimbaError::TenantNotFound(name.to_string()));
        }
        Ok(self.tenants_dir.join(format!("{name}.{DB_EXTENSION}")))
    }
}

#[async_trait]
impl TenantDirectory for SqliteTenantDirectory {
    async fn list_tenants(&self) -> Result<Vec<TenantId>, NimbaError> {
        let mut entries = match tokio::fs::read_dir(&self.tenants_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.tenants_dir.display(), "tenants directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(NimbaError::storage(e)),
        };

        let mut tenants = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(NimbaError::storage)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tenants.push(TenantId::new(stem));
            }
        }
        tenants.sort();
        Ok(tenants)
    }

    async fn open_session(
        &self,
        tenant: &TenantId,
    ) -> Result<Box<dyn TenantSession>, NimbaError> {
        let db = self.open_database(tenant).await?;
        Ok(Box::new(SqliteTenantSession {
            tenant: tenant.clone(),
            db,
            staged: Vec::new(),
        }))
    }
}

/// A write waiting for [`TenantSession::commit`].
#[derive(Debug, Clone)]
enum StagedWrite {
    Message {
        message_id: i64,
        update: StatusUpdate,
    },
    Tracker {
        tracker_id: i64,
        message_id: i64,
        update: StatusUpdate,
    },
    SendResult(SendResult),
}

/// Session over one tenant database with its own connection.
pub struct SqliteTenantSession {
    tenant: TenantId,
    db: Database,
    staged: Vec<StagedWrite>,
}

#[async_trait]
impl TenantSession for SqliteTenantSession {
    fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    async fn messages_by_request_id(
        &mut self,
        request_id: &str,
    ) -> Result<Vec<Message>, NimbaError> {
        messages::messages_by_request_id(&self.db, request_id).await
    }

    async fn tracker_for(
        &mut self,
        message: &Message,
        request_id: &str,
    ) -> Result<Option<Tracker>, NimbaError> {
        trackers::tracker_for(&self.db, &message.uuid, request_id).await
    }

    async fn outgoing_messages(&mut self, limit: usize) -> Result<Vec<Message>, NimbaError> {
        messages::outgoing_messages(&self.db, limit).await
    }

    fn update_message(&mut self, message_id: i64, update: StatusUpdate) {
        self.staged.push(StagedWrite::Message { message_id, update });
    }

    fn update_tracker(&mut self, tracker: &Tracker, message_id: i64, update: StatusUpdate) {
        self.staged.push(StagedWrite::Tracker {
            tracker_id: tracker.id,
            message_id,
            update,
        });
    }

    fn record_send_result(&mut self, result: SendResult) {
        self.staged.push(StagedWrite::SendResult(result));
    }

    async fn commit(self: Box<Self>) -> Result<usize, NimbaError> {
        let SqliteTenantSession { tenant, db, staged } = *self;
        if staged.is_empty() {
            return Ok(0);
        }

        let applied = db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let tx = conn.transaction()?;
                let mut applied = 0;
                for write in &staged {
                    let changed = match write {
                        StagedWrite::Message { message_id, update } => {
                            messages::apply_status_update(&tx, *message_id, update)?
                        }
                        StagedWrite::Tracker {
                            tracker_id,
                            message_id,
                            update,
                        } => {
                            let tracker_changed =
                                trackers::apply_tracker_update(&tx, *tracker_id, update)?;
                            let message_changed =
                                messages::apply_status_update(&tx, *message_id, update)?;
                            tracker_changed || message_changed
                        }
                        StagedWrite::SendResult(result) => {
                            messages::apply_send_result(&tx, result)?
                        }
                    };
                    if changed {
                        applied += 1;
                    }
                }
                tx.commit()?;
                Ok(applied)
            })
            .await
            .map_err(map_tr_err)?;

        debug!(tenant = %tenant, applied, "tenant session committed");
        Ok(applied)
    }
}
