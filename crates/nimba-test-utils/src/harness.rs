// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite tenants in a temporary directory.

use nimba_core::{Message, NimbaError, TenantId};
use nimba_storage::queries::messages;
use nimba_storage::{Database, NewMessage, SqliteTenantDirectory};
use tempfile::TempDir;

/// Builder for [`SqliteHarness`].
pub struct SqliteHarnessBuilder {
    tenants: Vec<String>,
    wal_mode: bool,
}

impl SqliteHarnessBuilder {
    fn new() -> Self {
        Self {
            tenants: Vec::new(),
            wal_mode: true,
        }
    }

    /// Create this tenant's database up front.
    pub fn with_tenant(mut self, name: &str) -> Self {
        self.tenants.push(name.to_string());
        self
    }

    pub fn with_wal_mode(mut self, wal_mode: bool) -> Self {
        self.wal_mode = wal_mode;
        self
    }

    pub async fn build(self) -> Result<SqliteHarness, NimbaError> {
        let temp_dir = TempDir::new().map_err(NimbaError::storage)?;
        let directory = SqliteTenantDirectory::new(temp_dir.path().join("tenants"), self.wal_mode);
        for name in &self.tenants {
            directory.create_tenant(name).await?;
        }
        Ok(SqliteHarness {
            _temp_dir: temp_dir,
            directory,
        })
    }
}

/// A tenant directory that is deleted when the harness drops.
pub struct SqliteHarness {
    _temp_dir: TempDir,
    directory: SqliteTenantDirectory,
}

impl SqliteHarness {
    pub fn builder() -> SqliteHarnessBuilder {
        SqliteHarnessBuilder::new()
    }

    pub fn directory(&self) -> &SqliteTenantDirectory {
        &self.directory
    }

    pub async fn database(&self, tenant: &str) -> Result<Database, NimbaError> {
        self.directory.open_database(&TenantId::new(tenant)).await
    }

    /// Queue an outgoing message in a tenant.
    pub async fn queue(
        &self,
        tenant: &str,
        number: &str,
        body: &str,
        track: bool,
    ) -> Result<Message, NimbaError> {
        let db = self.database(tenant).await?;
        messages::insert_message(
            &db,
            NewMessage {
                number: number.to_string(),
                body: body.to_string(),
                track,
            },
        )
        .await
    }

    /// Read a message back.
    pub async fn message(&self, tenant: &str, id: i64) -> Result<Option<Message>, NimbaError> {
        let db = self.database(tenant).await?;
        messages::get_message(&db, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimba_core::{DeliveryState, TenantDirectory};

    #[tokio::test]
    async fn builds_requested_tenants() {
        let harness = SqliteHarness::builder()
            .with_tenant("acme")
            .with_tenant("zeta")
            .build()
            .await
            .unwrap();
        let tenants = harness.directory().list_tenants().await.unwrap();
        assert_eq!(tenants.len(), 2);

        let queued = harness.queue("acme", "622000001", "hi", false).await.unwrap();
        let stored = harness.message("acme", queued.id).await.unwrap().unwrap();
        assert_eq!(stored.state, DeliveryState::Outgoing);
    }
}
