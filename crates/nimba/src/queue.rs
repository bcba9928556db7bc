// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nimba queue` command implementation.
//!
//! Creates the tenant database on first use.

use nimba_config::NimbaConfig;
use nimba_core::NimbaError;
use nimba_storage::NewMessage;
use nimba_storage::queries::messages;
use tracing::info;

pub async fn run_queue(
    config: &NimbaConfig,
    tenant: &str,
    to: &str,
    body: &str,
    track: bool,
) -> Result<(), NimbaError> {
    let directory = crate::tenant_directory(config);
    let tenant = directory.create_tenant(tenant).await?;
    let db = directory.open_database(&tenant).await?;

    let message = messages::insert_message(
        &db,
        NewMessage {
            number: to.to_string(),
            body: body.to_string(),
            track,
        },
    )
    .await?;
    db.close().await?;

    info!(tenant = %tenant, message_id = message.id, track, "message queued");
    println!("{tenant}: queued message {} ({}) for {}", message.id, message.uuid, message.number);
    Ok(())
}
