// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite tenant directory and its sessions.

use nimba_core::{
    DeliveryState, FailureCategory, NimbaError, SendResult, StatusUpdate, TenantDirectory,
    TenantId,
};
use nimba_storage::queries::{messages, trackers};
use nimba_storage::{NewMessage, SqliteTenantDirectory};
use tempfile::tempdir;

fn failed(reason: &str) -> StatusUpdate {
    StatusUpdate {
        state: DeliveryState::Error,
        failure_category: Some(FailureCategory::DeliveryFailure),
        failure_reason: Some(reason.to_string()),
    }
}

async fn queue(dir: &SqliteTenantDirectory, tenant: &TenantId, number: &str, track: bool) -> i64 {
    let db = dir.open_database(tenant).await.unwrap();
    let message = messages::insert_message(
        &db,
        NewMessage {
            number: number.to_string(),
            body: "hello".to_string(),
            track,
        },
    )
    .await
    .unwrap();
    message.id
}

#[tokio::test]
async fn lists_tenants_sorted_and_ignores_other_files() {
    let dir = tempdir().unwrap();
    let directory = SqliteTenantDirectory::new(dir.path(), true);
    directory.create_tenant("zeta").await.unwrap();
    directory.create_tenant("acme").await.unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a tenant").unwrap();

    let tenants = directory.list_tenants().await.unwrap();
    assert_eq!(tenants, vec![TenantId::new("acme"), TenantId::new("zeta")]);
}

#[tokio::test]
async fn missing_directory_lists_no_tenants() {
    let dir = tempdir().unwrap();
    let directory = SqliteTenantDirectory::new(dir.path().join("absent"), true);
    assert!(directory.list_tenants().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_tenant_is_not_found() {
    let dir = tempdir().unwrap();
    let directory = SqliteTenantDirectory::new(dir.path(), true);
    let err = directory
        .open_session(&TenantId::new("ghost"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, NimbaError::TenantNotFound(name) if name == "ghost"));
}

#[tokio::test]
async fn path_like_tenant_names_are_rejected() {
    let dir = tempdir().unwrap();
    let directory = SqliteTenantDirectory::new(dir.path(), true);
    assert!(directory.create_tenant("../escape").await.is_err());
}

#[tokio::test]
async fn staged_writes_need_commit() {
    let dir = tempdir().unwrap();
    let directory = SqliteTenantDirectory::new(dir.path(), true);
    let tenant = directory.create_tenant("acme").await.unwrap();
    let id = queue(&directory, &tenant, "622000001", false).await;

    let mut session = directory.open_session(&tenant).await.unwrap();
    session.record_send_result(SendResult::success(id, Some("abc".into())));
    drop(session);

    let mut session = directory.open_session(&tenant).await.unwrap();
    assert!(session.messages_by_request_id("abc").await.unwrap().is_empty());
    session.record_send_result(SendResult::success(id, Some("abc".into())));
    assert_eq!(session.commit().await.unwrap(), 1);

    let mut session = directory.open_session(&tenant).await.unwrap();
    let batch = session.messages_by_request_id("abc").await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].state, DeliveryState::Pending);
}

#[tokio::test]
async fn tracker_update_also_updates_message() {
    let dir = tempdir().unwrap();
    let directory = SqliteTenantDirectory::new(dir.path(), true);
    let tenant = directory.create_tenant("acme").await.unwrap();
    let id = queue(&directory, &tenant, "622000001", true).await;

    let mut session = directory.open_session(&tenant).await.unwrap();
    session.record_send_result(SendResult::success(id, Some("abc".into())));
    session.commit().await.unwrap();

    let mut session = directory.open_session(&tenant).await.unwrap();
    let message = session.messages_by_request_id("abc").await.unwrap().remove(0);
    let tracker = session.tracker_for(&message, "abc").await.unwrap().unwrap();
    session.update_tracker(&tracker, message.id, failed("Delivery failed"));
    session.commit().await.unwrap();

    let db = directory.open_database(&tenant).await.unwrap();
    let stored = messages::get_message(&db, id).await.unwrap().unwrap();
    assert_eq!(stored.state, DeliveryState::Error);
    assert_eq!(stored.failure_reason.as_deref(), Some("Delivery failed"));

    let history = trackers::tracker_events(&db, tracker.id).await.unwrap();
    let states: Vec<_> = history.iter().map(|e| e.state).collect();
    assert_eq!(states, vec![DeliveryState::Pending, DeliveryState::Error]);
}

#[tokio::test]
async fn sessions_are_isolated_per_tenant() {
    let dir = tempdir().unwrap();
    let directory = SqliteTenantDirectory::new(dir.path(), true);
    let acme = directory.create_tenant("acme").await.unwrap();
    let zeta = directory.create_tenant("zeta").await.unwrap();
    let id = queue(&directory, &acme, "622000001", false).await;

    let mut session = directory.open_session(&acme).await.unwrap();
    session.record_send_result(SendResult::success(id, Some("abc".into())));
    session.commit().await.unwrap();

    let mut other = directory.open_session(&zeta).await.unwrap();
    assert!(other.messages_by_request_id("abc").await.unwrap().is_empty());
    assert_eq!(other.tenant(), &zeta);
}
