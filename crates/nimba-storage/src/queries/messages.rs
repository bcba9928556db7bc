// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use nimba_core::{DeliveryState, Message, NimbaError, SendResult, StatusUpdate};
use rusqlite::{Connection, OptionalExtension, params};

use super::{parse_column, parse_optional_column};
use crate::database::{Database, map_tr_err};

const MESSAGE_COLUMNS: &str = "id, uuid, number, body, state, request_id, failure_category, \
                               failure_reason, created_at, updated_at";

/// A message to queue for sending.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub number: String,
    pub body: String,
    /// Also create a status tracker linked to the message.
    pub track: bool,
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        uuid: row.get(1)?,
        number: row.get(2)?,
        body: row.get(3)?,
        state: parse_column(row, 4)?,
        request_id: row.get(5)?,
        failure_category: parse_optional_column(row, 6)?,
        failure_reason: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Insert an outgoing message (and its tracker when requested).
pub async fn insert_message(db: &Database, new: NewMessage) -> Result<Message, NimbaError> {
    let uuid = uuid::Uuid::new_v4().to_string();
    db.connection()
        .call(move |conn| -> Result<Message, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (uuid, number, body, state) VALUES (?1, ?2, ?3, 'outgoing')",
                params![uuid, new.number, new.body],
            )?;
            let id = tx.last_insert_rowid();
            if new.track {
                tx.execute(
                    "INSERT INTO trackers (sms_uuid, state) VALUES (?1, 'outgoing')",
                    params![uuid],
                )?;
            }
            let message = select_message(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(message)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a message by id.
pub async fn get_message(db: &Database, id: i64) -> Result<Option<Message>, NimbaError> {
    db.connection()
        .call(move |conn| select_message(conn, id))
        .await
        .map_err(map_tr_err)
}

fn select_message(conn: &Connection, id: i64) -> rusqlite::Result<Option<Message>> {
    conn.query_row(
        &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
        params![id],
        row_to_message,
    )
    .optional()
}

/// All messages sharing a provider request id, in insertion order.
pub async fn messages_by_request_id(
    db: &Database,
    request_id: &str,
) -> Result<Vec<Message>, NimbaError> {
    let request_id = request_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE request_id = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![request_id], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Messages still waiting to be submitted, oldest first.
pub async fn outgoing_messages(db: &Database, limit: usize) -> Result<Vec<Message>, NimbaError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE state = 'outgoing' \
                 ORDER BY id ASC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Current state of a message, if it exists.
pub fn current_state(conn: &Connection, id: i64) -> rusqlite::Result<Option<DeliveryState>> {
    conn.query_row(
        "SELECT state FROM messages WHERE id = ?1",
        params![id],
        |row| parse_column(row, 0),
    )
    .optional()
}

/// Apply a state change to a message.
///
/// Returns `false` when the message is missing or the change would move a
/// terminal message back to a non-terminal state.
pub fn apply_status_update(
    conn: &Connection,
    id: i64,
    update: &StatusUpdate,
) -> rusqlite::Result<bool> {
    match current_state(conn, id)? {
        Some(current) if current.can_transition_to(update.state) => {}
        _ => return Ok(false),
    }
    conn.execute(
        "UPDATE messages SET state = ?1, failure_category = ?2, failure_reason = ?3,
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?4",
        params![
            update.state.to_string(),
            update.failure_category.map(|c| c.to_string()),
            update.failure_reason,
            id,
        ],
    )?;
    Ok(true)
}

/// Record a provider submission outcome on a message and its tracker.
///
/// The shared request id lands on both rows so callbacks can find the
/// tracker under the same key as the message.
pub fn apply_send_result(conn: &Connection, result: &SendResult) -> rusqlite::Result<bool> {
    let update = result.status_update();
    if !apply_status_update(conn, result.message_id, &update)? {
        return Ok(false);
    }
    if let Some(request_id) = &result.request_id {
        conn.execute(
            "UPDATE messages SET request_id = ?1 WHERE id = ?2",
            params![request_id, result.message_id],
        )?;
    }

    let tracker_id: Option<i64> = conn
        .query_row(
            "SELECT t.id FROM trackers t JOIN messages m ON m.uuid = t.sms_uuid WHERE m.id = ?1",
            params![result.message_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(tracker_id) = tracker_id {
        if let Some(request_id) = &result.request_id {
            conn.execute(
                "UPDATE trackers SET request_id = ?1 WHERE id = ?2",
                params![request_id, tracker_id],
            )?;
        }
        super::trackers::apply_tracker_update(conn, tracker_id, &update)?;
    }
    Ok(true)
}
