// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracker lookups and status history.

use nimba_core::{NimbaError, StatusUpdate, Tracker, TrackerEvent};
use rusqlite::{Connection, OptionalExtension, params};

use super::parse_column;
use crate::database::{Database, map_tr_err};

fn row_to_tracker(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tracker> {
    Ok(Tracker {
        id: row.get(0)?,
        sms_uuid: row.get(1)?,
        request_id: row.get(2)?,
        state: parse_column(row, 3)?,
        failure_reason: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// The tracker linked to `sms_uuid` under `request_id`, if any.
pub async fn tracker_for(
    db: &Database,
    sms_uuid: &str,
    request_id: &str,
) -> Result<Option<Tracker>, NimbaError> {
    let sms_uuid = sms_uuid.to_string();
    let request_id = request_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, sms_uuid, request_id, state, failure_reason, updated_at
                 FROM trackers WHERE sms_uuid = ?1 AND request_id = ?2",
                params![sms_uuid, request_id],
                row_to_tracker,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Status history of a tracker, oldest first.
pub async fn tracker_events(
    db: &Database,
    tracker_id: i64,
) -> Result<Vec<TrackerEvent>, NimbaError> {
    db.connection()
        .call(move |conn| -> Result<Vec<TrackerEvent>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, tracker_id, state, failure_reason, created_at
                 FROM tracker_events WHERE tracker_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![tracker_id], |row| {
                Ok(TrackerEvent {
                    id: row.get(0)?,
                    tracker_id: row.get(1)?,
                    state: parse_column(row, 2)?,
                    failure_reason: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Set a tracker's state and append the change to its history.
///
/// A terminal tracker is left alone when the update is non-terminal.
pub fn apply_tracker_update(
    conn: &Connection,
    tracker_id: i64,
    update: &StatusUpdate,
) -> rusqlite::Result<bool> {
    let current = conn
        .query_row(
            "SELECT state FROM trackers WHERE id = ?1",
            params![tracker_id],
            |row| parse_column::<nimba_core::DeliveryState>(row, 0),
        )
        .optional()?;
    match current {
        Some(state) if state.can_transition_to(update.state) => {}
        _ => return Ok(false),
    }

    conn.execute(
        "UPDATE trackers SET state = ?1, failure_reason = ?2,
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?3",
        params![update.state.to_string(), update.failure_reason, tracker_id],
    )?;
    conn.execute(
        "INSERT INTO tracker_events (tracker_id, state, failure_reason) VALUES (?1, ?2, ?3)",
        params![tracker_id, update.state.to_string(), update.failure_reason],
    )?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages::{NewMessage, apply_send_result, insert_message};
    use nimba_core::{DeliveryState, SendResult};
    use tempfile::tempdir;

    #[tokio::test]
    async fn send_result_links_tracker_to_request_id() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db"), false).await.unwrap();
        let message = insert_message(
            &db,
            NewMessage {
                number: "622000001".into(),
                body: "hello".into(),
                track: true,
            },
        )
        .await
        .unwrap();

        assert!(tracker_for(&db, &message.uuid, "abc").await.unwrap().is_none());

        let result = SendResult::success(message.id, Some("abc".into()));
        db.connection()
            .call(move |conn| apply_send_result(conn, &result))
            .await
            .unwrap();

        let tracker = tracker_for(&db, &message.uuid, "abc").await.unwrap().unwrap();
        assert_eq!(tracker.state, DeliveryState::Pending);
        assert_eq!(tracker.request_id.as_deref(), Some("abc"));

        let events = tracker_events(&db, tracker.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].state, DeliveryState::Pending);
    }
}
