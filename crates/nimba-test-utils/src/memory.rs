// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory tenant directory for deterministic tests.
//!
//! `MemoryTenantDirectory` implements `TenantDirectory` over plain vectors.
//! Sessions read shared state immediately and stage writes until commit,
//! mirroring the SQLite implementation. Individual tenants can be made to
//! fail on open to exercise fan-out error isolation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use nimba_core::{
    DeliveryState, Message, NimbaError, SendResult, StatusUpdate, TenantDirectory, TenantId,
    TenantSession, Tracker, TrackerEvent,
};

use crate::fixtures::TIMESTAMP;

#[derive(Debug, Default, Clone)]
struct TenantData {
    messages: Vec<Message>,
    trackers: Vec<Tracker>,
    events: Vec<TrackerEvent>,
    commits: usize,
}

impl TenantData {
    fn update_message(&mut self, message_id: i64, update: &StatusUpdate) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) else {
            return false;
        };
        if !message.state.can_transition_to(update.state) {
            return false;
        }
        message.state = update.state;
        message.failure_category = update.failure_category;
        message.failure_reason = update.failure_reason.clone();
        true
    }

    fn update_tracker(&mut self, tracker_id: i64, update: &StatusUpdate) -> bool {
        let Some(tracker) = self.trackers.iter_mut().find(|t| t.id == tracker_id) else {
            return false;
        };
        if !tracker.state.can_transition_to(update.state) {
            return false;
        }
        tracker.state = update.state;
        tracker.failure_reason = update.failure_reason.clone();
        let id = self.events.len() as i64 + 1;
        self.events.push(TrackerEvent {
            id,
            tracker_id,
            state: update.state,
            failure_reason: update.failure_reason.clone(),
            created_at: TIMESTAMP.to_string(),
        });
        true
    }

    fn record_send_result(&mut self, result: &SendResult) -> bool {
        let update = result.status_update();
        if !self.update_message(result.message_id, &update) {
            return false;
        }
        let Some(message) = self.messages.iter_mut().find(|m| m.id == result.message_id) else {
            return false;
        };
        if result.request_id.is_some() {
            message.request_id = result.request_id.clone();
        }
        let uuid = message.uuid.clone();
        if let Some(tracker_id) = self
            .trackers
            .iter_mut()
            .find(|t| t.sms_uuid == uuid)
            .map(|t| {
                if result.request_id.is_some() {
                    t.request_id = result.request_id.clone();
                }
                t.id
            })
        {
            self.update_tracker(tracker_id, &update);
        }
        true
    }
}

#[derive(Debug, Default)]
struct State {
    tenants: BTreeMap<TenantId, TenantData>,
    failing: HashSet<TenantId>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Tenants held in memory, listed in name order.
#[derive(Debug, Clone, Default)]
pub struct MemoryTenantDirectory {
    state: Arc<Mutex<State>>,
}

impl MemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty tenant.
    pub async fn add_tenant(&self, name: &str) -> TenantId {
        let tenant = TenantId::new(name);
        self.state
            .lock()
            .await
            .tenants
            .entry(tenant.clone())
            .or_default();
        tenant
    }

    /// Make `open_session` fail for this tenant.
    pub async fn fail_tenant(&self, name: &str) {
        self.state.lock().await.failing.insert(TenantId::new(name));
    }

    /// Insert a message. With `request_id` set the message is `pending`,
    /// otherwise `outgoing`. `track` also creates its tracker.
    pub async fn insert_message(
        &self,
        tenant: &TenantId,
        number: &str,
        body: &str,
        request_id: Option<&str>,
        track: bool,
    ) -> Message {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let tracker_id = state.next_id();
        let message = Message {
            id,
            uuid: format!("sms-{id}"),
            number: number.to_string(),
            body: body.to_string(),
            state: if request_id.is_some() {
                DeliveryState::Pending
            } else {
                DeliveryState::Outgoing
            },
            request_id: request_id.map(str::to_string),
            failure_category: None,
            failure_reason: None,
            created_at: TIMESTAMP.to_string(),
            updated_at: TIMESTAMP.to_string(),
        };
        let data = state.tenants.entry(tenant.clone()).or_default();
        data.messages.push(message.clone());
        if track {
            data.trackers.push(Tracker {
                id: tracker_id,
                sms_uuid: message.uuid.clone(),
                request_id: message.request_id.clone(),
                state: message.state,
                failure_reason: None,
                updated_at: TIMESTAMP.to_string(),
            });
        }
        message
    }

    pub async fn message(&self, tenant: &TenantId, id: i64) -> Option<Message> {
        let state = self.state.lock().await;
        state
            .tenants
            .get(tenant)?
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub async fn messages(&self, tenant: &TenantId) -> Vec<Message> {
        let state = self.state.lock().await;
        state
            .tenants
            .get(tenant)
            .map(|d| d.messages.clone())
            .unwrap_or_default()
    }

    /// The tracker linked to a message, if any.
    pub async fn tracker_of(&self, tenant: &TenantId, message_id: i64) -> Option<Tracker> {
        let state = self.state.lock().await;
        let data = state.tenants.get(tenant)?;
        let message = data.messages.iter().find(|m| m.id == message_id)?;
        data.trackers
            .iter()
            .find(|t| t.sms_uuid == message.uuid)
            .cloned()
    }

    pub async fn tracker_events(&self, tenant: &TenantId, tracker_id: i64) -> Vec<TrackerEvent> {
        let state = self.state.lock().await;
        state
            .tenants
            .get(tenant)
            .map(|d| {
                d.events
                    .iter()
                    .filter(|e| e.tracker_id == tracker_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of non-empty commits made against a tenant.
    pub async fn commits(&self, tenant: &TenantId) -> usize {
        let state = self.state.lock().await;
        state.tenants.get(tenant).map(|d| d.commits).unwrap_or(0)
    }
}

#[async_trait]
impl TenantDirectory for MemoryTenantDirectory {
    async fn list_tenants(&self) -> Result<Vec<TenantId>, NimbaError> {
        Ok(self.state.lock().await.tenants.keys().cloned().collect())
    }

    async fn open_session(
        &self,
        tenant: &TenantId,
    ) -> Result<Box<dyn TenantSession>, NimbaError> {
        let state = self.state.lock().await;
        if state.failing.contains(tenant) {
            return Err(NimbaError::Internal(format!(
                "injected failure opening tenant {tenant}"
            )));
        }
        if !state.tenants.contains_key(tenant) {
            return Err(NimbaError::TenantNotFound(tenant.to_string()));
        }
        Ok(Box::new(MemorySession {
            tenant: tenant.clone(),
            state: Arc::clone(&self.state),
            staged: Vec::new(),
        }))
    }
}

enum Staged {
    Message(i64, StatusUpdate),
    Tracker(i64, i64, StatusUpdate),
    SendResult(SendResult),
}

struct MemorySession {
    tenant: TenantId,
    state: Arc<Mutex<State>>,
    staged: Vec<Staged>,
}

impl MemorySession {
    async fn read<T>(&self, f: impl FnOnce(&TenantData) -> T) -> Result<T, NimbaError> {
        let state = self.state.lock().await;
        state
            .tenants
            .get(&self.tenant)
            .map(f)
            .ok_or_else(|| NimbaError::TenantNotFound(self.tenant.to_string()))
    }
}

#[async_trait]
impl TenantSession for MemorySession {
    fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    async fn messages_by_request_id(
        &mut self,
        request_id: &str,
    ) -> Result<Vec<Message>, NimbaError> {
        self.read(|d| {
            d.messages
                .iter()
                .filter(|m| m.request_id.as_deref() == Some(request_id))
                .cloned()
                .collect()
        })
        .await
    }

    async fn tracker_for(
        &mut self,
        message: &Message,
        request_id: &str,
    ) -> Result<Option<Tracker>, NimbaError> {
        self.read(|d| {
            d.trackers
                .iter()
                .find(|t| t.sms_uuid == message.uuid && t.request_id.as_deref() == Some(request_id))
                .cloned()
        })
        .await
    }

    async fn outgoing_messages(&mut self, limit: usize) -> Result<Vec<Message>, NimbaError> {
        self.read(|d| {
            d.messages
                .iter()
                .filter(|m| m.state == DeliveryState::Outgoing)
                .take(limit)
                .cloned()
                .collect()
        })
        .await
    }

    fn update_message(&mut self, message_id: i64, update: StatusUpdate) {
        self.staged.push(Staged::Message(message_id, update));
    }

    fn update_tracker(&mut self, tracker: &Tracker, message_id: i64, update: StatusUpdate) {
        self.staged
            .push(Staged::Tracker(tracker.id, message_id, update));
    }

    fn record_send_result(&mut self, result: SendResult) {
        self.staged.push(Staged::SendResult(result));
    }

    async fn commit(self: Box<Self>) -> Result<usize, NimbaError> {
        if self.staged.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.lock().await;
        let data = state
            .tenants
            .get_mut(&self.tenant)
            .ok_or_else(|| NimbaError::TenantNotFound(self.tenant.to_string()))?;

        let mut applied = 0;
        for write in &self.staged {
            let changed = match write {
                Staged::Message(id, update) => data.update_message(*id, update),
                Staged::Tracker(tracker_id, message_id, update) => {
                    let tracker = data.update_tracker(*tracker_id, update);
                    let message = data.update_message(*message_id, update);
                    tracker || message
                }
                Staged::SendResult(result) => data.record_send_result(result),
            };
            if changed {
                applied += 1;
            }
        }
        data.commits += 1;
        Ok(applied)
    }
}
