// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant directory and scoped session traits.
//!
//! The host framework owns tenant databases. The reconciliation core only
//! sees them through these two traits: a directory that enumerates tenants
//! and opens sessions, and a session scoped to exactly one tenant.

use async_trait::async_trait;

use crate::error::NimbaError;
use crate::types::{Message, SendResult, StatusUpdate, TenantId, Tracker};

/// Enumerates tenants and opens isolated sessions on them.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Returns every known tenant in a stable order.
    async fn list_tenants(&self) -> Result<Vec<TenantId>, NimbaError>;

    /// Opens a fresh transactional session on one tenant.
    ///
    /// Returns [`NimbaError::TenantNotFound`] for unknown tenants.
    async fn open_session(&self, tenant: &TenantId)
    -> Result<Box<dyn TenantSession>, NimbaError>;
}

/// A unit of work against one tenant's data.
///
/// Reads hit the tenant immediately. Writes are staged and only become
/// visible when [`TenantSession::commit`] succeeds; dropping the session
/// discards them.
#[async_trait]
pub trait TenantSession: Send {
    /// The tenant this session is bound to.
    fn tenant(&self) -> &TenantId;

    /// All messages carrying the given provider request identifier, in
    /// insertion order.
    async fn messages_by_request_id(
        &mut self,
        request_id: &str,
    ) -> Result<Vec<Message>, NimbaError>;

    /// The tracker linked to `message` under `request_id`, if any.
    async fn tracker_for(
        &mut self,
        message: &Message,
        request_id: &str,
    ) -> Result<Option<Tracker>, NimbaError>;

    /// Messages waiting to be submitted, oldest first.
    async fn outgoing_messages(&mut self, limit: usize) -> Result<Vec<Message>, NimbaError>;

    /// Stages a state change on a message.
    fn update_message(&mut self, message_id: i64, update: StatusUpdate);

    /// Stages a state change on a tracker. The change is appended to the
    /// tracker's history and mirrored onto the linked message.
    fn update_tracker(&mut self, tracker: &Tracker, message_id: i64, update: StatusUpdate);

    /// Stages the outcome of a provider submission for one message.
    fn record_send_result(&mut self, result: SendResult);

    /// Applies all staged writes atomically. Returns the number of writes.
    async fn commit(self: Box<Self>) -> Result<usize, NimbaError>;
}
