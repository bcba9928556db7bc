// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies delivery reports to tenant data.
//!
//! A report either names its tenant (tenant route) or not (fan-out). In the
//! fan-out case tenants are tried one at a time in directory order; the
//! first tenant holding a matching message wins and is committed before the
//! loop stops. A tenant whose session fails is logged and skipped.

use std::sync::Arc;

use nimba_core::{
    CallbackPayload, DeliveryState, NimbaError, TenantDirectory, TenantId, TenantSession,
};
use tracing::{debug, info, warn};

use crate::resolver::CallbackResolver;
use crate::status;

/// What happened to a delivery report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Applied {
        tenant: TenantId,
        message_id: i64,
        state: DeliveryState,
    },
    NotFound,
}

pub struct CallbackProcessor {
    directory: Arc<dyn TenantDirectory>,
    resolver: CallbackResolver,
}

impl CallbackProcessor {
    pub fn new(directory: Arc<dyn TenantDirectory>, resolver: CallbackResolver) -> Self {
        Self {
            directory,
            resolver,
        }
    }

    /// Apply a report to a known tenant. Unknown tenants are a miss.
    pub async fn process_tenant(
        &self,
        tenant: &TenantId,
        payload: &CallbackPayload,
    ) -> Result<CallbackOutcome, NimbaError> {
        let session = match self.directory.open_session(tenant).await {
            Ok(session) => session,
            Err(NimbaError::TenantNotFound(_)) => {
                warn!(tenant = %tenant, request_id = %payload.request_id, "report for unknown tenant");
                return Ok(CallbackOutcome::NotFound);
            }
            Err(e) => return Err(e),
        };

        let outcome = self.apply(session, payload).await?;
        if outcome == CallbackOutcome::NotFound {
            warn!(tenant = %tenant, request_id = %payload.request_id, "SMS not found for report");
        }
        Ok(outcome)
    }

    /// Try every tenant until one holds the reported message.
    pub async fn process_fan_out(
        &self,
        payload: &CallbackPayload,
    ) -> Result<CallbackOutcome, NimbaError> {
        let tenants = self.directory.list_tenants().await?;
        debug!(tenants = tenants.len(), request_id = %payload.request_id, "fanning out report");

        for tenant in &tenants {
            let session = match self.directory.open_session(tenant).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(tenant = %tenant, error = %e, "skipping tenant during fan-out");
                    continue;
                }
            };
            match self.apply(session, payload).await {
                Ok(CallbackOutcome::NotFound) => continue,
                Ok(applied) => return Ok(applied),
                Err(e) => {
                    warn!(tenant = %tenant, error = %e, "skipping tenant during fan-out");
                }
            }
        }

        warn!(
            request_id = %payload.request_id,
            tenants = tenants.len(),
            "SMS not found in any database"
        );
        Ok(CallbackOutcome::NotFound)
    }

    /// Resolve, update, and commit inside one tenant session.
    async fn apply(
        &self,
        mut session: Box<dyn TenantSession>,
        payload: &CallbackPayload,
    ) -> Result<CallbackOutcome, NimbaError> {
        let request_id = payload.request_id.as_str();
        let candidates = session.messages_by_request_id(request_id).await?;
        let Some(message) = self
            .resolver
            .resolve(request_id, payload.contact.as_deref(), &candidates)
            .cloned()
        else {
            return Ok(CallbackOutcome::NotFound);
        };

        let tenant = session.tenant().clone();
        let update = status::status_update(&payload.status, payload.error.as_deref());

        if !message.state.can_transition_to(update.state) {
            debug!(
                tenant = %tenant,
                message_id = message.id,
                current = %message.state,
                reported = %update.state,
                "ignoring report that would reopen a finished message"
            );
            return Ok(CallbackOutcome::Applied {
                tenant,
                message_id: message.id,
                state: message.state,
            });
        }

        let state = update.state;
        let via_tracker = match session.tracker_for(&message, request_id).await? {
            Some(tracker) => {
                session.update_tracker(&tracker, message.id, update);
                true
            }
            None => {
                session.update_message(message.id, update);
                false
            }
        };
        session.commit().await?;

        info!(
            tenant = %tenant,
            request_id,
            message_id = message.id,
            state = %state,
            via_tracker,
            "delivery report applied"
        );
        Ok(CallbackOutcome::Applied {
            tenant,
            message_id: message.id,
            state,
        })
    }
}
