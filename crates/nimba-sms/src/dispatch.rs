// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flushes a tenant's outgoing queue through its configured route.

use nimba_core::{
    AccountConfig, NimbaError, OutboundSms, SendOutcome, SmsProvider, TenantDirectory, TenantId,
};
use tracing::{debug, info};

use crate::routing::{SenderRoute, select_route};
use crate::sender::OutboundBatchSender;

/// Counts from one flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub tenant: TenantId,
    pub sent: usize,
    pub failed: usize,
    /// Set when the tenant's messages belong to another provider.
    pub skipped: Option<SmsProvider>,
}

impl DispatchSummary {
    fn empty(tenant: &TenantId) -> Self {
        Self {
            tenant: tenant.clone(),
            sent: 0,
            failed: 0,
            skipped: None,
        }
    }
}

/// Send up to `limit` outgoing messages of `tenant` and record every result
/// in one commit.
pub async fn flush_tenant(
    directory: &dyn TenantDirectory,
    sender: &OutboundBatchSender,
    tenant: &TenantId,
    account: &AccountConfig,
    limit: usize,
) -> Result<DispatchSummary, NimbaError> {
    let mut summary = DispatchSummary::empty(tenant);

    let account = match select_route(account) {
        SenderRoute::Nimba(account) => account,
        SenderRoute::Host(provider) => {
            info!(tenant = %tenant, provider = %provider, "tenant sends through another provider, skipping");
            summary.skipped = Some(provider);
            return Ok(summary);
        }
    };

    let mut session = directory.open_session(tenant).await?;
    let outgoing = session.outgoing_messages(limit).await?;
    if outgoing.is_empty() {
        debug!(tenant = %tenant, "no outgoing messages");
        return Ok(summary);
    }

    let batch: Vec<OutboundSms> = outgoing.iter().map(OutboundSms::from).collect();
    for result in sender.send_batch(&account, &batch).await {
        match result.outcome {
            SendOutcome::Success => summary.sent += 1,
            SendOutcome::ServerError => summary.failed += 1,
        }
        session.record_send_result(result);
    }
    session.commit().await?;

    info!(
        tenant = %tenant,
        sent = summary.sent,
        failed = summary.failed,
        "outgoing queue flushed"
    );
    Ok(summary)
}
