// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nimba send` command implementation.

use std::time::Duration;

use nimba_config::NimbaConfig;
use nimba_core::{NimbaError, TenantDirectory, TenantId};
use nimba_sms::{DispatchSummary, OutboundBatchSender, flush_tenant};
use tracing::error;

/// Upper bound on messages taken from one tenant per run.
const BATCH_LIMIT: usize = 500;

/// Flush the outgoing queue of one tenant, or of every tenant in name order.
///
/// A failing tenant does not stop the others; the command still exits
/// non-zero afterwards.
pub async fn run_send(config: &NimbaConfig, tenant: Option<&str>) -> Result<(), NimbaError> {
    let directory = crate::tenant_directory(config);
    let tenants = match tenant {
        Some(name) => vec![TenantId::new(name)],
        None => directory.list_tenants().await?,
    };

    let sender = OutboundBatchSender::new(
        config.provider.base_url.clone(),
        Duration::from_secs(config.provider.timeout_secs),
        config.provider.default_region.clone(),
    );

    let mut failures = 0;
    for tenant in &tenants {
        let account = config.account_for(tenant);
        match flush_tenant(&directory, &sender, tenant, &account, BATCH_LIMIT).await {
            Ok(summary) => println!("{}", describe(&summary)),
            Err(e) => {
                error!(tenant = %tenant, error = %e, "send failed");
                eprintln!("{tenant}: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(NimbaError::Internal(format!(
            "{failures} of {} tenant(s) could not be flushed",
            tenants.len()
        )));
    }
    Ok(())
}

fn describe(summary: &DispatchSummary) -> String {
    match summary.skipped {
        Some(provider) => format!("{}: skipped (sends through {provider})", summary.tenant),
        None => format!(
            "{}: {} sent, {} failed",
            summary.tenant, summary.sent, summary.failed
        ),
    }
}
