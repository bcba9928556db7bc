// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nimba tenants` and `nimba check-account` command implementations.

use std::time::Duration;

use nimba_config::NimbaConfig;
use nimba_core::{AccountConfig, NimbaError, TenantDirectory, TenantId};
use nimba_sms::{AccountResponse, NimbaClient};

/// List tenant databases with their configured provider.
pub async fn run_tenants(config: &NimbaConfig) -> Result<(), NimbaError> {
    let directory = crate::tenant_directory(config);
    let tenants = directory.list_tenants().await?;

    if tenants.is_empty() {
        println!("no tenant databases in {}", directory.tenants_dir().display());
        return Ok(());
    }

    for tenant in &tenants {
        println!("{}", describe(tenant, &config.account_for(tenant)));
    }
    Ok(())
}

fn describe(tenant: &TenantId, account: &AccountConfig) -> String {
    let missing = account.missing_fields();
    if missing.is_empty() {
        format!("{tenant}\t{}\tconfigured", account.provider)
    } else {
        format!(
            "{tenant}\t{}\tmissing {}",
            account.provider,
            missing.join(", ")
        )
    }
}

/// Query the provider account balance of a tenant.
pub async fn run_check_account(config: &NimbaConfig, tenant: &str) -> Result<(), NimbaError> {
    let tenant = TenantId::new(tenant);
    let account = config.account_for(&tenant);

    let missing: Vec<&str> = account
        .missing_fields()
        .into_iter()
        .filter(|f| *f != "sender_name")
        .collect();
    if !missing.is_empty() {
        return Err(NimbaError::Config(format!(
            "tenant {tenant} is missing {}",
            missing.join(", ")
        )));
    }

    let client = NimbaClient::new(
        account.service_id,
        account.secret_token,
        Duration::from_secs(config.provider.timeout_secs),
    )?
    .with_base_url(config.provider.base_url.clone());

    match client.account().await? {
        AccountResponse::Balance(balance) => {
            println!("{tenant}: balance {balance}");
            Ok(())
        }
        AccountResponse::Rejected(rejection) => Err(NimbaError::Provider {
            message: format!(
                "{} (HTTP {}: {})",
                rejection.category().description(),
                rejection.status,
                rejection.message
            ),
            source: None,
        }),
    }
}
