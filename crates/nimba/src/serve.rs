// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nimba serve` command implementation.
//!
//! Opens the tenant directory, wires the callback processor into the webhook
//! gateway, and serves until SIGINT or SIGTERM.

use std::collections::HashMap;
use std::sync::Arc;

use nimba_config::NimbaConfig;
use nimba_core::{NimbaError, TenantDirectory, TenantId};
use nimba_gateway::{AuthConfig, GatewayState, ServerConfig, start_server};
use nimba_sms::{CallbackProcessor, CallbackResolver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn run_serve(config: NimbaConfig) -> Result<(), NimbaError> {
    info!("starting nimba serve");

    let directory = Arc::new(crate::tenant_directory(&config));
    tokio::fs::create_dir_all(directory.tenants_dir())
        .await
        .map_err(NimbaError::storage)?;

    let tenants = directory.list_tenants().await?;
    info!(
        count = tenants.len(),
        dir = %directory.tenants_dir().display(),
        "tenant databases found"
    );

    let secrets = webhook_secrets(&config);
    for tenant in tenants.iter().filter(|t| !secrets.contains_key(*t)) {
        warn!(tenant = %tenant, "no webhook secret configured, unsigned reports will be accepted");
    }

    let processor = CallbackProcessor::new(
        directory,
        CallbackResolver::new(config.provider.default_region.clone()),
    );
    let state = GatewayState::new(Arc::new(processor))
        .with_webhook_secrets(secrets)
        .with_auth(AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        });

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let cancel = install_signal_handler();
    start_server(&server_config, state, cancel).await?;

    info!("nimba serve shutdown complete");
    Ok(())
}

/// Non-empty webhook secrets keyed by tenant.
fn webhook_secrets(config: &NimbaConfig) -> HashMap<TenantId, String> {
    config
        .tenants
        .keys()
        .filter_map(|name| {
            let tenant = TenantId::new(name.as_str());
            let secret = config.webhook_secret_for(&tenant)?.to_string();
            Some((tenant, secret))
        })
        .collect()
}

/// Cancels the returned token on SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C will stop the server");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}
