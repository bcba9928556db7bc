// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nimba Relay - Nimba SMS dispatch and delivery-report reconciliation.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod queue;
mod send;
mod serve;
mod tenants;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nimba_config::NimbaConfig;

/// Nimba Relay - SMS dispatch and delivery-report reconciliation.
#[derive(Parser, Debug)]
#[command(name = "nimba", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook gateway.
    Serve,
    /// Send queued outgoing messages.
    Send {
        /// Only this tenant (default: every tenant).
        #[arg(long)]
        tenant: Option<String>,
    },
    /// Queue an outgoing message for local testing.
    Queue {
        #[arg(long)]
        tenant: String,
        /// Recipient number.
        #[arg(long)]
        to: String,
        #[arg(long)]
        body: String,
        /// Also create a delivery tracker for the message.
        #[arg(long)]
        track: bool,
    },
    /// List tenant databases.
    Tenants,
    /// Query a tenant's provider account balance.
    CheckAccount {
        #[arg(long)]
        tenant: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("nimba: use --help for available commands");
        return;
    };

    let loaded = match &cli.config {
        Some(path) => nimba_config::load_and_validate_path(path),
        None => nimba_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            nimba_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.server.log_level);

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Send { tenant } => send::run_send(&config, tenant.as_deref()).await,
        Commands::Queue {
            tenant,
            to,
            body,
            track,
        } => queue::run_queue(&config, &tenant, &to, &body, track).await,
        Commands::Tenants => tenants::run_tenants(&config).await,
        Commands::CheckAccount { tenant } => tenants::run_check_account(&config, &tenant).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise the configured level for the nimba crates.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn default_filter(log_level: &str) -> String {
    format!(
        "nimba={log_level},nimba_sms={log_level},nimba_gateway={log_level},nimba_storage={log_level},warn"
    )
}

/// Tenant databases named by the storage section.
fn tenant_directory(config: &NimbaConfig) -> nimba_storage::SqliteTenantDirectory {
    nimba_storage::SqliteTenantDirectory::new(&config.storage.tenants_dir, config.storage.wal_mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn queue_command_parses() {
        let cli = Cli::parse_from([
            "nimba", "queue", "--tenant", "acme", "--to", "622000001", "--body", "hi", "--track",
        ]);
        match cli.command {
            Some(Commands::Queue { tenant, track, .. }) => {
                assert_eq!(tenant, "acme");
                assert!(track);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_filter_covers_nimba_crates() {
        let filter = default_filter("debug");
        assert!(filter.starts_with("nimba=debug"));
        assert!(filter.contains("nimba_gateway=debug"));
        assert!(filter.ends_with(",warn"));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = nimba_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.server.port, 8069);
    }
}
