// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Nimba Relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::collections::BTreeMap;

use nimba_core::{AccountConfig, SmsProvider, TenantId};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NimbaConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Where tenant databases live.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Nimba SMS API settings shared by all tenants.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Per-tenant account settings, keyed by tenant name.
    #[serde(default)]
    pub tenants: BTreeMap<String, TenantConfig>,
}

impl NimbaConfig {
    /// Account credentials for a tenant. Tenants without a section get an
    /// empty account, which the sender reports as unconfigured.
    pub fn account_for(&self, tenant: &TenantId) -> AccountConfig {
        self.tenants
            .get(tenant.as_str())
            .map(TenantConfig::account)
            .unwrap_or_default()
    }

    /// Shared webhook secret of a tenant, if one is configured.
    pub fn webhook_secret_for(&self, tenant: &TenantId) -> Option<&str> {
        self.tenants
            .get(tenant.as_str())
            .and_then(|t| t.webhook_secret.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// HTTP listener configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Token guarding `GET /sms/webhook/test`. `None` rejects every request.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            bearer_token: None,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8069
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Tenant database location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding one `<tenant>.db` SQLite file per tenant.
    #[serde(default = "default_tenants_dir")]
    pub tenants_dir: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tenants_dir: default_tenants_dir(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_tenants_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("nimba").join("tenants"))
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| "tenants".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Nimba SMS API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API root, without the `/v1` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Region assumed for numbers written without a country code.
    #[serde(default = "default_region")]
    pub default_region: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            default_region: default_region(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.nimbasms.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_region() -> String {
    "GN".to_string()
}

/// Account settings of one tenant.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    /// Which provider sends this tenant's messages.
    #[serde(default)]
    pub provider: SmsProvider,

    #[serde(default)]
    pub service_id: Option<String>,

    #[serde(default)]
    pub secret_token: Option<String>,

    /// Approved sender name or short code.
    #[serde(default)]
    pub sender_name: Option<String>,

    /// Secret for `X-SMS-Signature` verification.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl TenantConfig {
    pub fn account(&self) -> AccountConfig {
        AccountConfig {
            provider: self.provider,
            service_id: self.service_id.clone().unwrap_or_default(),
            secret_token: self.secret_token.clone().unwrap_or_default(),
            sender_name: self.sender_name.clone().unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantConfig")
            .field("provider", &self.provider)
            .field("service_id", &self.service_id)
            .field(
                "secret_token",
                &self.secret_token.as_ref().map(|_| "[redacted]"),
            )
            .field("sender_name", &self.sender_name)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tenant_gets_empty_account() {
        let config = NimbaConfig::default();
        let account = config.account_for(&TenantId::new("ghost"));
        assert_eq!(account.provider, SmsProvider::Nimba);
        assert_eq!(account.missing_fields().len(), 3);
    }

    #[test]
    fn empty_webhook_secret_counts_as_unset() {
        let mut config = NimbaConfig::default();
        config.tenants.insert(
            "acme".to_string(),
            TenantConfig {
                webhook_secret: Some(String::new()),
                ..TenantConfig::default()
            },
        );
        assert!(config.webhook_secret_for(&TenantId::new("acme")).is_none());
    }

    #[test]
    fn tenant_debug_redacts_secrets() {
        let tenant = TenantConfig {
            secret_token: Some("tok-123".into()),
            webhook_secret: Some("hook-456".into()),
            ..TenantConfig::default()
        };
        let debug = format!("{tenant:?}");
        assert!(!debug.contains("tok-123"));
        assert!(!debug.contains("hook-456"));
    }

    #[test]
    fn server_debug_redacts_bearer_token() {
        let server = ServerConfig {
            bearer_token: Some("bearer-789".into()),
            ..ServerConfig::default()
        };
        assert!(!format!("{server:?}").contains("bearer-789"));
    }
}
