// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use nimba_core::SmsProvider;

use crate::diagnostic::ConfigError;
use crate::model::NimbaConfig;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &NimbaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.server.port == 0 {
        fail("server.port must be between 1 and 65535".to_string());
    }

    if config.storage.tenants_dir.trim().is_empty() {
        fail("storage.tenants_dir must not be empty".to_string());
    }

    let base_url = config.provider.base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        fail(format!(
            "provider.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.provider.timeout_secs == 0 {
        fail("provider.timeout_secs must be at least 1".to_string());
    }

    let region = &config.provider.default_region;
    if region.parse::<phonenumber::country::Id>().is_err() {
        fail(format!(
            "provider.default_region `{region}` is not a known two-letter region code"
        ));
    }

    for (name, tenant) in &config.tenants {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            fail(format!(
                "tenant name `{name}` may only contain letters, digits, `_` and `-`"
            ));
        }

        if tenant.provider == SmsProvider::Nimba {
            let missing = tenant.account().missing_fields();
            if !missing.is_empty() {
                // Allowed: the sender reports these at send time.
                tracing::warn!(
                    tenant = %name,
                    missing = %missing.join(", "),
                    "tenant selects nimba but is missing credentials"
                );
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
