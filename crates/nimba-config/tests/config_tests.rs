// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use std::io::Write;

use nimba_config::diagnostic::ConfigError;
use nimba_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use nimba_core::{SmsProvider, TenantId};

#[test]
fn full_config_deserializes() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
log_level = "debug"
bearer_token = "config-token"

[storage]
tenants_dir = "/var/lib/nimba"
wal_mode = false

[provider]
base_url = "http://localhost:4010"
timeout_secs = 5
default_region = "SN"

[tenants.acme]
service_id = "svc-1"
secret_token = "tok-1"
sender_name = "ACME"
webhook_secret = "hook-1"

[tenants.legacy]
provider = "twilio"
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.bearer_token.as_deref(), Some("config-token"));
    assert_eq!(config.storage.tenants_dir, "/var/lib/nimba");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.provider.base_url, "http://localhost:4010");
    assert_eq!(config.provider.timeout_secs, 5);
    assert_eq!(config.provider.default_region, "SN");

    let acme = TenantId::new("acme");
    let account = config.account_for(&acme);
    assert_eq!(account.provider, SmsProvider::Nimba);
    assert_eq!(account.service_id, "svc-1");
    assert!(account.missing_fields().is_empty());
    assert_eq!(config.webhook_secret_for(&acme), Some("hook-1"));

    let legacy = config.account_for(&TenantId::new("legacy"));
    assert_eq!(legacy.provider, SmsProvider::Twilio);
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8069);
    assert_eq!(config.server.log_level, "info");
    assert!(config.server.bearer_token.is_none());
    assert!(config.storage.wal_mode);
    assert_eq!(config.provider.base_url, "https://api.nimbasms.com");
    assert_eq!(config.provider.timeout_secs, 30);
    assert_eq!(config.provider.default_region, "GN");
    assert!(config.tenants.is_empty());
}

#[test]
fn unknown_tenant_key_gets_suggestion() {
    let toml = r#"
[tenants.acme]
sevice_id = "svc"
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "sevice_id" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("service_id"));
}

#[test]
fn unknown_tenant_key_points_at_its_table() {
    let toml = "[tenants.beta]\nservice_id = \"b\"\n\n[tenants.acme]\nsevice_id = \"svc\"\n";

    let errors = load_and_validate_str(toml).unwrap_err();
    let err = errors
        .iter()
        .find(|e| matches!(e, ConfigError::UnknownKey { .. }))
        .expect("unknown key error");
    assert_eq!(err.to_string(), "unknown key `sevice_id` in [tenants.acme]");

    let ConfigError::UnknownKey { table, span, .. } = err else {
        unreachable!()
    };
    assert_eq!(table, "tenants.acme");
    let offset = span.as_ref().expect("span into the inline source").offset();
    assert_eq!(offset, toml.rfind("sevice_id").unwrap());
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[metrics]\nenabled = true\n").unwrap_err();
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("metrics"),
        "got: {err_str}"
    );
}

#[test]
fn unknown_provider_value_is_rejected() {
    let toml = r#"
[tenants.acme]
provider = "carrier-pigeon"
"#;
    assert!(load_and_validate_str(toml).is_err());
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. }))
    );
}

#[test]
fn validation_runs_after_deserialization() {
    let errors = load_and_validate_str("[provider]\ndefault_region = \"ZZ\"\n").unwrap_err();
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("default_region"))
    ));
}

#[test]
fn loads_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 7000\n\n[tenants.acme]\nsender_name = \"ACME\"").unwrap();

    let config = load_and_validate_path(file.path()).expect("valid file");
    assert_eq!(config.server.port, 7000);
    assert_eq!(config.tenants["acme"].sender_name.as_deref(), Some("ACME"));
}

#[test]
fn config_errors_render_through_miette() {
    let errors = load_and_validate_str("[server]\nprot = 1\n").unwrap_err();
    let diagnostic: &dyn miette::Diagnostic = &errors[0];
    let code = diagnostic.code().map(|c| c.to_string());
    assert_eq!(code.as_deref(), Some("nimba::config::unknown_key"));
}
