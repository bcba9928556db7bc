// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `/etc/nimba/nimba.toml`, `~/.config/nimba/nimba.toml`,
//! `./nimba.toml`, then `NIMBA_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::NimbaConfig;

/// Load configuration from the XDG hierarchy with env var overrides.
pub fn load_config() -> Result<NimbaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<NimbaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NimbaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NimbaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NimbaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(NimbaConfig::default()))
        .merge(Toml::file("/etc/nimba/nimba.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("nimba/nimba.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("nimba.toml"))
        .merge(env_provider())
}

/// Maps `NIMBA_SECTION_KEY` to `section.key`.
///
/// Only the first underscore after a known section is split, so
/// `NIMBA_SERVER_BEARER_TOKEN` becomes `server.bearer_token`. Tenant
/// sections are file-only: their names may themselves contain underscores.
fn env_provider() -> Env {
    Env::prefixed("NIMBA_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in ["server", "storage", "provider"] {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
