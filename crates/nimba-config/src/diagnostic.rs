// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment errors into miette reports that point into `nimba.toml`.
//!
//! A misspelled tenant key such as `sevice_id` under `[tenants.acme]` is
//! reported with its location and the closest accepted key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {}", table_label(.table))]
    #[diagnostic(
        code(nimba::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted path of the table holding the key, empty for the root.
        table: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not accepted in this table")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(nimba::config::invalid_type), help("use a {expected} here"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// An enum setting such as a tenant's `provider` got an unknown word.
    #[error("`{key}` has an unsupported value: {detail}")]
    #[diagnostic(code(nimba::config::invalid_value))]
    InvalidValue { key: String, detail: String },

    #[error("`{key}` is required")]
    #[diagnostic(code(nimba::config::missing_key))]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(nimba::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(nimba::config::other))]
    Other(String),
}

fn table_label(table: &str) -> String {
    if table.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{table}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    let accepted = format!("accepted keys: {valid_keys}");
    suggestion.map_or(accepted.clone(), |s| format!("did you mean `{s}`? {accepted}"))
}

/// One [`ConfigError`] per problem figment reported.
///
/// `toml_sources` holds `(name, content)` pairs of the files that were
/// merged, used to attach source spans to unknown keys.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let table: Vec<String> = error.path.iter().map(ToString::to_string).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &table, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        table: table.join("."),
                        suggestion: suggest_key(field, *expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: dotted(&table, field),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: table.join("."),
                    detail: format!("found {actual}"),
                    expected: expected.to_string(),
                },
                Kind::UnknownVariant(variant, expected) => ConfigError::InvalidValue {
                    key: table.join("."),
                    detail: format!("`{variant}` is not one of {}", expected.join(", ")),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted(table: &[String], field: &str) -> String {
    table
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(field))
        .collect::<Vec<_>>()
        .join(".")
}

/// Source span of an unknown key, if its file is known.
fn locate(
    error: &figment::error::Error,
    table: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings carry no file metadata; use the only source there is.
    let source = match (file, toml_sources) {
        (Some(path), _) => toml_sources.iter().find(|(name, _)| *name == path),
        (None, [only]) => Some(only),
        (None, _) => None,
    };

    source
        .and_then(|(name, content)| {
            let offset = find_key_offset(content, table, field)?;
            Some((
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(name, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` as written inside the table named by `path`.
///
/// Tables are matched by their header (`[tenants.acme]`, spaces inside the
/// brackets allowed). An empty `path` searches the keys before any header.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let wanted = path.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header
                .split(']')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            continue;
        }
        if current != wanted {
            continue;
        }

        let is_assignment = trimmed
            .strip_prefix(field)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if is_assignment {
            return Some(start + (line.len() - trimmed.len()));
        }
    }

    None
}

/// Closest accepted key to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr as a miette report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
