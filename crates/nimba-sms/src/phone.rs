// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number canonicalisation.
//!
//! Two forms are used: a comparison form (separators stripped) for matching
//! stored numbers against callback contacts, and the wire form the Nimba API
//! expects (E.164 digits without the leading `+`).

use phonenumber::{Mode, PhoneNumber, country};
use tracing::warn;

/// Strip a leading `+`, spaces and hyphens.
///
/// Total: empty input yields an empty string.
pub fn normalize_for_comparison(number: &str) -> String {
    let compact: String = number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    match compact.strip_prefix('+') {
        Some(rest) => rest.to_string(),
        None => compact,
    }
}

/// Format `number` for the provider API.
///
/// `default_region` (ISO 3166-1 alpha-2) applies when the input has no
/// country code. Unparseable or invalid numbers are returned unchanged.
pub fn format_for_wire(number: &str, default_region: &str) -> String {
    match wire_digits(number, default_region) {
        Some(digits) => digits,
        None => {
            warn!(
                number = %number,
                region = %default_region,
                "could not format phone number for provider, sending as entered"
            );
            number.to_string()
        }
    }
}

/// Wire form of a valid number, `None` otherwise. Does not log.
pub(crate) fn wire_digits(number: &str, default_region: &str) -> Option<String> {
    let parsed = parse_valid(number, default_region)?;
    let e164 = parsed.format().mode(Mode::E164).to_string();
    Some(e164.trim_start_matches('+').to_string())
}

fn parse_valid(number: &str, default_region: &str) -> Option<PhoneNumber> {
    let trimmed = number.trim();
    if trimmed.is_empty() {
        return None;
    }

    let region = default_region.to_ascii_uppercase().parse::<country::Id>().ok();
    if let Ok(parsed) = phonenumber::parse(region, trimmed)
        && phonenumber::is_valid(&parsed)
    {
        return Some(parsed);
    }

    // Wire output has no `+`; accept it back as an international number.
    let digits = normalize_for_comparison(trimmed);
    if !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && let Ok(parsed) = phonenumber::parse(None, format!("+{digits}"))
        && phonenumber::is_valid(&parsed)
    {
        return Some(parsed);
    }
    None
}
