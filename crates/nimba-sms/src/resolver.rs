// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Picks the one message a delivery report refers to.
//!
//! The provider returns one request id for a whole batch, so a report is
//! matched to a recipient by phone number. Matching runs in passes:
//!
//! 1. comparison form of the contact against each stored number,
//! 2. wire form of both under the default region (`+224 622..` vs `622..`),
//! 3. the first candidate not yet in a terminal state,
//! 4. the first candidate.
//!
//! Passes 3 and 4 are a guess and are logged as such.

use nimba_core::Message;
use tracing::{debug, warn};

use crate::phone;

#[derive(Debug, Clone)]
pub struct CallbackResolver {
    default_region: String,
}

impl CallbackResolver {
    pub fn new(default_region: impl Into<String>) -> Self {
        Self {
            default_region: default_region.into(),
        }
    }

    /// Resolve a report to one of `candidates`. Never mutates anything.
    ///
    /// Candidates whose stored request id differs from `request_id` are
    /// ignored.
    pub fn resolve<'a>(
        &self,
        request_id: &str,
        recipient_phone: Option<&str>,
        candidates: &'a [Message],
    ) -> Option<&'a Message> {
        let batch: Vec<&Message> = candidates
            .iter()
            .filter(|m| m.request_id.as_deref() == Some(request_id))
            .collect();
        if batch.is_empty() {
            return None;
        }

        let contact = phone::normalize_for_comparison(recipient_phone.unwrap_or_default());
        if !contact.is_empty() {
            if let Some(found) = batch
                .iter()
                .copied()
                .find(|m| phone::normalize_for_comparison(&m.number) == contact)
            {
                debug!(request_id, message_id = found.id, "matched report by phone");
                return Some(found);
            }

            if let Some(contact_wire) =
                phone::wire_digits(recipient_phone.unwrap_or_default(), &self.default_region)
                && let Some(found) = batch.iter().copied().find(|m| {
                    phone::wire_digits(&m.number, &self.default_region).as_deref()
                        == Some(contact_wire.as_str())
                })
            {
                debug!(request_id, message_id = found.id, "matched report by wire number");
                return Some(found);
            }
        }

        let fallback = batch
            .iter()
            .find(|m| !m.state.is_terminal())
            .or_else(|| batch.first())
            .copied();
        if let Some(found) = fallback {
            warn!(
                request_id,
                contact = %contact,
                candidates = batch.len(),
                message_id = found.id,
                "no phone match for report, falling back to first unresolved message"
            );
        }
        fallback
    }
}
