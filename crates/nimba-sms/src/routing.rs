// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chooses which sender handles a tenant's messages.

use nimba_core::{AccountConfig, SmsProvider};

/// Where a tenant's outgoing messages go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderRoute {
    /// Through [`crate::OutboundBatchSender`] with these credentials.
    Nimba(AccountConfig),
    /// Left for the host framework's own sender.
    Host(SmsProvider),
}

/// Pure dispatch on the tenant's configured provider.
pub fn select_route(account: &AccountConfig) -> SenderRoute {
    match account.provider {
        SmsProvider::Nimba => SenderRoute::Nimba(account.clone()),
        other @ (SmsProvider::Iap | SmsProvider::Twilio) => SenderRoute::Host(other),
    }
}
