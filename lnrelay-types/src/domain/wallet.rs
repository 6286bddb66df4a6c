//! Wallet identity and connection credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Name of a wallet in the registry.
///
/// Normalized to trimmed uppercase at construction, so `alice`, `Alice ` and
/// `ALICE` all name the same wallet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(from = "String", into = "String")]
#[schema(value_type = String, example = "ALICE")]
pub struct WalletId(String);

impl WalletId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for WalletId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for WalletId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<WalletId> for String {
    fn from(id: WalletId) -> Self {
        id.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Endpoint and secret needed to open a wallet connection.
///
/// For the production binding this is a `nostr+walletconnect://` URI that
/// embeds the client secret. It has no `Display` and its `Debug` output is
/// redacted so it cannot leak into logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor(String);

impl ConnectionDescriptor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw descriptor, for handing to a connector.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConnectionDescriptor(<redacted>)")
    }
}

/// Which end of a transfer an error or lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Sender,
    Recipient,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Sender => f.write_str("sender"),
            Side::Recipient => f.write_str("recipient"),
        }
    }
}
