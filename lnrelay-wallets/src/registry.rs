//! Wallet registry loader.
//!
//! Wallets are configured in a dotenv-format file, one per line:
//!
//! ```text
//! ALICE=nostr+walletconnect://<pubkey>?relay=wss://relay.example&secret=<hex>
//! bob=nostr+walletconnect://<pubkey>?relay=wss://relay.example&secret=<hex>
//! NWC_API_KEY=not-a-wallet
//! ```
//!
//! Only entries whose value is a wallet connect URI become wallets, so the
//! same file can also carry the server's own settings.

use std::path::Path;

use lnrelay_types::{ConnectionDescriptor, WalletId, WalletRegistry};

/// URI scheme of Nostr Wallet Connect descriptors.
pub const NWC_URI_SCHEME: &str = "nostr+walletconnect://";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read wallet file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Loads the registry from `path`.
///
/// A missing file is not an error: it yields an empty registry and a warning.
pub fn load_registry(path: impl AsRef<Path>) -> Result<WalletRegistry, RegistryError> {
    let path = path.as_ref();
    let read_err = |source| RegistryError::Read {
        path: path.display().to_string(),
        source,
    };

    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => {
            tracing::warn!(path = %path.display(), "wallet file not found, no wallets registered");
            return Ok(WalletRegistry::new());
        }
        Err(e) => return Err(read_err(e)),
    };

    let mut wallets = Vec::new();
    for entry in entries {
        let (key, value) = entry.map_err(read_err)?;
        if !is_wallet_uri(&value) {
            continue;
        }
        let id = WalletId::new(&key);
        if id.is_empty() {
            continue;
        }
        tracing::debug!(wallet_id = %id, "registered wallet");
        wallets.push((id, ConnectionDescriptor::new(value)));
    }

    let registry: WalletRegistry = wallets.into_iter().collect();
    tracing::info!(count = registry.len(), path = %path.display(), "loaded wallet registry");
    Ok(registry)
}

fn is_wallet_uri(value: &str) -> bool {
    value
        .get(..NWC_URI_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(NWC_URI_SCHEME))
}
