//! # Lnrelay Wallets
//!
//! Adapters for the `WalletConnector` port and the loader that builds the
//! wallet registry.
//!
//! - `memory` - In-process wallets with controllable balances and faults
//! - `nostr_wallet` - Nostr Wallet Connect binding (feature `nwc`)
//! - `registry` - Reads wallet descriptors from a dotenv-format file

pub mod memory;
#[cfg(feature = "nwc")]
pub mod nostr_wallet;
pub mod registry;

pub use memory::{CallCounts, Faults, MemoryConnection, MemoryConnector};
#[cfg(feature = "nwc")]
pub use nostr_wallet::{NwcConnection, NwcConnector};
pub use registry::{NWC_URI_SCHEME, RegistryError, load_registry};
