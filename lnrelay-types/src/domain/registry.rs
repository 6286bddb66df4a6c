//! The wallet registry: a fixed mapping from wallet names to descriptors.

use std::collections::BTreeMap;

use super::wallet::{ConnectionDescriptor, WalletId};

/// Immutable mapping from [`WalletId`] to [`ConnectionDescriptor`].
///
/// Built once before serving and shared read-only afterwards. Iteration is in
/// id order.
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    wallets: BTreeMap<WalletId, ConnectionDescriptor>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from raw `(name, descriptor)` pairs.
    ///
    /// Names are normalized, so a later pair overrides an earlier one that
    /// differs only in case.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<WalletId>,
        V: Into<String>,
    {
        entries
            .into_iter()
            .map(|(id, raw)| (id.into(), ConnectionDescriptor::new(raw)))
            .collect()
    }

    pub fn resolve(&self, id: &WalletId) -> Option<&ConnectionDescriptor> {
        self.wallets.get(id)
    }

    pub fn contains(&self, id: &WalletId) -> bool {
        self.wallets.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &WalletId> {
        self.wallets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WalletId, &ConnectionDescriptor)> {
        self.wallets.iter()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

impl FromIterator<(WalletId, ConnectionDescriptor)> for WalletRegistry {
    fn from_iter<T: IntoIterator<Item = (WalletId, ConnectionDescriptor)>>(iter: T) -> Self {
        Self {
            wallets: iter.into_iter().collect(),
        }
    }
}
