use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::wallet::WalletId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Reachability of every probed wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub wallets: BTreeMap<WalletId, bool>,
}

impl HealthReport {
    /// `Healthy` iff every probed wallet answered. An empty report is healthy.
    pub fn status(&self) -> HealthStatus {
        if self.wallets.values().all(|reachable| *reachable) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status() == HealthStatus::Healthy
    }
}

impl FromIterator<(WalletId, bool)> for HealthReport {
    fn from_iter<T: IntoIterator<Item = (WalletId, bool)>>(iter: T) -> Self {
        Self {
            wallets: iter.into_iter().collect(),
        }
    }
}
