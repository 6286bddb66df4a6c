//! Wallet health probe.

use std::sync::Arc;

use futures_util::future::join_all;
use lnrelay_types::{
    ConnectionDescriptor, HealthReport, PaymentError, WalletConnection, WalletConnector,
    WalletId, WalletRegistry,
};

/// Checks that registered wallets answer a balance query.
pub struct HealthProbe<C: WalletConnector> {
    registry: Arc<WalletRegistry>,
    connector: C,
}

impl<C: WalletConnector> HealthProbe<C> {
    pub fn new(registry: Arc<WalletRegistry>, connector: C) -> Self {
        Self {
            registry,
            connector,
        }
    }

    /// Probes `wallet`, or every registered wallet when `None`.
    ///
    /// Wallets are probed concurrently. A failed connect and a failed balance
    /// query both count as unreachable.
    #[tracing::instrument(skip(self))]
    pub async fn check(&self, wallet: Option<&WalletId>) -> Result<HealthReport, PaymentError> {
        let scope: Vec<(&WalletId, &ConnectionDescriptor)> = match wallet {
            Some(id) => {
                let descriptor =
                    self.registry
                        .resolve(id)
                        .ok_or_else(|| PaymentError::WalletNotFound {
                            side: None,
                            id: id.clone(),
                        })?;
                vec![(id, descriptor)]
            }
            None => self.registry.iter().collect(),
        };

        let probes = scope.into_iter().map(|(id, descriptor)| async move {
            let reachable = self.probe(id, descriptor).await;
            (id.clone(), reachable)
        });
        let report: HealthReport = join_all(probes).await.into_iter().collect();

        if !report.is_healthy() {
            tracing::warn!(wallets = ?report.wallets, "some wallets are unreachable");
        }
        Ok(report)
    }

    async fn probe(&self, id: &WalletId, descriptor: &ConnectionDescriptor) -> bool {
        let connection = match self.connector.connect(descriptor) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::debug!(wallet_id = %id, error = %e, "health connect failed");
                return false;
            }
        };
        match connection.get_balance().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(wallet_id = %id, error = %e, "health balance query failed");
                false
            }
        }
    }
}
