//! In-memory wallets.
//!
//! A [`MemoryConnector`] owns a set of wallets living in process memory.
//! Paying an invoice moves funds between them, so a whole relay can run
//! without a Lightning node. Balances, routing fees, latency and failures
//! are all controllable, and every call is counted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use lnrelay_types::{
    Balance, ConnectionDescriptor, Invoice, Msats, SettlementResult, WalletConnection,
    WalletConnector, WalletError, WalletId, WalletRegistry,
};

/// Descriptor scheme understood by [`MemoryConnector`].
pub const MEMORY_SCHEME: &str = "memory://";

/// Failures to inject into one wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    pub connect: bool,
    pub balance: bool,
    pub invoice: bool,
    pub settle: bool,
    /// Balance and invoice replies arrive but cannot be decoded.
    pub malformed: bool,
}

impl Faults {
    /// Every operation fails.
    pub fn offline() -> Self {
        Self {
            connect: true,
            balance: true,
            invoice: true,
            settle: true,
            ..Self::default()
        }
    }
}

/// How often each operation was attempted on one wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub connect: usize,
    pub balance: usize,
    pub invoice: usize,
    pub pay: usize,
}

#[derive(Debug, Default)]
struct WalletState {
    balance: Balance,
    faults: Faults,
    calls: CallCounts,
}

#[derive(Debug)]
struct IssuedInvoice {
    payee: WalletId,
    amount: Msats,
    paid: bool,
}

#[derive(Debug, Default)]
struct Ledger {
    wallets: HashMap<WalletId, WalletState>,
    invoices: HashMap<String, IssuedInvoice>,
    issued: u64,
    fee: Msats,
    latency: Duration,
}

#[derive(Debug, Default)]
struct Shared {
    ledger: Mutex<Ledger>,
}

impl Shared {
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        let latency = self.ledger().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

/// Connector for in-memory wallets. Clones share the same wallets.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<Shared>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routing fee charged to the payer on every settlement.
    ///
    /// Applies to every clone, and keeps the wallets already added.
    pub fn with_fee(self, fee: Msats) -> Self {
        self.shared.ledger().fee = fee;
        self
    }

    /// Delay applied to every balance, invoice and pay call.
    ///
    /// Applies to every clone, and keeps the wallets already added.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.shared.ledger().latency = latency;
        self
    }

    /// Adds a wallet and returns the descriptor that connects to it.
    pub fn add_wallet(&self, name: &str, balance: Balance) -> ConnectionDescriptor {
        let id = WalletId::new(name);
        let descriptor = ConnectionDescriptor::new(format!("{MEMORY_SCHEME}{id}"));
        self.shared.ledger().wallets.insert(
            id,
            WalletState {
                balance,
                ..WalletState::default()
            },
        );
        descriptor
    }

    /// Registry holding every wallet of this connector.
    pub fn registry(&self) -> WalletRegistry {
        self.shared
            .ledger()
            .wallets
            .keys()
            .map(|id| {
                let descriptor = ConnectionDescriptor::new(format!("{MEMORY_SCHEME}{id}"));
                (id.clone(), descriptor)
            })
            .collect()
    }

    pub fn set_faults(&self, name: &str, faults: Faults) {
        if let Some(wallet) = self.shared.ledger().wallets.get_mut(&WalletId::new(name)) {
            wallet.faults = faults;
        }
    }

    pub fn set_balance(&self, name: &str, balance: Balance) {
        if let Some(wallet) = self.shared.ledger().wallets.get_mut(&WalletId::new(name)) {
            wallet.balance = balance;
        }
    }

    pub fn balance(&self, name: &str) -> Option<Balance> {
        self.shared
            .ledger()
            .wallets
            .get(&WalletId::new(name))
            .map(|wallet| wallet.balance)
    }

    pub fn calls(&self, name: &str) -> CallCounts {
        self.shared
            .ledger()
            .wallets
            .get(&WalletId::new(name))
            .map(|wallet| wallet.calls)
            .unwrap_or_default()
    }
}

impl WalletConnector for MemoryConnector {
    type Connection = MemoryConnection;

    fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<MemoryConnection, WalletError> {
        let name = descriptor
            .expose()
            .strip_prefix(MEMORY_SCHEME)
            .ok_or_else(|| WalletError::Connection("not a memory wallet descriptor".into()))?;
        let id = WalletId::new(name);

        let mut ledger = self.shared.ledger();
        let wallet = ledger
            .wallets
            .get_mut(&id)
            .ok_or_else(|| WalletError::Connection(format!("no memory wallet named {id}")))?;
        wallet.calls.connect += 1;
        if wallet.faults.connect {
            return Err(WalletError::Connection(format!("{id} refused the connection")));
        }

        Ok(MemoryConnection {
            wallet: id,
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Session with one in-memory wallet.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    wallet: WalletId,
    shared: Arc<Shared>,
}

impl MemoryConnection {
    fn with_wallet<T>(
        &self,
        f: impl FnOnce(&mut WalletState) -> Result<T, WalletError>,
    ) -> Result<T, WalletError> {
        let mut ledger = self.shared.ledger();
        let wallet = ledger
            .wallets
            .get_mut(&self.wallet)
            .ok_or_else(|| WalletError::Connection(format!("{} no longer exists", self.wallet)))?;
        f(wallet)
    }
}

#[async_trait]
impl WalletConnection for MemoryConnection {
    async fn get_balance(&self) -> Result<Balance, WalletError> {
        self.shared.delay().await;
        self.with_wallet(|wallet| {
            wallet.calls.balance += 1;
            if wallet.faults.balance {
                return Err(WalletError::Connection("balance query failed".into()));
            }
            if wallet.faults.malformed {
                return Err(WalletError::Protocol("balance reply is not a number".into()));
            }
            Ok(wallet.balance)
        })
    }

    async fn make_invoice(&self, amount: Msats, memo: &str) -> Result<Invoice, WalletError> {
        self.shared.delay().await;
        self.with_wallet(|wallet| {
            wallet.calls.invoice += 1;
            if wallet.faults.invoice {
                return Err(WalletError::Connection("invoice creation failed".into()));
            }
            if wallet.faults.malformed {
                return Err(WalletError::Protocol("invoice reply has no invoice".into()));
            }
            if amount.is_zero() {
                return Err(WalletError::InvalidAmount(
                    "invoice amount must be positive".into(),
                ));
            }
            Ok(())
        })?;

        let mut ledger = self.shared.ledger();
        ledger.issued += 1;
        let bolt11 = format!("lnmem{}n1{}{:08}", amount.get(), self.wallet, ledger.issued)
            .to_lowercase();
        ledger.invoices.insert(
            bolt11.clone(),
            IssuedInvoice {
                payee: self.wallet.clone(),
                amount,
                paid: false,
            },
        );

        Ok(Invoice::new(bolt11, amount, memo))
    }

    async fn pay_invoice(&self, invoice: Invoice) -> Result<SettlementResult, WalletError> {
        self.shared.delay().await;
        let mut ledger = self.shared.ledger();
        let ledger = &mut *ledger;
        let fee = ledger.fee;

        let payer = ledger
            .wallets
            .get_mut(&self.wallet)
            .ok_or_else(|| WalletError::Connection(format!("{} no longer exists", self.wallet)))?;
        payer.calls.pay += 1;
        if payer.faults.settle {
            return Err(WalletError::SettlementFailed("no route found".into()));
        }

        let issued = ledger
            .invoices
            .get_mut(&invoice.bolt11)
            .ok_or_else(|| WalletError::SettlementFailed("unknown invoice".into()))?;
        if issued.paid {
            return Err(WalletError::SettlementFailed("invoice already paid".into()));
        }

        let total = i128::from(issued.amount.get()) + i128::from(fee.get());
        if i128::from(payer.balance) < total {
            return Err(WalletError::SettlementFailed(format!(
                "insufficient liquidity: need {total} msats, have {}",
                payer.balance
            )));
        }

        // Both fit in i64 since total is bounded by the payer's balance.
        payer.balance -= total as i64;
        issued.paid = true;
        let amount = issued.amount.get() as i64;
        let payee = issued.payee.clone();
        if let Some(payee) = ledger.wallets.get_mut(&payee) {
            payee.balance += amount;
        }

        Ok(SettlementResult {
            success: true,
            fees_paid: fee,
            preimage: Some(format!("{:064x}", ledger.issued)),
        })
    }
}
