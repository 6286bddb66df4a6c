//! Domain models for the payment relay.

pub mod health;
pub mod money;
pub mod payment;
pub mod registry;
pub mod wallet;

pub use health::{HealthReport, HealthStatus};
pub use money::{Balance, ExchangeRate, FiatAmount, Msats};
pub use payment::{Invoice, PaymentOutcome, SettlementResult};
pub use registry::WalletRegistry;
pub use wallet::{ConnectionDescriptor, Side, WalletId};
