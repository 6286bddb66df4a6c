//! # Lnrelay Hex
//!
//! Application service layer and HTTP adapter for the payment relay.
//!
//! ## Architecture
//!
//! - `service/` - Relay orchestration (conversion, balance check, invoice, settlement)
//! - `health/` - Wallet reachability probe
//! - `locks/` - Optional per-sender serialization
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Both services are generic over `C: WalletConnector` and `O: PriceOracle`,
//! so the production NWC binding and the in-memory wallets are interchangeable.

pub mod health;
pub mod inbound;
pub mod locks;
pub mod openapi;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use health::HealthProbe;
pub use locks::SenderLocks;
pub use service::{OrchestratorOptions, PaymentOrchestrator, SameWalletPolicy};
