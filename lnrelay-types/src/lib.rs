//! # Lnrelay Types
//!
//! Domain types and port traits for the Lightning payment relay.
//! This crate has no IO of its own: only data structures, business rules
//! and the trait definitions adapters implement.
//!
//! ## Architecture
//!
//! This crate is the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (WalletId, WalletRegistry, Invoice, PaymentOutcome)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Balance, ConnectionDescriptor, ExchangeRate, FiatAmount, HealthReport, HealthStatus, Invoice,
    Msats, PaymentOutcome, SettlementResult, Side, WalletId, WalletRegistry,
};
pub use dto::*;
pub use error::{AppError, PaymentError, WalletError};
pub use ports::{WalletConnection, WalletConnector};
