//! Domain types for the fund-accounting engine.
//!
//! This module provides:
//! - Lossless monetary arithmetic via the Decimal wrapper
//! - Domain primitives: TimeMs, ClientId, Period
//! - Typed ledger records: BalanceSnapshot, CapitalEvent, Trade
//! - The persisted monthly statement: MonthlySnapshot / MonthStats
//! - The append-only audit trail entry

pub mod audit;
pub mod balance;
pub mod capital;
pub mod client;
pub mod decimal;
pub mod primitives;
pub mod snapshot;
pub mod trade;

pub use audit::{AuditKind, AuditLogEntry};
pub use balance::BalanceSnapshot;
pub use capital::{CapitalEvent, CapitalKind};
pub use client::Client;
pub use decimal::Decimal;
pub use primitives::{ClientId, Period, TimeMs};
pub use snapshot::{MonthStats, MonthlySnapshot, OpeningSource, TradeStats};
pub use trade::{Side, Trade};
