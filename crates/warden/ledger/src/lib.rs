//! Warden Ledger - credit accounts and the audit trail
//!
//! Two accountability surfaces live here: the per-user credit ledger debited
//! on command execution, and the append-only audit log recording every
//! submitted command. Nothing in this crate ever executes a command.

#![deny(unsafe_code)]

mod audit;
mod credits;

pub use audit::{AuditLog, AuditStatistics, LogQuery};
pub use credits::CreditLedger;

use thiserror::Error;

/// Ledger-related errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no credit account for user: {0}")]
    AccountNotFound(String),

    #[error("insufficient credit: balance {balance}, required {required}")]
    InsufficientCredit { balance: i64, required: i64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}
