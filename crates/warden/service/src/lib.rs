//! Warden Service - the governance composition root
//!
//! This crate wires the rule store, approval engine, RBAC registry, credit
//! ledger, and audit log into the operations the REST surface exposes. Every
//! mutating operation passes the central authorization gate first, and
//! multi-component operations are arranged so a failure leaves no partial
//! effect visible.

#![deny(unsafe_code)]

mod authz;
mod config;
mod error;
mod service;

pub use authz::Operation;
pub use config::GovernanceConfig;
pub use error::GovernanceError;
pub use service::{
    DashboardSummary, ExecutionOutcome, GovernanceService, RoleAssignment, UpdateUser, UserAccount,
};
