//! Unified error taxonomy for governance operations.

use thiserror::Error;
use warden_approvals::ApprovalError;
use warden_ledger::LedgerError;
use warden_policy::PolicyError;
use warden_rbac::RbacError;

/// Governance-level errors. Every mutating failure leaves all entities in
/// their pre-call state.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("insufficient credit: balance {balance}, required {required}")]
    InsufficientCredit { balance: i64, required: i64 },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl From<RbacError> for GovernanceError {
    fn from(value: RbacError) -> Self {
        match value {
            RbacError::UserNotFound(msg) => Self::NotFound(format!("user {}", msg)),
            RbacError::RoleNotFound(msg) => Self::NotFound(format!("role {}", msg)),
            RbacError::AlreadyExists(msg) => Self::Conflict(msg),
            RbacError::RoleInUse { .. } => Self::Conflict(value.to_string()),
            RbacError::Validation(msg) => Self::Validation(msg),
            RbacError::LockError => Self::Storage("rbac registry unavailable".to_string()),
        }
    }
}

impl From<PolicyError> for GovernanceError {
    fn from(value: PolicyError) -> Self {
        match value {
            PolicyError::NotFound(msg) => Self::NotFound(format!("rule {}", msg)),
            PolicyError::InvalidPattern(msg) => Self::Validation(format!("invalid pattern: {}", msg)),
            PolicyError::DuplicateRule { .. } | PolicyError::ConflictingRule { .. } => {
                Self::Conflict(value.to_string())
            }
            PolicyError::LockError => Self::Storage("rule store unavailable".to_string()),
        }
    }
}

impl From<ApprovalError> for GovernanceError {
    fn from(value: ApprovalError) -> Self {
        match value {
            ApprovalError::NotFound(msg) => Self::NotFound(format!("approval {}", msg)),
            ApprovalError::InvalidState { .. } => Self::InvalidState(value.to_string()),
            ApprovalError::Validation(msg) => Self::Validation(msg),
            ApprovalError::LockError => Self::Storage("approval engine unavailable".to_string()),
        }
    }
}

impl From<LedgerError> for GovernanceError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::AccountNotFound(msg) => Self::NotFound(format!("account {}", msg)),
            LedgerError::InsufficientCredit { balance, required } => {
                Self::InsufficientCredit { balance, required }
            }
            LedgerError::InvalidAmount(msg) => Self::Validation(msg),
            LedgerError::StorageUnavailable(msg) => Self::Storage(msg),
        }
    }
}
