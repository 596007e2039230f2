//! Warden Approvals - approval request lifecycle
//!
//! Every request is PENDING until exactly one resolution wins: an explicit
//! admin decision or, for deadline-carrying requests, the configured timeout
//! outcome. Transitions out of PENDING are guarded by the current status, so
//! a losing racer observes `InvalidState` instead of overwriting the record.
//!
//! Expiry is the pure check `is_expired(request, now)`. It runs lazily inside
//! every read as well as in the periodic sweep, so correctness never depends
//! on sweep cadence.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use warden_types::{ApprovalId, ApprovalRequest, ApprovalStatus, Resolver, UserId};

/// What a PENDING request becomes when its deadline elapses. This is an
/// explicit deployment choice, never inferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutOutcome {
    Approve,
    Reject,
}

impl TimeoutOutcome {
    pub fn terminal_status(&self) -> ApprovalStatus {
        match self {
            TimeoutOutcome::Approve => ApprovalStatus::Approved,
            TimeoutOutcome::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// True when the request is still PENDING and its deadline has passed.
pub fn is_expired(request: &ApprovalRequest, now: DateTime<Utc>) -> bool {
    request.status == ApprovalStatus::Pending
        && request.deadline.is_some_and(|deadline| deadline <= now)
}

/// Engine owning the lifecycle of all approval requests.
pub struct ApprovalEngine {
    requests: RwLock<HashMap<ApprovalId, ApprovalRequest>>,
    timeout_outcome: TimeoutOutcome,
}

impl ApprovalEngine {
    pub fn new(timeout_outcome: TimeoutOutcome) -> Self {
        Self {
            requests: RwLock::new(HashMap::new()),
            timeout_outcome,
        }
    }

    pub fn timeout_outcome(&self) -> TimeoutOutcome {
        self.timeout_outcome
    }

    /// Create a PENDING request. A deadline makes it subject to timeout
    /// resolution.
    pub fn create(
        &self,
        user_id: UserId,
        command: impl Into<String>,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let request = ApprovalRequest {
            approval_id: ApprovalId::generate(),
            user_id,
            command: command.into(),
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
            deadline,
            resolver: None,
            resolved_at: None,
        };
        let mut requests = self.requests.write().map_err(|_| ApprovalError::LockError)?;
        requests.insert(request.approval_id.clone(), request.clone());
        tracing::info!(approval_id = %request.approval_id, "created approval request");
        Ok(request)
    }

    /// Resolve a request to a terminal status on behalf of an administrator.
    ///
    /// A request whose deadline already passed is timed out first; the admin
    /// resolution then loses with `InvalidState`, exactly as if the sweep had
    /// run.
    pub fn resolve(
        &self,
        approval_id: &ApprovalId,
        status: ApprovalStatus,
        resolver: UserId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest, ApprovalError> {
        if !status.is_terminal() {
            return Err(ApprovalError::Validation(
                "resolution status must be APPROVED or REJECTED".to_string(),
            ));
        }

        let mut requests = self.requests.write().map_err(|_| ApprovalError::LockError)?;
        let request = requests
            .get_mut(approval_id)
            .ok_or_else(|| ApprovalError::NotFound(approval_id.0.clone()))?;

        expire_in_place(request, now, self.timeout_outcome);
        if request.status.is_terminal() {
            return Err(ApprovalError::InvalidState {
                approval_id: approval_id.0.clone(),
                status: request.status,
            });
        }

        request.status = status;
        request.resolver = Some(Resolver::Admin(resolver));
        request.resolved_at = Some(now);
        tracing::info!(approval_id = %request.approval_id, ?status, "resolved approval request");
        Ok(request.clone())
    }

    /// Fetch one request, timing it out first if due.
    pub fn get(
        &self,
        approval_id: &ApprovalId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let mut requests = self.requests.write().map_err(|_| ApprovalError::LockError)?;
        let request = requests
            .get_mut(approval_id)
            .ok_or_else(|| ApprovalError::NotFound(approval_id.0.clone()))?;
        expire_in_place(request, now, self.timeout_outcome);
        Ok(request.clone())
    }

    /// All requests, newest first, with due timeouts applied before returning.
    pub fn list(&self, now: DateTime<Utc>) -> Result<Vec<ApprovalRequest>, ApprovalError> {
        let mut requests = self.requests.write().map_err(|_| ApprovalError::LockError)?;
        for request in requests.values_mut() {
            expire_in_place(request, now, self.timeout_outcome);
        }
        let mut list: Vec<_> = requests.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    /// Resolve every PENDING request whose deadline has passed. Returns how
    /// many were timed out.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<usize, ApprovalError> {
        let mut requests = self.requests.write().map_err(|_| ApprovalError::LockError)?;
        let mut swept = 0;
        for request in requests.values_mut() {
            if expire_in_place(request, now, self.timeout_outcome) {
                swept += 1;
            }
        }
        if swept > 0 {
            tracing::debug!(swept, "timed out overdue approval requests");
        }
        Ok(swept)
    }

    /// Remove a request in any state. Ledger and audit records are unaffected.
    pub fn delete(&self, approval_id: &ApprovalId) -> Result<ApprovalRequest, ApprovalError> {
        let mut requests = self.requests.write().map_err(|_| ApprovalError::LockError)?;
        requests
            .remove(approval_id)
            .ok_or_else(|| ApprovalError::NotFound(approval_id.0.clone()))
    }

    pub fn pending_count(&self, now: DateTime<Utc>) -> Result<usize, ApprovalError> {
        Ok(self
            .list(now)?
            .iter()
            .filter(|request| request.status == ApprovalStatus::Pending)
            .count())
    }
}

/// Apply the timeout transition if due. Caller holds the write lock, so the
/// check and the mutation are one atomic step. Returns whether a transition
/// happened.
fn expire_in_place(
    request: &mut ApprovalRequest,
    now: DateTime<Utc>,
    outcome: TimeoutOutcome,
) -> bool {
    if !is_expired(request, now) {
        return false;
    }
    request.status = outcome.terminal_status();
    request.resolver = Some(Resolver::Timeout);
    request.resolved_at = Some(now);
    true
}

/// Approval-related errors
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("approval request not found: {0}")]
    NotFound(String),

    #[error("approval request {approval_id} is already {status:?}")]
    InvalidState {
        approval_id: String,
        status: ApprovalStatus,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("lock error")]
    LockError,
}
