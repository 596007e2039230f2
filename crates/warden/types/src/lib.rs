//! Warden Types - the shared vocabulary of the governance engine
#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);
impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(pub String);
impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);
impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub String);
impl ApprovalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
impl std::fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntryId(pub String);
impl LogEntryId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Permission level a role grants or a user carries directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    Member,
    Admin,
}

impl Permission {
    pub fn is_admin(&self) -> bool {
        matches!(self, Permission::Admin)
    }

    /// Parse the wire form used by user and role payloads.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Permission::Admin),
            "MEMBER" => Some(Permission::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Admin => write!(f, "ADMIN"),
            Permission::Member => write!(f, "MEMBER"),
        }
    }
}

/// What a rule does to a matching command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    AutoAccept,
    AutoReject,
    RequireApproval,
    TimedApproval,
}

impl RuleAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AUTO_ACCEPT" => Some(RuleAction::AutoAccept),
            "AUTO_REJECT" => Some(RuleAction::AutoReject),
            "REQUIRE_APPROVAL" => Some(RuleAction::RequireApproval),
            "TIMED_APPROVAL" => Some(RuleAction::TimedApproval),
            _ => None,
        }
    }

    pub fn defers_to_approval(&self) -> bool {
        matches!(self, RuleAction::RequireApproval | RuleAction::TimedApproval)
    }
}

/// A pattern-to-action mapping, in evaluation order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: RuleId,
    pub pattern: String,
    pub action: RuleAction,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A registered user. The credit balance is owned by the ledger and joined
/// into views by the service layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub mail: String,
    pub name: String,
    pub phone: String,
    /// Permission carried by the account itself; an assigned role overrides it.
    pub permission: Permission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    pub api_key: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Role {
    pub role_id: RoleId,
    pub name: String,
    pub description: String,
    pub grants: Permission,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Lifecycle status of an approval request. PENDING is the only non-terminal
/// state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(ApprovalStatus::Pending),
            "APPROVED" => Some(ApprovalStatus::Approved),
            "REJECTED" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

/// Who (or what) resolved an approval request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolver {
    Admin(UserId),
    Timeout,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub approval_id: ApprovalId,
    pub user_id: UserId,
    pub command: String,
    pub status: ApprovalStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<Resolver>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Action recorded in the audit log for a submitted command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
    Executed,
    Rejected,
    Queued,
}

impl std::fmt::Display for LogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogAction::Executed => write!(f, "EXECUTED"),
            LogAction::Rejected => write!(f, "REJECTED"),
            LogAction::Queued => write!(f, "QUEUED"),
        }
    }
}

/// Append-only audit record for one submitted command.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandLogEntry {
    pub entry_id: LogEntryId,
    pub user_id: UserId,
    pub action: LogAction,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Outcome of policy evaluation for one submitted command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Reject,
    PendingApproval(ApprovalId),
}

impl Decision {
    pub fn allows_execution(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_parses_wire_form() {
        assert_eq!(Permission::parse("admin"), Some(Permission::Admin));
        assert_eq!(Permission::parse(" MEMBER "), Some(Permission::Member));
        assert_eq!(Permission::parse("root"), None);
    }

    #[test]
    fn rule_action_round_trips_through_json() {
        let json = serde_json::to_string(&RuleAction::RequireApproval).unwrap();
        assert_eq!(json, "\"REQUIRE_APPROVAL\"");
        let back: RuleAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RuleAction::RequireApproval);
    }

    #[test]
    fn approval_status_terminality() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
    }

    #[test]
    fn decision_execution_gate() {
        assert!(Decision::Accept.allows_execution());
        assert!(!Decision::Reject.allows_execution());
        assert!(!Decision::PendingApproval(ApprovalId::generate()).allows_execution());
    }
}
