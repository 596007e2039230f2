//! The governance service itself.

use crate::{GovernanceConfig, GovernanceError, Operation};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warden_approvals::ApprovalEngine;
use warden_ledger::{AuditLog, AuditStatistics, CreditLedger, LedgerError};
use warden_policy::{RuleCreated, RuleStore};
use warden_rbac::{NewRole, NewUser, RbacRegistry, RoleUpdate, UserUpdate};
use warden_types::{
    ApprovalId, ApprovalRequest, ApprovalStatus, CommandLogEntry, Decision, LogAction, Permission,
    Role, RoleId, Rule, RuleAction, RuleId, User, UserId,
};

/// Composition root over all governance components.
///
/// The service owns the components behind `Arc` so the REST surface and the
/// background sweeper share one instance.
pub struct GovernanceService {
    rbac: Arc<RbacRegistry>,
    rules: Arc<RuleStore>,
    approvals: Arc<ApprovalEngine>,
    credits: Arc<CreditLedger>,
    audit: Arc<AuditLog>,
    config: GovernanceConfig,
}

impl GovernanceService {
    pub fn new(config: GovernanceConfig) -> Self {
        Self {
            rbac: Arc::new(RbacRegistry::new()),
            rules: Arc::new(RuleStore::new(config.default_action)),
            approvals: Arc::new(ApprovalEngine::new(config.timeout_outcome)),
            credits: Arc::new(CreditLedger::new()),
            audit: Arc::new(AuditLog::new()),
            config,
        }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Resolve a bearer credential to its user.
    pub fn authenticate(&self, api_key: &str) -> Result<Option<User>, GovernanceError> {
        Ok(self.rbac.resolve_api_key(api_key)?)
    }

    /// Register the bootstrap administrator if absent. Returns the user and
    /// whether it was newly created.
    pub fn seed_admin(
        &self,
        mail: &str,
        name: &str,
        phone: &str,
    ) -> Result<(User, bool), GovernanceError> {
        let (user, created) = self.rbac.upsert_admin(mail, name, phone)?;
        if created {
            self.credits
                .open_account(&user.user_id, self.config.initial_credits)?;
        }
        Ok((user, created))
    }

    /// Time out every overdue approval request. Called by the periodic
    /// sweeper; reads apply the same check lazily, so this is advisory.
    pub fn sweep_approvals(&self) -> Result<usize, GovernanceError> {
        Ok(self.approvals.sweep(Utc::now())?)
    }

    fn authorize(&self, caller: &User, operation: Operation) -> Result<(), GovernanceError> {
        let effective = self.rbac.effective_permission(caller)?;
        if effective >= operation.required_permission() {
            Ok(())
        } else {
            Err(GovernanceError::Forbidden(format!(
                "{:?} requires {} permission",
                operation,
                operation.required_permission()
            )))
        }
    }

    // ── command execution ───────────────────────────────────────────

    /// Evaluate a command for the caller and apply the routing decision.
    ///
    /// Exactly one audit entry is appended per call, whatever the outcome.
    /// The debit and the approval-request creation are each rolled back if
    /// the audit append fails: an unaudited action is never accepted.
    pub fn execute_command(
        &self,
        caller: &User,
        command: &str,
    ) -> Result<ExecutionOutcome, GovernanceError> {
        self.authorize(caller, Operation::ExecuteCommand)?;
        if command.trim().is_empty() {
            return Err(GovernanceError::Validation(
                "command must not be empty".to_string(),
            ));
        }

        let verdict = self.rules.evaluate(command)?;
        let rule_note = verdict
            .matched
            .as_ref()
            .map(|rule| format!("rule {} ({})", rule.rule_id, rule.pattern))
            .unwrap_or_else(|| "no matching rule; default action applied".to_string());

        match verdict.action {
            RuleAction::AutoAccept => {
                match self.credits.debit(&caller.user_id, self.config.command_cost) {
                    Ok(_) => {}
                    Err(LedgerError::InsufficientCredit { balance, required }) => {
                        self.audit.append(
                            caller.user_id.clone(),
                            LogAction::Rejected,
                            command,
                            Some(format!(
                                "insufficient credit: balance {}, required {}",
                                balance, required
                            )),
                        )?;
                        return Err(GovernanceError::InsufficientCredit { balance, required });
                    }
                    Err(err) => return Err(err.into()),
                }

                let entry = match self.audit.append(
                    caller.user_id.clone(),
                    LogAction::Executed,
                    command,
                    Some(rule_note),
                ) {
                    Ok(entry) => entry,
                    Err(err) => {
                        // Refund: the command is not accepted unaudited.
                        let _ = self.credits.adjust(&caller.user_id, self.config.command_cost);
                        return Err(err.into());
                    }
                };

                Ok(ExecutionOutcome {
                    decision: Decision::Accept,
                    message: "Command executed successfully".to_string(),
                    log_entry: entry,
                })
            }

            RuleAction::AutoReject => {
                let entry = self.audit.append(
                    caller.user_id.clone(),
                    LogAction::Rejected,
                    command,
                    Some(rule_note),
                )?;
                Ok(ExecutionOutcome {
                    decision: Decision::Reject,
                    message: "Command rejected by rule".to_string(),
                    log_entry: entry,
                })
            }

            RuleAction::RequireApproval | RuleAction::TimedApproval => {
                let deadline = (verdict.action == RuleAction::TimedApproval)
                    .then(|| Utc::now() + Duration::seconds(self.config.approval_window_secs));
                let request =
                    self.approvals
                        .create(caller.user_id.clone(), command, deadline)?;

                let entry = match self.audit.append(
                    caller.user_id.clone(),
                    LogAction::Queued,
                    command,
                    Some(rule_note),
                ) {
                    Ok(entry) => entry,
                    Err(err) => {
                        let _ = self.approvals.delete(&request.approval_id);
                        return Err(err.into());
                    }
                };

                Ok(ExecutionOutcome {
                    decision: Decision::PendingApproval(request.approval_id),
                    message: "Command requires approval".to_string(),
                    log_entry: entry,
                })
            }
        }
    }

    pub fn credits(&self, caller: &User) -> Result<i64, GovernanceError> {
        self.authorize(caller, Operation::ViewOwnCredits)?;
        Ok(self.credits.balance(&caller.user_id)?)
    }

    pub fn history(&self, caller: &User) -> Result<Vec<CommandLogEntry>, GovernanceError> {
        self.authorize(caller, Operation::ViewOwnHistory)?;
        Ok(self.audit.for_user(&caller.user_id)?)
    }

    pub fn dashboard(&self, caller: &User) -> Result<DashboardSummary, GovernanceError> {
        self.authorize(caller, Operation::ViewDashboard)?;
        Ok(DashboardSummary {
            total_users: self.rbac.list_users()?.len(),
            total_roles: self.rbac.list_roles()?.len(),
            total_rules: self.rules.list_rules()?.len(),
            pending_approvals: self.approvals.pending_count(Utc::now())?,
            audit: self.audit.statistics()?,
        })
    }

    // ── user management ─────────────────────────────────────────────

    pub fn create_user(&self, caller: &User, request: NewUser) -> Result<User, GovernanceError> {
        self.authorize(caller, Operation::ManageUsers)?;
        let user = self.rbac.create_user(request)?;
        self.credits
            .open_account(&user.user_id, self.config.initial_credits)?;
        Ok(user)
    }

    /// Delete a user and close their credit account. Audit entries stay.
    pub fn delete_user(&self, caller: &User, user_id: &UserId) -> Result<User, GovernanceError> {
        self.authorize(caller, Operation::ManageUsers)?;
        let user = self.rbac.delete_user(user_id)?;
        if let Err(err) = self.credits.close_account(user_id) {
            tracing::warn!(user_id = %user_id, %err, "credit account missing at user deletion");
        }
        Ok(user)
    }

    pub fn update_user(
        &self,
        caller: &User,
        user_id: &UserId,
        update: UpdateUser,
    ) -> Result<UserAccount, GovernanceError> {
        self.authorize(caller, Operation::ManageUsers)?;
        let user = self.rbac.update_user(
            user_id,
            UserUpdate {
                name: update.name,
                phone: update.phone,
                permission: update.permission,
            },
        )?;
        if let Some(target) = update.credits {
            let balance = self.credits.balance(user_id)?;
            self.credits.adjust(user_id, target - balance)?;
        }
        let credits = self.credits.balance(user_id)?;
        Ok(UserAccount { user, credits })
    }

    pub fn list_users(&self, caller: &User) -> Result<Vec<UserAccount>, GovernanceError> {
        self.authorize(caller, Operation::ManageUsers)?;
        let users = self.rbac.list_users()?;
        users
            .into_iter()
            .map(|user| {
                let credits = self.credits.balance(&user.user_id).unwrap_or(0);
                Ok(UserAccount { user, credits })
            })
            .collect()
    }

    // ── rule management ─────────────────────────────────────────────

    pub fn create_rule(
        &self,
        caller: &User,
        pattern: &str,
        action: RuleAction,
    ) -> Result<RuleCreated, GovernanceError> {
        self.authorize(caller, Operation::ManageRules)?;
        Ok(self.rules.add_rule(pattern, action)?)
    }

    pub fn delete_rule(&self, caller: &User, rule_id: &RuleId) -> Result<Rule, GovernanceError> {
        self.authorize(caller, Operation::ManageRules)?;
        Ok(self.rules.remove_rule(rule_id)?)
    }

    pub fn list_rules(&self, caller: &User) -> Result<Vec<Rule>, GovernanceError> {
        self.authorize(caller, Operation::ManageRules)?;
        Ok(self.rules.list_rules()?)
    }

    pub fn logs(&self, caller: &User) -> Result<Vec<CommandLogEntry>, GovernanceError> {
        self.authorize(caller, Operation::ViewLogs)?;
        Ok(self.audit.query(Default::default())?)
    }

    // ── role management ─────────────────────────────────────────────

    pub fn create_role(
        &self,
        caller: &User,
        name: &str,
        description: &str,
    ) -> Result<Role, GovernanceError> {
        self.authorize(caller, Operation::ManageRoles)?;
        Ok(self.rbac.create_role(NewRole {
            name: name.to_string(),
            description: description.to_string(),
            grants: None,
        })?)
    }

    pub fn delete_role(&self, caller: &User, role_id: &RoleId) -> Result<Role, GovernanceError> {
        self.authorize(caller, Operation::ManageRoles)?;
        Ok(self.rbac.delete_role(role_id)?)
    }

    pub fn update_role(
        &self,
        caller: &User,
        role_id: &RoleId,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Role, GovernanceError> {
        self.authorize(caller, Operation::ManageRoles)?;
        Ok(self.rbac.update_role(role_id, RoleUpdate { name, description })?)
    }

    pub fn list_roles(&self, caller: &User) -> Result<Vec<Role>, GovernanceError> {
        self.authorize(caller, Operation::ManageRoles)?;
        Ok(self.rbac.list_roles()?)
    }

    /// Assign a role. Self-demotion is allowed, but the caller is warned when
    /// the assignment costs them their own admin permission.
    pub fn assign_role(
        &self,
        caller: &User,
        user_id: &UserId,
        role_id: &RoleId,
    ) -> Result<RoleAssignment, GovernanceError> {
        self.authorize(caller, Operation::ManageRoles)?;

        let user = self.rbac.assign_role(user_id, role_id)?;
        let warning = if caller.user_id == *user_id
            && self.rbac.effective_permission(&user)? != Permission::Admin
        {
            Some(
                "this assignment removes your own admin permission; you may be locked out of \
                 administrative operations"
                    .to_string(),
            )
        } else {
            None
        };
        Ok(RoleAssignment { user, warning })
    }

    // ── approval management ─────────────────────────────────────────

    pub fn list_approvals(&self, caller: &User) -> Result<Vec<ApprovalRequest>, GovernanceError> {
        self.authorize(caller, Operation::ManageApprovals)?;
        Ok(self.approvals.list(Utc::now())?)
    }

    /// Queue a command for approval on a user's behalf. The queued command is
    /// audited like any other submission.
    pub fn create_approval(
        &self,
        caller: &User,
        user_id: &UserId,
        command: &str,
    ) -> Result<ApprovalRequest, GovernanceError> {
        self.authorize(caller, Operation::ManageApprovals)?;
        if command.trim().is_empty() {
            return Err(GovernanceError::Validation(
                "command must not be empty".to_string(),
            ));
        }
        let user = self.rbac.get_user(user_id)?;
        let request = self.approvals.create(user.user_id.clone(), command, None)?;

        if let Err(err) = self.audit.append(
            user.user_id,
            LogAction::Queued,
            command,
            Some(format!("queued by administrator {}", caller.user_id)),
        ) {
            let _ = self.approvals.delete(&request.approval_id);
            return Err(err.into());
        }
        Ok(request)
    }

    pub fn resolve_approval(
        &self,
        caller: &User,
        approval_id: &ApprovalId,
        status: ApprovalStatus,
    ) -> Result<ApprovalRequest, GovernanceError> {
        self.authorize(caller, Operation::ManageApprovals)?;
        Ok(self
            .approvals
            .resolve(approval_id, status, caller.user_id.clone(), Utc::now())?)
    }

    pub fn delete_approval(
        &self,
        caller: &User,
        approval_id: &ApprovalId,
    ) -> Result<ApprovalRequest, GovernanceError> {
        self.authorize(caller, Operation::ManageApprovals)?;
        Ok(self.approvals.delete(approval_id)?)
    }
}

/// The caller-visible result of submitting a command.
#[derive(Clone, Debug, Serialize)]
pub struct ExecutionOutcome {
    pub decision: Decision,
    pub message: String,
    pub log_entry: CommandLogEntry,
}

/// A user joined with their ledger balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(flatten)]
    pub user: User,
    pub credits: i64,
}

/// Result of a role assignment, carrying the lock-out warning when the caller
/// demoted themselves.
#[derive(Clone, Debug, Serialize)]
pub struct RoleAssignment {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Partial administrative user update.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub permission: Option<Permission>,
    /// Target balance; applied through the ledger as an adjustment.
    pub credits: Option<i64>,
}

/// Aggregate counters for the admin dashboard.
#[derive(Clone, Debug, Serialize)]
pub struct DashboardSummary {
    pub total_users: usize,
    pub total_roles: usize,
    pub total_rules: usize,
    pub pending_approvals: usize,
    pub audit: AuditStatistics,
}
