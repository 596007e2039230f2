//! Governance configuration.

use warden_approvals::TimeoutOutcome;
use warden_types::RuleAction;

/// Deployment-level knobs. Both the no-match action and the timeout outcome
/// are explicit here; the engine never infers either.
#[derive(Clone, Copy, Debug)]
pub struct GovernanceConfig {
    /// Credits debited for each executed command.
    pub command_cost: i64,
    /// Starting balance for newly created users.
    pub initial_credits: i64,
    /// Action applied when no rule matches a command.
    pub default_action: RuleAction,
    /// Window granted to TIMED_APPROVAL requests before they time out.
    pub approval_window_secs: i64,
    /// What a PENDING request becomes when its deadline elapses.
    pub timeout_outcome: TimeoutOutcome,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            command_cost: 5,
            initial_credits: 100,
            default_action: RuleAction::RequireApproval,
            approval_window_secs: 15 * 60,
            timeout_outcome: TimeoutOutcome::Reject,
        }
    }
}
