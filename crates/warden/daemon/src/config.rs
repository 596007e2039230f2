//! Daemon configuration.
//!
//! Every governance knob the engine refuses to infer is an explicit flag
//! here, each with an environment fallback.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use warden_approvals::TimeoutOutcome;
use warden_service::GovernanceConfig;
use warden_types::RuleAction;

#[derive(Clone, Debug, Parser)]
#[command(name = "wardend", about = "Warden command governance daemon")]
pub struct DaemonConfig {
    /// Address the REST API binds to.
    #[arg(long, env = "WARDEN_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Credits debited per executed command.
    #[arg(long, env = "WARDEN_COMMAND_COST", default_value_t = 5)]
    pub command_cost: i64,

    /// Starting balance for newly created users.
    #[arg(long, env = "WARDEN_INITIAL_CREDITS", default_value_t = 100)]
    pub initial_credits: i64,

    /// Action applied when no rule matches a command.
    #[arg(long, env = "WARDEN_DEFAULT_ACTION", value_enum, default_value = "require-approval")]
    pub default_action: DefaultAction,

    /// Window granted to timed approvals before they time out, in seconds.
    #[arg(long, env = "WARDEN_APPROVAL_WINDOW_SECS", default_value_t = 900)]
    pub approval_window_secs: i64,

    /// What a pending timed approval becomes when its deadline elapses.
    #[arg(long, env = "WARDEN_TIMEOUT_OUTCOME", value_enum, default_value = "reject")]
    pub timeout_outcome: TimeoutOutcomeArg,

    /// How often the background sweep checks for overdue approvals.
    #[arg(long, env = "WARDEN_SWEEP_INTERVAL_SECS", default_value_t = 30)]
    pub sweep_interval_secs: u64,

    /// Mail of the bootstrap administrator seeded at startup.
    #[arg(long, env = "WARDEN_ADMIN_MAIL", default_value = "admin@warden.local")]
    pub admin_mail: String,

    #[arg(long, env = "WARDEN_ADMIN_NAME", default_value = "admin user")]
    pub admin_name: String,

    #[arg(long, env = "WARDEN_ADMIN_PHONE", default_value = "0000000000")]
    pub admin_phone: String,
}

impl DaemonConfig {
    pub fn governance(&self) -> GovernanceConfig {
        GovernanceConfig {
            command_cost: self.command_cost,
            initial_credits: self.initial_credits,
            default_action: self.default_action.into(),
            approval_window_secs: self.approval_window_secs,
            timeout_outcome: self.timeout_outcome.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DefaultAction {
    AutoAccept,
    AutoReject,
    RequireApproval,
    TimedApproval,
}

impl From<DefaultAction> for RuleAction {
    fn from(value: DefaultAction) -> Self {
        match value {
            DefaultAction::AutoAccept => RuleAction::AutoAccept,
            DefaultAction::AutoReject => RuleAction::AutoReject,
            DefaultAction::RequireApproval => RuleAction::RequireApproval,
            DefaultAction::TimedApproval => RuleAction::TimedApproval,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TimeoutOutcomeArg {
    Approve,
    Reject,
}

impl From<TimeoutOutcomeArg> for TimeoutOutcome {
    fn from(value: TimeoutOutcomeArg) -> Self {
        match value {
            TimeoutOutcomeArg::Approve => TimeoutOutcome::Approve,
            TimeoutOutcomeArg::Reject => TimeoutOutcome::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = DaemonConfig::parse_from(["wardend"]);
        assert_eq!(config.command_cost, 5);
        assert_eq!(config.default_action, DefaultAction::RequireApproval);
        assert_eq!(config.timeout_outcome, TimeoutOutcomeArg::Reject);
    }

    #[test]
    fn flags_override_defaults() {
        let config = DaemonConfig::parse_from([
            "wardend",
            "--command-cost",
            "2",
            "--timeout-outcome",
            "approve",
            "--default-action",
            "auto-reject",
        ]);
        assert_eq!(config.command_cost, 2);
        assert_eq!(
            TimeoutOutcome::from(config.timeout_outcome),
            TimeoutOutcome::Approve
        );
        assert_eq!(
            RuleAction::from(config.default_action),
            RuleAction::AutoReject
        );
    }
}
