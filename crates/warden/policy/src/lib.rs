//! Warden Policy - rule store and command evaluation
//!
//! Rules are ordered pattern-to-action mappings. Evaluation walks the rules in
//! creation order over an immutable snapshot and the first match wins; a
//! command no rule matches falls to the configured default action, never to a
//! silent accept.

#![deny(unsafe_code)]

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use thiserror::Error;
use warden_types::{Rule, RuleAction, RuleId};

/// A rule together with its compiled pattern.
#[derive(Clone, Debug)]
pub struct CompiledRule {
    pub rule: Rule,
    regex: Regex,
}

impl CompiledRule {
    pub fn matches(&self, command: &str) -> bool {
        self.regex.is_match(command)
    }
}

/// Ordered rule store. Insertion order is evaluation order.
pub struct RuleStore {
    rules: RwLock<Vec<CompiledRule>>,
    default_action: RuleAction,
}

impl RuleStore {
    /// `default_action` applies when no rule matches; it must be an explicit
    /// deployment choice.
    pub fn new(default_action: RuleAction) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            default_action,
        }
    }

    pub fn default_action(&self) -> RuleAction {
        self.default_action
    }

    /// Add a rule at the end of the evaluation order.
    ///
    /// The pattern is compiled here; a malformed pattern never reaches
    /// evaluation. An identical pattern is rejected outright, and overlapping
    /// patterns with a different action are reported so operators can see
    /// shadowing before it bites.
    pub fn add_rule(&self, pattern: &str, action: RuleAction) -> Result<RuleCreated, PolicyError> {
        let regex = Regex::new(pattern)
            .map_err(|err| PolicyError::InvalidPattern(err.to_string()))?;

        let mut rules = self.rules.write().map_err(|_| PolicyError::LockError)?;

        let mut overlaps = Vec::new();
        for existing in rules.iter() {
            if existing.rule.pattern == pattern {
                if existing.rule.action == action {
                    return Err(PolicyError::DuplicateRule {
                        rule_id: existing.rule.rule_id.0.clone(),
                    });
                }
                return Err(PolicyError::ConflictingRule {
                    rule_id: existing.rule.rule_id.0.clone(),
                    action: existing.rule.action,
                });
            }

            let existing_matches_new = existing.matches(pattern);
            let new_matches_existing = regex.is_match(&existing.rule.pattern);
            let is_substring = pattern.contains(&existing.rule.pattern)
                || existing.rule.pattern.contains(pattern);
            if (existing_matches_new || new_matches_existing || is_substring)
                && existing.rule.action != action
            {
                overlaps.push(existing.rule.clone());
            }
        }

        let rule = Rule {
            rule_id: RuleId::generate(),
            pattern: pattern.to_string(),
            action,
            created_at: chrono::Utc::now(),
        };
        rules.push(CompiledRule {
            rule: rule.clone(),
            regex,
        });

        if !overlaps.is_empty() {
            tracing::warn!(
                rule_id = %rule.rule_id,
                overlaps = overlaps.len(),
                "rule overlaps existing rules with different actions"
            );
        }
        Ok(RuleCreated { rule, overlaps })
    }

    pub fn remove_rule(&self, rule_id: &RuleId) -> Result<Rule, PolicyError> {
        let mut rules = self.rules.write().map_err(|_| PolicyError::LockError)?;
        let position = rules
            .iter()
            .position(|compiled| compiled.rule.rule_id == *rule_id)
            .ok_or_else(|| PolicyError::NotFound(rule_id.0.clone()))?;
        Ok(rules.remove(position).rule)
    }

    pub fn list_rules(&self) -> Result<Vec<Rule>, PolicyError> {
        let rules = self.rules.read().map_err(|_| PolicyError::LockError)?;
        Ok(rules.iter().map(|compiled| compiled.rule.clone()).collect())
    }

    /// Snapshot of the compiled rules at this instant. Evaluation over the
    /// snapshot holds no lock.
    pub fn snapshot(&self) -> Result<Vec<CompiledRule>, PolicyError> {
        let rules = self.rules.read().map_err(|_| PolicyError::LockError)?;
        Ok(rules.clone())
    }

    /// Classify a command: first matching rule wins, no match falls to the
    /// store's default action. Matching is deterministic and total.
    pub fn evaluate(&self, command: &str) -> Result<Verdict, PolicyError> {
        let snapshot = self.snapshot()?;
        for compiled in &snapshot {
            if compiled.matches(command) {
                return Ok(Verdict {
                    action: compiled.rule.action,
                    matched: Some(compiled.rule.clone()),
                });
            }
        }
        Ok(Verdict {
            action: self.default_action,
            matched: None,
        })
    }
}

/// Result of adding a rule: the stored rule plus any overlapping rules that
/// carry a different action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleCreated {
    pub rule: Rule,
    pub overlaps: Vec<Rule>,
}

/// Outcome of classifying one command.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Verdict {
    pub action: RuleAction,
    /// The rule that matched; `None` means the default action applied.
    pub matched: Option<Rule>,
}

/// Policy-related errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("rule not found: {0}")]
    NotFound(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("identical rule already exists: {rule_id}")]
    DuplicateRule { rule_id: String },

    #[error("pattern already mapped to {action:?} by rule {rule_id}")]
    ConflictingRule { rule_id: String, action: RuleAction },

    #[error("lock error")]
    LockError,
}
