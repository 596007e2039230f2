//! Append-only audit log.

use crate::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use warden_types::{CommandLogEntry, LogAction, LogEntryId, UserId};

/// Audit log of every submitted command. Entries are append-only; nothing in
/// the public API mutates or removes them.
pub struct AuditLog {
    entries: RwLock<Vec<CommandLogEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append one entry. A failure here must fail the operation that needed
    /// the entry: the system never accepts an unaudited action.
    pub fn append(
        &self,
        user_id: UserId,
        action: LogAction,
        command: impl Into<String>,
        reason: Option<String>,
    ) -> Result<CommandLogEntry, LedgerError> {
        let entry = CommandLogEntry {
            entry_id: LogEntryId::generate(),
            user_id,
            action,
            command: command.into(),
            reason,
            timestamp: chrono::Utc::now(),
        };
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LedgerError::StorageUnavailable("audit log lock poisoned".to_string()))?;
        entries.push(entry.clone());
        Ok(entry)
    }

    /// All entries for one user, newest first.
    pub fn for_user(&self, user_id: &UserId) -> Result<Vec<CommandLogEntry>, LedgerError> {
        self.query(LogQuery {
            user_id: Some(user_id.clone()),
            ..Default::default()
        })
    }

    /// Filtered view, newest first.
    pub fn query(&self, query: LogQuery) -> Result<Vec<CommandLogEntry>, LedgerError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LedgerError::StorageUnavailable("audit log lock poisoned".to_string()))?;
        let mut results: Vec<_> = entries
            .iter()
            .rev()
            .filter(|entry| {
                query
                    .user_id
                    .as_ref()
                    .map_or(true, |user| entry.user_id == *user)
            })
            .filter(|entry| query.action.map_or(true, |action| entry.action == action))
            .cloned()
            .collect();
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LedgerError::StorageUnavailable("audit log lock poisoned".to_string()))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Aggregate view used by the dashboard.
    pub fn statistics(&self) -> Result<AuditStatistics, LedgerError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LedgerError::StorageUnavailable("audit log lock poisoned".to_string()))?;
        let mut by_action: HashMap<String, usize> = HashMap::new();
        for entry in entries.iter() {
            *by_action.entry(entry.action.to_string()).or_insert(0) += 1;
        }
        Ok(AuditStatistics {
            total_entries: entries.len(),
            by_action,
        })
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters for audit search.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LogQuery {
    pub user_id: Option<UserId>,
    pub action: Option<LogAction>,
    pub limit: Option<usize>,
}

/// Aggregate counts over the audit log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_entries: usize,
    pub by_action: HashMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_come_back_newest_first() {
        let log = AuditLog::new();
        let user = UserId::new("u1");
        log.append(user.clone(), LogAction::Executed, "first", None)
            .unwrap();
        log.append(user.clone(), LogAction::Rejected, "second", None)
            .unwrap();
        log.append(user.clone(), LogAction::Queued, "third", None)
            .unwrap();

        let entries = log.for_user(&user).unwrap();
        let commands: Vec<_> = entries.iter().map(|entry| entry.command.as_str()).collect();
        assert_eq!(commands, vec!["third", "second", "first"]);
    }

    #[test]
    fn query_filters_by_user_and_action() {
        let log = AuditLog::new();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        log.append(alice.clone(), LogAction::Executed, "ls", None)
            .unwrap();
        log.append(bob.clone(), LogAction::Rejected, "rm", None)
            .unwrap();
        log.append(alice.clone(), LogAction::Rejected, "dd", None)
            .unwrap();

        let rejected = log
            .query(LogQuery {
                action: Some(LogAction::Rejected),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rejected.len(), 2);

        let alice_rejected = log
            .query(LogQuery {
                user_id: Some(alice),
                action: Some(LogAction::Rejected),
                limit: None,
            })
            .unwrap();
        assert_eq!(alice_rejected.len(), 1);
        assert_eq!(alice_rejected[0].command, "dd");
    }

    #[test]
    fn limit_truncates_after_ordering() {
        let log = AuditLog::new();
        let user = UserId::new("u1");
        for i in 0..5 {
            log.append(user.clone(), LogAction::Executed, format!("cmd{}", i), None)
                .unwrap();
        }
        let latest = log
            .query(LogQuery {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].command, "cmd4");
    }

    #[test]
    fn statistics_count_by_action() {
        let log = AuditLog::new();
        let user = UserId::new("u1");
        log.append(user.clone(), LogAction::Executed, "a", None)
            .unwrap();
        log.append(user.clone(), LogAction::Executed, "b", None)
            .unwrap();
        log.append(user.clone(), LogAction::Queued, "c", None)
            .unwrap();

        let stats = log.statistics().unwrap();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.by_action.get("EXECUTED"), Some(&2));
        assert_eq!(stats.by_action.get("QUEUED"), Some(&1));
        assert_eq!(stats.by_action.get("REJECTED"), None);
    }
}
