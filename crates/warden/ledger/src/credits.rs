//! Per-user credit accounts.

use crate::LedgerError;
use std::collections::HashMap;
use std::sync::RwLock;
use warden_types::UserId;

/// Credit ledger. Balances are only ever mutated through `debit` and
/// `adjust`; both run the check and the write inside one critical section, so
/// concurrent callers on the same account serialize instead of racing a stale
/// read.
pub struct CreditLedger {
    accounts: RwLock<HashMap<UserId, i64>>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Open an account with its starting balance. Re-opening is a no-op that
    /// keeps the existing balance.
    pub fn open_account(&self, user_id: &UserId, initial: i64) -> Result<i64, LedgerError> {
        let mut accounts = self.accounts.write().map_err(lock_poisoned)?;
        Ok(*accounts.entry(user_id.clone()).or_insert(initial))
    }

    pub fn close_account(&self, user_id: &UserId) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write().map_err(lock_poisoned)?;
        accounts
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::AccountNotFound(user_id.0.clone()))
    }

    pub fn balance(&self, user_id: &UserId) -> Result<i64, LedgerError> {
        let accounts = self.accounts.read().map_err(lock_poisoned)?;
        accounts
            .get(user_id)
            .copied()
            .ok_or_else(|| LedgerError::AccountNotFound(user_id.0.clone()))
    }

    /// Debit an account. Fails with `InsufficientCredit` instead of driving
    /// the balance negative. Returns the new balance.
    pub fn debit(&self, user_id: &UserId, amount: i64) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "debit amount must be positive, got {}",
                amount
            )));
        }
        let mut accounts = self.accounts.write().map_err(lock_poisoned)?;
        let balance = accounts
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::AccountNotFound(user_id.0.clone()))?;
        if *balance < amount {
            return Err(LedgerError::InsufficientCredit {
                balance: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        tracing::debug!(user_id = %user_id, amount, balance = *balance, "debited credits");
        Ok(*balance)
    }

    /// Administrative correction. Any sign, no floor: overriding the
    /// non-negative invariant is an explicit admin capability.
    pub fn adjust(&self, user_id: &UserId, delta: i64) -> Result<i64, LedgerError> {
        let mut accounts = self.accounts.write().map_err(lock_poisoned)?;
        let balance = accounts
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::AccountNotFound(user_id.0.clone()))?;
        *balance += delta;
        tracing::info!(user_id = %user_id, delta, balance = *balance, "adjusted credits");
        Ok(*balance)
    }
}

impl Default for CreditLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::StorageUnavailable("credit ledger lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn debit_and_balance() {
        let ledger = CreditLedger::new();
        let user = UserId::new("u1");
        ledger.open_account(&user, 20).unwrap();

        assert_eq!(ledger.debit(&user, 5).unwrap(), 15);
        assert_eq!(ledger.balance(&user).unwrap(), 15);
    }

    #[test]
    fn debit_never_goes_negative() {
        let ledger = CreditLedger::new();
        let user = UserId::new("u1");
        ledger.open_account(&user, 3).unwrap();

        let err = ledger.debit(&user, 5).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientCredit {
                balance: 3,
                required: 5
            }
        ));
        assert_eq!(ledger.balance(&user).unwrap(), 3);
    }

    #[test]
    fn concurrent_debits_allow_exactly_one_winner() {
        let ledger = Arc::new(CreditLedger::new());
        let user = UserId::new("u1");
        ledger.open_account(&user, 5).unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let user = user.clone();
                std::thread::spawn(move || ledger.debit(&user, 3))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results.iter().any(|result| matches!(
            result,
            Err(LedgerError::InsufficientCredit { .. })
        )));
        assert_eq!(ledger.balance(&user).unwrap(), 2);
    }

    #[test]
    fn adjust_is_unconstrained() {
        let ledger = CreditLedger::new();
        let user = UserId::new("u1");
        ledger.open_account(&user, 2).unwrap();

        assert_eq!(ledger.adjust(&user, -10).unwrap(), -8);
        assert_eq!(ledger.adjust(&user, 100).unwrap(), 92);
    }

    #[test]
    fn operations_on_missing_account_fail() {
        let ledger = CreditLedger::new();
        let user = UserId::new("ghost");
        assert!(matches!(
            ledger.debit(&user, 1),
            Err(LedgerError::AccountNotFound(_))
        ));
        assert!(matches!(
            ledger.adjust(&user, 1),
            Err(LedgerError::AccountNotFound(_))
        ));
        assert!(matches!(
            ledger.balance(&user),
            Err(LedgerError::AccountNotFound(_))
        ));
    }

    #[test]
    fn reopening_keeps_existing_balance() {
        let ledger = CreditLedger::new();
        let user = UserId::new("u1");
        ledger.open_account(&user, 50).unwrap();
        ledger.debit(&user, 10).unwrap();
        assert_eq!(ledger.open_account(&user, 50).unwrap(), 40);
    }

    #[test]
    fn zero_or_negative_debit_is_invalid() {
        let ledger = CreditLedger::new();
        let user = UserId::new("u1");
        ledger.open_account(&user, 10).unwrap();
        assert!(matches!(
            ledger.debit(&user, 0),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.debit(&user, -4),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// No sequence of debits ever drives a balance below zero; every
            /// accepted debit is reflected exactly once.
            #[test]
            fn property_debits_never_go_negative(
                initial in 0i64..1_000,
                amounts in proptest::collection::vec(1i64..200, 0..32),
            ) {
                let ledger = CreditLedger::new();
                let user = UserId::new("prop");
                ledger.open_account(&user, initial).unwrap();

                let mut expected = initial;
                for amount in amounts {
                    match ledger.debit(&user, amount) {
                        Ok(balance) => {
                            expected -= amount;
                            prop_assert_eq!(balance, expected);
                        }
                        Err(LedgerError::InsufficientCredit { balance, required }) => {
                            prop_assert_eq!(balance, expected);
                            prop_assert_eq!(required, amount);
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {}", other),
                    }
                    prop_assert!(ledger.balance(&user).unwrap() >= 0);
                }
            }
        }
    }
}
