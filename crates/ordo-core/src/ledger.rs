//! Shared record of unit outcomes for the current run.
//!
//! Keys are `"<group>.<unit>"`. The ledger grows monotonically: each key is
//! written at most once, and entries are never removed while the run lasts.
//! A [`BTreeMap`] keeps keys sorted so "every unit of group G" is a range
//! scan over the `"G."` prefix.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::OrderError;
use crate::model::Outcome;

/// Read access the skip decision needs.
pub trait Ledger {
    /// Outcome recorded under `key`, if any.
    fn outcome(&self, key: &str) -> Option<Outcome>;

    /// Every `(key, outcome)` whose key starts with `prefix`, sorted by key.
    fn outcomes_with_prefix(&self, prefix: &str) -> Vec<(String, Outcome)>;
}

/// Thread-safe, write-once outcome store.
///
/// Cloning is cheap and shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct ResultLedger {
    inner: Arc<RwLock<BTreeMap<String, Outcome>>>,
}

impl ResultLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `outcome` for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::LedgerConflict`] if `key` already has an outcome.
    /// The existing entry is left untouched.
    pub fn record(&self, key: impl Into<String>, outcome: Outcome) -> Result<(), OrderError> {
        let key = key.into();
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(&key) {
            return Err(OrderError::LedgerConflict { key });
        }
        debug!(%key, %outcome, "outcome recorded");
        map.insert(key, outcome);
        Ok(())
    }

    /// Sorted copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Outcome> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Ledger for ResultLedger {
    fn outcome(&self, key: &str) -> Option<Outcome> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    fn outcomes_with_prefix(&self, prefix: &str) -> Vec<(String, Outcome)> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, outcome)| (key.clone(), *outcome))
            .collect()
    }
}

impl FromIterator<(String, Outcome)> for ResultLedger {
    /// Later duplicates of a key are ignored; the first outcome wins.
    fn from_iter<I: IntoIterator<Item = (String, Outcome)>>(iter: I) -> Self {
        let mut map = BTreeMap::new();
        for (key, outcome) in iter {
            map.entry(key).or_insert(outcome);
        }
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }
}

/// Plain maps work as read-only ledgers, e.g. a snapshot loaded from disk.
impl Ledger for BTreeMap<String, Outcome> {
    fn outcome(&self, key: &str) -> Option<Outcome> {
        self.get(key).copied()
    }

    fn outcomes_with_prefix(&self, prefix: &str) -> Vec<(String, Outcome)> {
        self.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, outcome)| (key.clone(), *outcome))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn second_write_for_same_key_conflicts() {
        let ledger = ResultLedger::new();
        ledger.record("Suite.a", Outcome::Passed).expect("first write");

        let err = ledger
            .record("Suite.a", Outcome::Failed)
            .expect_err("second write");
        assert_eq!(
            err,
            OrderError::LedgerConflict {
                key: "Suite.a".into()
            }
        );
        assert_eq!(ledger.outcome("Suite.a"), Some(Outcome::Passed));
    }

    #[test]
    fn prefix_scan_stays_inside_group() {
        let ledger: ResultLedger = [
            ("Api.login".to_string(), Outcome::Passed),
            ("Api.logout".to_string(), Outcome::Failed),
            ("ApiV2.login".to_string(), Outcome::Passed),
            ("Ab.x".to_string(), Outcome::Passed),
            ("Db.seed".to_string(), Outcome::Passed),
        ]
        .into_iter()
        .collect();

        let api = ledger.outcomes_with_prefix("Api.");
        assert_eq!(
            api,
            vec![
                ("Api.login".to_string(), Outcome::Passed),
                ("Api.logout".to_string(), Outcome::Failed),
            ]
        );
        assert!(ledger.outcomes_with_prefix("Missing.").is_empty());
    }

    #[test]
    fn plain_map_behaves_like_ledger() {
        let mut map = BTreeMap::new();
        map.insert("G.a".to_string(), Outcome::Skipped);
        assert_eq!(map.outcome("G.a"), Some(Outcome::Skipped));
        assert_eq!(map.outcomes_with_prefix("G.").len(), 1);
    }

    #[test]
    fn clones_share_entries_across_threads() {
        let ledger = ResultLedger::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                thread::spawn(move || ledger.record(format!("G.u{i}"), Outcome::Passed))
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread").expect("record");
        }

        assert_eq!(ledger.len(), 8);
        assert_eq!(ledger.snapshot().len(), 8);
    }

    #[test]
    fn concurrent_writers_to_one_key_yield_single_winner() {
        let ledger = ResultLedger::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || ledger.record("G.shared", Outcome::Passed))
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(ledger.len(), 1);
    }
}
