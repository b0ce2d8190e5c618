//! Per-unit lifecycle tracking during a run.
//!
//! The tracker enforces the unit state machine and writes every terminal
//! outcome to the shared ledger before the call returns, so a unit's result
//! is visible to later skip decisions before the host reports it complete.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::error::OrderError;
use crate::ledger::ResultLedger;
use crate::model::{Group, Outcome, Unit, UnitId, UnitState};
use crate::skip::{SkipEvaluator, SkipReason, SkipVerdict};

#[derive(Debug, Default)]
pub struct RunTracker {
    ledger: ResultLedger,
    evaluator: SkipEvaluator,
    states: Mutex<HashMap<UnitId, UnitState>>,
}

impl RunTracker {
    /// Track a run whose outcomes go to `ledger`.
    #[must_use]
    pub fn new(ledger: ResultLedger) -> Self {
        Self {
            ledger,
            evaluator: SkipEvaluator::default(),
            states: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_evaluator(mut self, evaluator: SkipEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub const fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    /// Current state of `unit`; units never seen are `NotRun`.
    pub fn state(&self, unit: &UnitId) -> UnitState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(unit)
            .copied()
            .unwrap_or(UnitState::NotRun)
    }

    /// Run the skip decision for `unit` and act on it: either mark it
    /// skipped (recording the outcome) or mark it running.
    ///
    /// # Errors
    ///
    /// Fails if `unit` already left `NotRun`, or its outcome was already
    /// recorded by someone else.
    pub fn begin(&self, unit: &Unit, group: Option<&Group>) -> Result<SkipVerdict, OrderError> {
        let verdict = self.evaluator.evaluate(unit, group, &self.ledger);
        match &verdict {
            SkipVerdict::Run => self.start(unit)?,
            SkipVerdict::Skip(reason) => self.skip(unit, reason)?,
        }
        Ok(verdict)
    }

    /// `NotRun → Running`.
    ///
    /// # Errors
    ///
    /// [`OrderError::InvalidTransition`] from any other state.
    pub fn start(&self, unit: &Unit) -> Result<(), OrderError> {
        self.transition(unit, UnitState::Running)?;
        debug!(unit = %unit.id, "unit started");
        Ok(())
    }

    /// `Running → Passed | Failed`, recording the outcome.
    ///
    /// # Errors
    ///
    /// [`OrderError::InvalidTransition`] if the unit is not running or
    /// `outcome` is `Skipped`; [`OrderError::LedgerConflict`] if the key was
    /// already recorded.
    pub fn finish(&self, unit: &Unit, outcome: Outcome) -> Result<(), OrderError> {
        self.transition(unit, UnitState::from(outcome))?;
        debug!(unit = %unit.id, %outcome, "unit finished");
        Ok(())
    }

    /// `NotRun → Skipped`, recording the outcome.
    ///
    /// # Errors
    ///
    /// Same as [`RunTracker::finish`].
    pub fn skip(&self, unit: &Unit, reason: &SkipReason) -> Result<(), OrderError> {
        self.transition(unit, UnitState::Skipped)?;
        info!(unit = %unit.id, %reason, "unit skipped");
        Ok(())
    }

    fn transition(&self, unit: &Unit, to: UnitState) -> Result<(), OrderError> {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let from = states.get(&unit.id).copied().unwrap_or(UnitState::NotRun);
        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                unit: unit.id.to_string(),
                from,
                to,
            });
        }
        if let Some(outcome) = to.outcome() {
            self.ledger.record(unit.id.ledger_key(), outcome)?;
        }
        states.insert(unit.id.clone(), to);
        Ok(())
    }
}
