//! Solved trajectories.

use serde::Serialize;

use crate::error::{SimError, SimResult};
use crate::options::Method;

/// Work counters accumulated over a solve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolveStats {
    /// Method used
    pub method: Method,
    /// Right-hand side evaluations
    pub evaluations: usize,
    /// Accepted integrator steps
    pub accepted_steps: usize,
    /// Rejected integrator steps
    pub rejected_steps: usize,
}

impl SolveStats {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            evaluations: 0,
            accepted_steps: 0,
            rejected_steps: 0,
        }
    }

    pub(crate) fn record(&mut self, evaluations: usize, accepted: usize, rejected: usize) {
        self.evaluations += evaluations;
        self.accepted_steps += accepted;
        self.rejected_steps += rejected;
    }
}

/// Time grid and solved states.
///
/// `states[i][k]` is state component `i` at `time[k]`: one row per state
/// component, one column per time point.
#[derive(Clone, Debug, Serialize)]
pub struct Solution {
    time: Vec<f64>,
    states: Vec<Vec<f64>>,
    stats: SolveStats,
}

impl Solution {
    pub(crate) fn new(time: Vec<f64>, states: Vec<Vec<f64>>, stats: SolveStats) -> Self {
        Self {
            time,
            states,
            stats,
        }
    }

    /// Build a solution from existing arrays.
    ///
    /// Intended for reference trajectories and test fixtures; solvers build
    /// results through `solve`, which also fills in the work counters. A
    /// solution built here reports the default method with zero counters.
    ///
    /// Every row of `states` must have one entry per time point, and the time
    /// points must be strictly increasing.
    pub fn from_parts(time: Vec<f64>, states: Vec<Vec<f64>>) -> SimResult<Self> {
        if time.is_empty() {
            return Err(SimError::InvalidArg {
                what: "solution needs at least one time point",
            });
        }
        if time.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SimError::InvalidArg {
                what: "solution time points must be strictly increasing",
            });
        }
        if let Some(row) = states.iter().find(|row| row.len() != time.len()) {
            return Err(pd_core::CoreError::LengthMismatch {
                what: "solution state row",
                expected: time.len(),
                actual: row.len(),
            }
            .into());
        }
        Ok(Self::new(time, states, SolveStats::new(Method::default())))
    }

    /// Time points.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// All state rows.
    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    /// Trajectory of state component `index`, if it exists.
    pub fn component(&self, index: usize) -> Option<&[f64]> {
        self.states.get(index).map(Vec::as_slice)
    }

    /// Full state vector at time index `k`, if it exists.
    pub fn state_at(&self, k: usize) -> Option<Vec<f64>> {
        if k >= self.time.len() {
            return None;
        }
        Some(self.states.iter().map(|row| row[k]).collect())
    }

    /// Number of time points.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }
}
