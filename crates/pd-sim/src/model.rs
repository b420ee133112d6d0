//! Model traits for pluggable ODE systems.

use crate::error::SimResult;
use crate::options::SolveOptions;
use crate::solution::Solution;

/// An ODE system `du/dt = f(t, u)` with a fixed state dimension.
///
/// `rhs` must be a pure function of its inputs: the adaptive integrators
/// evaluate it at trial points they later discard.
pub trait OdeModel {
    /// Length of the state vector.
    fn num_states(&self) -> usize;

    /// Write the time derivative of `u` at time `t` into `du`.
    ///
    /// Both slices have length `num_states()`; implementations may panic otherwise.
    fn rhs(&self, t: f64, u: &[f64], du: &mut [f64]);

    /// Allocate and return the time derivative of `u` at time `t`.
    fn evaluate(&self, t: f64, u: &[f64]) -> Vec<f64> {
        let mut du = vec![0.0; u.len()];
        self.rhs(t, u, &mut du);
        du
    }
}

/// Models that wrap their solved trajectory in a model-specific result type.
pub trait Solvable: OdeModel {
    /// Result type exposing derived quantities.
    type Output;

    /// Wrap a raw trajectory produced by `solve`.
    fn create_result(&self, solution: Solution) -> Self::Output;

    /// Solve from `u0` over `[0, duration]`, sampled every `step`, with default options.
    fn solve(&self, u0: &[f64], duration: f64, step: f64) -> SimResult<Self::Output> {
        self.solve_with(u0, duration, step, &SolveOptions::default())
    }

    /// Solve with explicit integrator options.
    fn solve_with(
        &self,
        u0: &[f64],
        duration: f64,
        step: f64,
        options: &SolveOptions,
    ) -> SimResult<Self::Output> {
        let solution = crate::solve::solve(self, u0, duration, step, options)?;
        Ok(self.create_result(solution))
    }
}
