//! Exponential decay `du/dt = -k u`.

use pd_sim::{OdeModel, SimResult, Solution, Solvable};

use crate::params::non_negative;

/// Exponential decay with a non-negative decay constant.
#[derive(Clone, Debug, PartialEq)]
pub struct ExponentialDecay {
    decay_constant: f64,
}

impl ExponentialDecay {
    /// Create a decay model; fails with `InvalidParameter` if `decay_constant` is negative.
    pub fn new(decay_constant: f64) -> SimResult<Self> {
        Ok(Self {
            decay_constant: non_negative(decay_constant, "decay constant")?,
        })
    }

    pub fn decay_constant(&self) -> f64 {
        self.decay_constant
    }

    /// Replace the decay constant. On error the previous value is kept.
    pub fn set_decay_constant(&mut self, decay_constant: f64) -> SimResult<()> {
        self.decay_constant = non_negative(decay_constant, "decay constant")?;
        Ok(())
    }

    /// Closed-form solution `u0 * exp(-k t)`.
    pub fn exact(&self, u0: f64, t: f64) -> f64 {
        u0 * (-self.decay_constant * t).exp()
    }
}

impl OdeModel for ExponentialDecay {
    fn num_states(&self) -> usize {
        1
    }

    fn rhs(&self, _t: f64, u: &[f64], du: &mut [f64]) {
        du[0] = -self.decay_constant * u[0];
    }
}

impl Solvable for ExponentialDecay {
    type Output = Solution;

    fn create_result(&self, solution: Solution) -> Solution {
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_sim::SimError;

    #[test]
    fn rhs_value() {
        let model = ExponentialDecay::new(0.4).unwrap();
        let du = model.evaluate(0.0, &[3.2]);
        assert!((du[0] - (-1.28)).abs() < 1e-6);
    }

    #[test]
    fn negative_decay_rejected_by_constructor() {
        let err = ExponentialDecay::new(-1.0).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { value, .. } if value == -1.0));
        assert!(ExponentialDecay::new(f64::NAN).is_err());
    }

    #[test]
    fn negative_decay_rejected_by_setter() {
        let mut model = ExponentialDecay::new(0.4).unwrap();
        assert!(model.set_decay_constant(-1.0).is_err());
        assert_eq!(model.decay_constant(), 0.4);

        model.set_decay_constant(0.0).unwrap();
        assert_eq!(model.decay_constant(), 0.0);
    }

    #[test]
    fn num_states_is_one() {
        assert_eq!(ExponentialDecay::new(0.4).unwrap().num_states(), 1);
    }

    #[test]
    fn solve_with_wrong_number_of_initial_states() {
        let model = ExponentialDecay::new(0.4).unwrap();
        let err = model.solve(&[1.0, 1.0], 10.0, 0.01).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidInitialCondition {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn zero_decay_is_constant() {
        let model = ExponentialDecay::new(0.0).unwrap();
        let sol = model.solve(&[2.5], 1.0, 0.1).unwrap();
        assert!(sol.component(0).unwrap().iter().all(|&u| u == 2.5));
    }
}
