//! Solve driver: validate, build the output grid, integrate once across it.

use pd_core::ensure_finite;
use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::integrator::{DormandPrince5, DormandPrince853, Integrator, Rk4};
use crate::model::OdeModel;
use crate::options::{Method, SolveOptions};
use crate::radau::Radau5;
use crate::solution::{Solution, SolveStats};

/// Relative slack when checking that `duration` is a whole multiple of `step`.
const GRID_SLACK: f64 = 1e-9;

/// Upper bound on output samples (safety limit).
const MAX_SAMPLES: usize = 10_000_000;

/// Uniform output grid `0, step, 2*step, .., duration`.
///
/// `duration` must be a whole multiple of `step` up to a relative slack of
/// `1e-9`; anything else is rejected rather than silently truncated.
pub fn time_grid(duration: f64, step: f64) -> SimResult<Vec<f64>> {
    if ensure_finite(step, "step")? <= 0.0 {
        return Err(SimError::InvalidArg {
            what: "step must be positive",
        });
    }
    if ensure_finite(duration, "duration")? <= 0.0 {
        return Err(SimError::InvalidArg {
            what: "duration must be positive",
        });
    }
    if step > duration {
        return Err(SimError::InvalidArg {
            what: "step must not exceed duration",
        });
    }

    let ratio = duration / step;
    let intervals = ratio.round();
    if intervals >= MAX_SAMPLES as f64 {
        return Err(SimError::InvalidArg {
            what: "too many output samples for duration / step",
        });
    }
    if (ratio - intervals).abs() > GRID_SLACK * ratio {
        return Err(SimError::InvalidArg {
            what: "duration must be a whole multiple of step",
        });
    }
    let intervals = intervals as usize;

    Ok((0..=intervals).map(|i| i as f64 * step).collect())
}

/// Solve `model` from `u0` over `[0, duration]`, reporting states every `step`.
///
/// Fails with `InvalidInitialCondition` before any integration work when
/// `u0` does not have `model.num_states()` entries.
pub fn solve<M: OdeModel + ?Sized>(
    model: &M,
    u0: &[f64],
    duration: f64,
    step: f64,
    options: &SolveOptions,
) -> SimResult<Solution> {
    let expected = model.num_states();
    if u0.len() != expected {
        return Err(SimError::InvalidInitialCondition {
            expected,
            actual: u0.len(),
        });
    }
    for &v in u0 {
        ensure_finite(v, "initial state")?;
    }
    options.validate()?;
    let time = time_grid(duration, step)?;

    debug!(
        method = %options.method,
        states = expected,
        samples = time.len(),
        duration,
        step,
        "solve start"
    );

    let mut stats = SolveStats::new(options.method);
    let states = match options.method {
        Method::Dopri5 => {
            let integrator = DormandPrince5 {
                rtol: options.rtol,
                atol: options.atol,
            };
            integrate_grid(&integrator, model, &time, u0, &mut stats)?
        }
        Method::Dop853 => {
            let integrator = DormandPrince853 {
                rtol: options.rtol,
                atol: options.atol,
            };
            integrate_grid(&integrator, model, &time, u0, &mut stats)?
        }
        Method::Radau => {
            let integrator = Radau5 {
                rtol: options.rtol,
                atol: options.atol,
            };
            integrate_grid(&integrator, model, &time, u0, &mut stats)?
        }
        Method::Rk4 => integrate_grid(&Rk4, model, &time, u0, &mut stats)?,
    };

    debug!(
        evaluations = stats.evaluations,
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        "solve done"
    );

    Ok(Solution::new(time, states, stats))
}

/// Run the integrator over the whole grid, collecting one row per state component.
fn integrate_grid<I: Integrator, M: OdeModel + ?Sized>(
    integrator: &I,
    model: &M,
    time: &[f64],
    u0: &[f64],
    stats: &mut SolveStats,
) -> SimResult<Vec<Vec<f64>>> {
    let samples = integrator.integrate(model, time, u0, stats)?;

    let mut rows: Vec<Vec<f64>> = vec![Vec::with_capacity(time.len()); u0.len()];
    for (t, y) in time.iter().zip(&samples) {
        trace!(t, "sample");
        if y.iter().any(|v| !v.is_finite()) {
            return Err(SimError::Integration {
                message: format!("non-finite state at t = {t}"),
            });
        }
        for (row, &v) in rows.iter_mut().zip(y) {
            row.push(v);
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::{Tolerances, nearly_equal};

    /// Panics if ever evaluated.
    struct NeverEvaluated;

    impl OdeModel for NeverEvaluated {
        fn num_states(&self) -> usize {
            2
        }

        fn rhs(&self, _t: f64, _u: &[f64], _du: &mut [f64]) {
            panic!("rhs must not be called");
        }
    }

    #[test]
    fn grid_includes_whole_multiple_endpoint() {
        let grid = time_grid(10.0, 0.01).unwrap();
        assert_eq!(grid.len(), 1001);
        assert_eq!(grid[0], 0.0);

        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-12,
        };
        assert!(nearly_equal(*grid.last().unwrap(), 10.0, tol));
        for w in grid.windows(2) {
            assert!(nearly_equal(w[1] - w[0], 0.01, Tolerances { abs: 1e-12, rel: 1e-9 }));
        }
    }

    #[test]
    fn grid_rejects_partial_last_interval() {
        assert!(matches!(
            time_grid(1.0, 0.3),
            Err(SimError::InvalidArg { .. })
        ));
        assert!(matches!(
            time_grid(2.05, 0.1),
            Err(SimError::InvalidArg { .. })
        ));
        // Rounding noise in a whole multiple is tolerated
        assert_eq!(time_grid(0.3, 0.1).unwrap().len(), 4);
    }

    #[test]
    fn partial_last_interval_fails_before_integration() {
        let err = solve(
            &NeverEvaluated,
            &[1.0, 2.0],
            1.0,
            0.3,
            &SolveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidArg { .. }));
    }

    #[test]
    fn grid_rejects_bad_arguments() {
        assert!(matches!(
            time_grid(1.0, 0.0),
            Err(SimError::InvalidArg { .. })
        ));
        assert!(matches!(
            time_grid(0.0, 0.1),
            Err(SimError::InvalidArg { .. })
        ));
        assert!(matches!(
            time_grid(0.1, 1.0),
            Err(SimError::InvalidArg { .. })
        ));
        assert!(matches!(time_grid(f64::INFINITY, 0.1), Err(SimError::Core(_))));
        assert!(matches!(
            time_grid(1e9, 1e-9),
            Err(SimError::InvalidArg { .. })
        ));
    }

    #[test]
    fn wrong_initial_length_fails_before_integration() {
        let err = solve(&NeverEvaluated, &[1.0], 1.0, 0.1, &SolveOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidInitialCondition {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn invalid_options_fail_before_integration() {
        let opts = SolveOptions {
            rtol: 0.0,
            ..SolveOptions::default()
        };
        let err = solve(&NeverEvaluated, &[1.0, 2.0], 1.0, 0.1, &opts).unwrap_err();
        assert!(matches!(err, SimError::InvalidArg { .. }));

        let err = solve(
            &NeverEvaluated,
            &[f64::NAN, 2.0],
            1.0,
            0.1,
            &SolveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::Core(_)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn whole_multiples_give_uniform_grids(intervals in 1usize..5_000, step in 1e-3_f64..10.0) {
            let duration = intervals as f64 * step;
            let grid = time_grid(duration, step).unwrap();

            prop_assert_eq!(grid.len(), intervals + 1);
            prop_assert_eq!(grid[0], 0.0);
            let last = grid[intervals];
            prop_assert!((last - duration).abs() <= 1e-9 * duration);
            for w in grid.windows(2) {
                prop_assert!(((w[1] - w[0]) - step).abs() <= 1e-9 * step);
            }
        }

        #[test]
        fn fractional_multiples_are_rejected(
            intervals in 1usize..5_000,
            fraction in 0.01_f64..0.99,
            step in 1e-3_f64..10.0,
        ) {
            let duration = (intervals as f64 + fraction) * step;
            prop_assert!(
                matches!(time_grid(duration, step), Err(SimError::InvalidArg { .. })),
                "duration {} step {} accepted",
                duration,
                step
            );
        }
    }
}
