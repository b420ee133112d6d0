//! Integrator backends producing the state at every point of an output grid.

use ode_solvers::{DVector, Dop853, Dopri5, System};

use crate::error::{SimError, SimResult};
use crate::model::OdeModel;
use crate::solution::SolveStats;

/// Trait for time integrators.
pub trait Integrator {
    /// Integrate from `u0` at `time[0]` and return the state at every point of `time`.
    ///
    /// `time` is a uniform grid with at least two points.
    fn integrate<M: OdeModel + ?Sized>(
        &self,
        model: &M,
        time: &[f64],
        u0: &[f64],
        stats: &mut SolveStats,
    ) -> SimResult<Vec<Vec<f64>>>;
}

/// Adapter exposing an `OdeModel` to `ode_solvers`.
struct ModelSystem<'a, M: ?Sized> {
    model: &'a M,
}

impl<M: OdeModel + ?Sized> System<f64, DVector<f64>> for ModelSystem<'_, M> {
    fn system(&self, t: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        self.model.rhs(t, y.as_slice(), dy.as_mut_slice());
    }
}

/// First point, grid spacing and stepper end time for a dense-output run.
///
/// The stepper accumulates its output clock, so the run ends half a step past
/// the last grid point to be sure that point is emitted.
fn dense_span(time: &[f64]) -> SimResult<(f64, f64, f64)> {
    match (time.first(), time.last()) {
        (Some(&t0), Some(&t1)) if time.len() >= 2 => {
            let step = (t1 - t0) / (time.len() - 1) as f64;
            Ok((t0, step, t1 + 0.5 * step))
        }
        _ => Err(SimError::InvalidArg {
            what: "output grid needs at least two points",
        }),
    }
}

/// Check that the stepper emitted exactly one dense sample per grid point.
fn grid_samples(y_out: &[DVector<f64>], time: &[f64]) -> SimResult<Vec<Vec<f64>>> {
    if y_out.len() != time.len() {
        return Err(SimError::Integration {
            message: format!(
                "stepper emitted {} dense samples for a grid of {} points",
                y_out.len(),
                time.len()
            ),
        });
    }
    Ok(y_out.iter().map(|y| y.as_slice().to_vec()).collect())
}

/// Adaptive Dormand-Prince 5(4) with dense output.
#[derive(Clone, Debug)]
pub struct DormandPrince5 {
    pub rtol: f64,
    pub atol: f64,
}

impl Integrator for DormandPrince5 {
    fn integrate<M: OdeModel + ?Sized>(
        &self,
        model: &M,
        time: &[f64],
        u0: &[f64],
        stats: &mut SolveStats,
    ) -> SimResult<Vec<Vec<f64>>> {
        let (t0, step, t_end) = dense_span(time)?;
        let mut stepper = Dopri5::new(
            ModelSystem { model },
            t0,
            t_end,
            step,
            DVector::from_column_slice(u0),
            self.rtol,
            self.atol,
        );
        let run = stepper.integrate().map_err(|e| SimError::Integration {
            message: e.to_string(),
        })?;
        stats.record(
            run.num_eval as usize,
            run.accepted_steps as usize,
            run.rejected_steps as usize,
        );
        grid_samples(stepper.y_out(), time)
    }
}

/// Adaptive Dormand-Prince 8(5,3) with dense output.
#[derive(Clone, Debug)]
pub struct DormandPrince853 {
    pub rtol: f64,
    pub atol: f64,
}

impl Integrator for DormandPrince853 {
    fn integrate<M: OdeModel + ?Sized>(
        &self,
        model: &M,
        time: &[f64],
        u0: &[f64],
        stats: &mut SolveStats,
    ) -> SimResult<Vec<Vec<f64>>> {
        let (t0, step, t_end) = dense_span(time)?;
        let mut stepper = Dop853::new(
            ModelSystem { model },
            t0,
            t_end,
            step,
            DVector::from_column_slice(u0),
            self.rtol,
            self.atol,
        );
        let run = stepper.integrate().map_err(|e| SimError::Integration {
            message: e.to_string(),
        })?;
        stats.record(
            run.num_eval as usize,
            run.accepted_steps as usize,
            run.rejected_steps as usize,
        );
        grid_samples(stepper.y_out(), time)
    }
}

/// Classical RK4 (Runge-Kutta 4th order) integrator, one step per interval.
#[derive(Clone, Debug)]
pub struct Rk4;

impl Rk4 {
    fn step<M: OdeModel + ?Sized>(model: &M, t0: f64, dt: f64, y: &[f64]) -> Vec<f64> {
        let n = y.len();
        let axpy = |a: &[f64], k: &[f64], s: f64| -> Vec<f64> {
            a.iter().zip(k).map(|(ai, ki)| ai + s * ki).collect()
        };

        let mut k1 = vec![0.0; n];
        model.rhs(t0, y, &mut k1);

        let x2 = axpy(y, &k1, 0.5 * dt);
        let mut k2 = vec![0.0; n];
        model.rhs(t0 + 0.5 * dt, &x2, &mut k2);

        let x3 = axpy(y, &k2, 0.5 * dt);
        let mut k3 = vec![0.0; n];
        model.rhs(t0 + 0.5 * dt, &x3, &mut k3);

        let x4 = axpy(y, &k3, dt);
        let mut k4 = vec![0.0; n];
        model.rhs(t0 + dt, &x4, &mut k4);

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        (0..n)
            .map(|i| y[i] + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
            .collect()
    }
}

impl Integrator for Rk4 {
    fn integrate<M: OdeModel + ?Sized>(
        &self,
        model: &M,
        time: &[f64],
        u0: &[f64],
        stats: &mut SolveStats,
    ) -> SimResult<Vec<Vec<f64>>> {
        let mut samples = Vec::with_capacity(time.len());
        let mut y = u0.to_vec();
        samples.push(y.clone());
        for w in time.windows(2) {
            y = Self::step(model, w[0], w[1] - w[0], &y);
            stats.record(4, 1, 0);
            samples.push(y.clone());
        }
        Ok(samples)
    }
}
