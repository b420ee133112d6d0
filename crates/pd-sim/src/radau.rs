//! Radau IIA order-5 implicit Runge-Kutta integrator for stiff problems.
//!
//! Three-stage collocation with a simplified Newton iteration on the
//! transformed stage system (one real and one complex-pair block, each
//! factored once per step), a finite-difference Jacobian, embedded error
//! estimate and cubic dense output used to sample the output grid.
//! Reference: Hairer & Wanner, Solving ODEs II, section IV.8.

use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};

use crate::error::{SimError, SimResult};
use crate::integrator::Integrator;
use crate::model::OdeModel;
use crate::solution::SolveStats;

// Collocation nodes
const C1: f64 = 0.155_051_025_721_682_2;
const C2: f64 = 0.644_948_974_278_317_8;
const C1M1: f64 = C1 - 1.0;
const C2M1: f64 = C2 - 1.0;
const C1MC2: f64 = C1 - C2;

// Error estimate weights
const DD1: f64 = -10.048_809_399_827_416;
const DD2: f64 = 1.382_142_733_160_749;
const DD3: f64 = -0.333_333_333_333_333_3;

// Eigenvalues of the inverse collocation matrix: U1 real, ALPH +- i BETA
const U1: f64 = 3.637_834_252_744_496;
const ALPH: f64 = 2.681_082_873_627_752_3;
const BETA: f64 = 3.050_430_199_247_410_5;

// Transformation T (third row is [T20, 1, 0])
const T00: f64 = 9.123_239_487_089_295E-2;
const T01: f64 = -1.412_552_950_209_542E-1;
const T02: f64 = -3.002_919_410_514_742_4E-2;
const T10: f64 = 2.417_179_327_071_07E-1;
const T11: f64 = 2.041_293_522_937_999_4E-1;
const T12: f64 = 3.829_421_127_572_619E-1;
const T20: f64 = 9.660_481_826_150_93E-1;

// Inverse transformation
const TI00: f64 = 4.325_579_890_063_155;
const TI01: f64 = 3.391_992_518_158_098_4E-1;
const TI02: f64 = 5.417_705_399_358_749E-1;
const TI10: f64 = -4.178_718_591_551_905;
const TI11: f64 = -3.276_828_207_610_623_7E-1;
const TI12: f64 = 4.766_235_545_005_504_4E-1;
const TI20: f64 = -5.028_726_349_457_868E-1;
const TI21: f64 = 2.571_926_949_855_605;
const TI22: f64 = -5.960_392_048_282_249E-1;

const MAX_STEPS: usize = 100_000;
const MAX_NEWTON: usize = 7;
const NEWTON_TOL: f64 = 0.003_162_277_660_168_379_4;
const SAFETY: f64 = 0.9;
/// Largest step shrink factor per error test.
const FAC_MIN: f64 = 0.2;
/// Largest step growth factor per error test.
const FAC_MAX: f64 = 8.0;
const INITIAL_STEP: f64 = 1e-6;
const UROUND: f64 = f64::EPSILON;

/// Adaptive Radau IIA(5), L-stable, for stiff systems.
#[derive(Clone, Debug)]
pub struct Radau5 {
    pub rtol: f64,
    pub atol: f64,
}

/// Collocation stage increments of one step.
struct Stages {
    z1: DVector<f64>,
    z2: DVector<f64>,
    z3: DVector<f64>,
}

/// Cubic interpolant over the last accepted step `[x - h, x]`.
struct DenseOutput {
    x: f64,
    h: f64,
    cont: [DVector<f64>; 4],
}

impl DenseOutput {
    fn new(x: f64, h: f64, y: &DVector<f64>, stages: &Stages) -> Self {
        let Stages { z1, z2, z3 } = stages;
        let c1 = (z2 - z3) / C2M1;
        let ak = (z1 - z2) / C1MC2;
        let acont3 = (&ak - z1 / C1) / C2;
        let c2 = (&ak - &c1) / C1M1;
        let c3 = &c2 - acont3;
        Self {
            x,
            h,
            cont: [y.clone(), c1, c2, c3],
        }
    }

    fn eval(&self, t: f64) -> Vec<f64> {
        let s = (t - self.x) / self.h;
        let [c0, c1, c2, c3] = &self.cont;
        let y = c0 + (c1 + (c2 + c3 * (s - C1M1)) * (s - C2M1)) * s;
        y.as_slice().to_vec()
    }
}

impl Radau5 {
    /// Weighted RMS norm with error weights `atol + rtol * max(|a|, |b|)`.
    ///
    /// Non-finite entries give an infinite norm.
    fn norm(&self, v: &DVector<f64>, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        let n = v.len().max(1) as f64;
        let sum: f64 = (0..v.len())
            .map(|i| {
                let sc = self.atol + self.rtol * a[i].abs().max(b[i].abs());
                (v[i] / sc).powi(2)
            })
            .sum();
        if sum.is_finite() {
            (sum / n).sqrt()
        } else {
            f64::INFINITY
        }
    }
}

fn eval_rhs<M: OdeModel + ?Sized>(model: &M, t: f64, y: &DVector<f64>) -> DVector<f64> {
    let mut dy = DVector::zeros(y.len());
    model.rhs(t, y.as_slice(), dy.as_mut_slice());
    dy
}

/// Forward-difference Jacobian of the right-hand side at `(t, y)`.
fn jacobian<M: OdeModel + ?Sized>(
    model: &M,
    t: f64,
    y: &DVector<f64>,
    f0: &DVector<f64>,
) -> DMatrix<f64> {
    let n = y.len();
    let mut jac = DMatrix::zeros(n, n);
    for j in 0..n {
        let delta = (UROUND * y[j].abs().max(1e-5)).sqrt();
        let mut perturbed = y.clone();
        perturbed[j] += delta;
        let df = (eval_rhs(model, t, &perturbed) - f0) / delta;
        jac.set_column(j, &df);
    }
    jac
}

/// Factored Newton matrices for one step size.
///
/// `real` is `(U1 / h) I - J`; `complex` is the real 2n form of
/// `((ALPH + i BETA) / h) I - J`.
struct StepMatrices {
    real: LU<f64, Dyn, Dyn>,
    complex: LU<f64, Dyn, Dyn>,
}

impl StepMatrices {
    fn new(jac: &DMatrix<f64>, h: f64) -> Self {
        let n = jac.nrows();
        let fac1 = U1 / h;
        let alphn = ALPH / h;
        let betan = BETA / h;

        let real = DMatrix::from_fn(n, n, |r, c| {
            let diag = if r == c { fac1 } else { 0.0 };
            diag - jac[(r, c)]
        });
        let complex = DMatrix::from_fn(2 * n, 2 * n, |r, c| {
            let (rb, cb) = (r % n, c % n);
            let id = if rb == cb { 1.0 } else { 0.0 };
            match (r < n, c < n) {
                (true, true) | (false, false) => alphn * id - jac[(rb, cb)],
                (true, false) => -betan * id,
                (false, true) => betan * id,
            }
        });
        Self {
            real: real.lu(),
            complex: complex.lu(),
        }
    }
}

impl Integrator for Radau5 {
    fn integrate<M: OdeModel + ?Sized>(
        &self,
        model: &M,
        time: &[f64],
        u0: &[f64],
        stats: &mut SolveStats,
    ) -> SimResult<Vec<Vec<f64>>> {
        let (mut x, x_end) = match (time.first(), time.last()) {
            (Some(&a), Some(&b)) if time.len() >= 2 => (a, b),
            _ => {
                return Err(SimError::InvalidArg {
                    what: "output grid needs at least two points",
                });
            }
        };
        let n = u0.len();
        let h_max = x_end - x;

        let mut samples = Vec::with_capacity(time.len());
        samples.push(u0.to_vec());
        let mut next_sample = 1;

        let mut y = DVector::from_column_slice(u0);
        let mut f0 = eval_rhs(model, x, &y);
        let mut evaluations = 1;
        let mut accepted = 0;
        let mut rejected = 0;
        let mut retry = false;

        let mut h = INITIAL_STEP.min(h_max);
        let mut steps = 0;

        while next_sample < time.len() {
            if steps >= MAX_STEPS {
                stats.record(evaluations, accepted, rejected);
                return Err(SimError::Integration {
                    message: format!("radau: step limit reached at t = {x}"),
                });
            }
            if 0.1 * h.abs() <= x.abs() * UROUND {
                stats.record(evaluations, accepted, rejected);
                return Err(SimError::Integration {
                    message: format!("radau: step size underflow at t = {x}"),
                });
            }
            let last = x + 1.01 * h >= x_end;
            if last {
                h = x_end - x;
            }
            steps += 1;

            let jac = jacobian(model, x, &y, &f0);
            evaluations += n;
            let matrices = StepMatrices::new(&jac, h);

            let Some(stages) = self.newton(model, x, h, &y, &matrices, &mut evaluations) else {
                rejected += 1;
                retry = true;
                h *= 0.5;
                continue;
            };

            let y_new = &y + &stages.z3;
            let refine = accepted == 0 || retry;
            let err = self.error_estimate(
                model,
                x,
                h,
                &y,
                &y_new,
                &f0,
                &matrices,
                &stages,
                refine,
                &mut evaluations,
            );

            let quot = (err.powf(0.25) / SAFETY).clamp(1.0 / FAC_MAX, 1.0 / FAC_MIN);
            let h_new = (h / quot).min(h_max);

            if err <= 1.0 {
                accepted += 1;
                retry = false;
                let x_new = if last { x_end } else { x + h };
                let dense = DenseOutput::new(x_new, h, &y_new, &stages);
                while next_sample < time.len() && (last || time[next_sample] <= x_new) {
                    samples.push(dense.eval(time[next_sample]));
                    next_sample += 1;
                }
                x = x_new;
                y = y_new;
                f0 = eval_rhs(model, x, &y);
                evaluations += 1;
                h = h_new;
            } else {
                rejected += 1;
                h = if accepted == 0 { 0.1 * h } else { h_new };
                retry = true;
            }
        }

        stats.record(evaluations, accepted, rejected);
        Ok(samples)
    }
}

impl Radau5 {
    /// Simplified Newton iteration for the stage increments.
    ///
    /// Returns `None` when the iteration fails to converge.
    fn newton<M: OdeModel + ?Sized>(
        &self,
        model: &M,
        x: f64,
        h: f64,
        y: &DVector<f64>,
        matrices: &StepMatrices,
        evaluations: &mut usize,
    ) -> Option<Stages> {
        let n = y.len();
        let fac1 = U1 / h;
        let alphn = ALPH / h;
        let betan = BETA / h;

        let mut w1 = DVector::<f64>::zeros(n);
        let mut w2 = DVector::<f64>::zeros(n);
        let mut w3 = DVector::<f64>::zeros(n);
        let mut stages = Stages {
            z1: DVector::zeros(n),
            z2: DVector::zeros(n),
            z3: DVector::zeros(n),
        };

        for _ in 0..MAX_NEWTON {
            let k1 = eval_rhs(model, x + C1 * h, &(y + &stages.z1));
            let k2 = eval_rhs(model, x + C2 * h, &(y + &stages.z2));
            let k3 = eval_rhs(model, x + h, &(y + &stages.z3));
            *evaluations += 3;

            let rhs1 = &k1 * TI00 + &k2 * TI01 + &k3 * TI02 - &w1 * fac1;
            let rhs2 = &k1 * TI10 + &k2 * TI11 + &k3 * TI12 - &w2 * alphn + &w3 * betan;
            let rhs3 = &k1 * TI20 + &k2 * TI21 + &k3 * TI22 - &w3 * alphn - &w2 * betan;

            let dw1 = matrices.real.solve(&rhs1)?;
            let mut rhs23 = DVector::<f64>::zeros(2 * n);
            rhs23.rows_mut(0, n).copy_from(&rhs2);
            rhs23.rows_mut(n, n).copy_from(&rhs3);
            let dw23 = matrices.complex.solve(&rhs23)?;
            let dw2 = dw23.rows(0, n).into_owned();
            let dw3 = dw23.rows(n, n).into_owned();

            w1 += &dw1;
            w2 += &dw2;
            w3 += &dw3;
            stages.z1 = &w1 * T00 + &w2 * T01 + &w3 * T02;
            stages.z2 = &w1 * T10 + &w2 * T11 + &w3 * T12;
            stages.z3 = &w1 * T20 + &w2;

            let correction = ((self.norm(&dw1, y, y).powi(2)
                + self.norm(&dw2, y, y).powi(2)
                + self.norm(&dw3, y, y).powi(2))
                / 3.0)
                .sqrt();
            if !correction.is_finite() {
                return None;
            }
            if correction <= NEWTON_TOL {
                return Some(stages);
            }
        }
        None
    }

    /// Embedded error estimate, refined once on a first or retried step.
    ///
    /// Returns the scaled error, never below `1e-10`.
    #[allow(clippy::too_many_arguments)]
    fn error_estimate<M: OdeModel + ?Sized>(
        &self,
        model: &M,
        x: f64,
        h: f64,
        y: &DVector<f64>,
        y_new: &DVector<f64>,
        f0: &DVector<f64>,
        matrices: &StepMatrices,
        stages: &Stages,
        refine: bool,
        evaluations: &mut usize,
    ) -> f64 {
        let tmp = (&stages.z1 * DD1 + &stages.z2 * DD2 + &stages.z3 * DD3) / h;
        let Some(first) = matrices.real.solve(&(f0 + &tmp)) else {
            return f64::INFINITY;
        };
        let err = self.norm(&first, y, y_new).max(1e-10);
        if err < 1.0 || !refine {
            return err;
        }

        // Fold the first estimate back in to damp stiff components
        let f1 = eval_rhs(model, x, &(y + &first));
        *evaluations += 1;
        match matrices.real.solve(&(f1 + &tmp)) {
            Some(second) => self.norm(&second, y, y_new).max(1e-10),
            None => f64::INFINITY,
        }
    }
}
