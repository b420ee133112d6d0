//! Single rigid pendulum `theta'' = -(g/L) sin(theta)`.

use pd_core::gradient;
use pd_core::units::{
    Accel, Length, Mass, constants, kg, kilograms, m, meters, meters_per_second_squared, mps2,
};
use pd_sim::{OdeModel, SimResult, Solution, Solvable};

use crate::params::{finite, positive};

/// Pendulum with state `[theta, omega]`.
///
/// The bob mass does not enter the dynamics; it is carried along for callers
/// that want to scale the per-unit-mass energies.
#[derive(Clone, Debug, PartialEq)]
pub struct Pendulum {
    mass: f64,
    length: f64,
    gravity: f64,
}

impl Default for Pendulum {
    fn default() -> Self {
        Self {
            mass: 1.0,
            length: 1.0,
            gravity: constants::GRAVITY_MPS2,
        }
    }
}

impl Pendulum {
    /// Create a pendulum; mass and length must be positive, gravity finite.
    pub fn new(mass: Mass, length: Length, gravity: Accel) -> SimResult<Self> {
        Ok(Self {
            mass: positive(kilograms(mass), "pendulum mass")?,
            length: positive(meters(length), "pendulum length")?,
            gravity: finite(meters_per_second_squared(gravity), "gravity")?,
        })
    }

    pub fn mass(&self) -> Mass {
        kg(self.mass)
    }

    pub fn length(&self) -> Length {
        m(self.length)
    }

    pub fn gravity(&self) -> Accel {
        mps2(self.gravity)
    }
}

impl OdeModel for Pendulum {
    fn num_states(&self) -> usize {
        2
    }

    fn rhs(&self, _t: f64, u: &[f64], du: &mut [f64]) {
        let theta = u[0];
        let omega = u[1];
        du[0] = omega;
        du[1] = -(self.gravity / self.length) * theta.sin();
    }
}

impl Solvable for Pendulum {
    type Output = PendulumSolution;

    fn create_result(&self, solution: Solution) -> PendulumSolution {
        PendulumSolution {
            solution,
            mass: self.mass,
            length: self.length,
            gravity: self.gravity,
        }
    }
}

/// Solved pendulum trajectory with derived kinematics.
///
/// Every derived quantity is recomputed on each call. Energies are per unit
/// mass with the zero of potential energy at the lowest point.
#[derive(Clone, Debug)]
pub struct PendulumSolution {
    solution: Solution,
    mass: f64,
    length: f64,
    gravity: f64,
}

impl PendulumSolution {
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn time(&self) -> &[f64] {
        self.solution.time()
    }

    pub fn theta(&self) -> &[f64] {
        self.solution.component(0).unwrap_or_default()
    }

    pub fn omega(&self) -> &[f64] {
        self.solution.component(1).unwrap_or_default()
    }

    pub fn mass(&self) -> Mass {
        kg(self.mass)
    }

    /// Horizontal bob position `L sin(theta)`.
    pub fn x(&self) -> Vec<f64> {
        self.theta().iter().map(|th| self.length * th.sin()).collect()
    }

    /// Vertical bob position `-L cos(theta)`.
    pub fn y(&self) -> Vec<f64> {
        self.theta().iter().map(|th| -self.length * th.cos()).collect()
    }

    pub fn vx(&self) -> SimResult<Vec<f64>> {
        Ok(gradient(&self.x(), self.time())?)
    }

    pub fn vy(&self) -> SimResult<Vec<f64>> {
        Ok(gradient(&self.y(), self.time())?)
    }

    /// `g (y + L)`
    pub fn potential_energy(&self) -> Vec<f64> {
        self.y()
            .iter()
            .map(|y| self.gravity * (y + self.length))
            .collect()
    }

    /// `(vx^2 + vy^2) / 2`
    pub fn kinetic_energy(&self) -> SimResult<Vec<f64>> {
        let vx = self.vx()?;
        let vy = self.vy()?;
        Ok(vx
            .iter()
            .zip(&vy)
            .map(|(vx, vy)| 0.5 * (vx * vx + vy * vy))
            .collect())
    }

    pub fn total_energy(&self) -> SimResult<Vec<f64>> {
        let kinetic = self.kinetic_energy()?;
        Ok(self
            .potential_energy()
            .iter()
            .zip(&kinetic)
            .map(|(p, k)| p + k)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_sim::SimError;
    use std::f64::consts::PI;

    #[test]
    fn rhs_value() {
        let model = Pendulum::new(kg(1.0), m(1.42), constants::gravity()).unwrap();
        let du = model.evaluate(0.0, &[PI / 6.0, 0.35]);
        let expected = [0.35, -3.45];
        for (comp, exp) in du.iter().zip(expected) {
            assert!((comp - exp).abs() < 1e-2, "{comp} vs {exp}");
        }
    }

    #[test]
    fn at_rest_derivative_is_exactly_zero() {
        let du = Pendulum::default().evaluate(0.0, &[0.0, 0.0]);
        assert_eq!(du, vec![0.0, 0.0]);
    }

    #[test]
    fn solve_from_rest_stays_at_rest() {
        let sol = Pendulum::default().solve(&[0.0, 0.0], 10.0, 0.01).unwrap();
        assert!(sol.theta().iter().all(|&v| v == 0.0));
        assert!(sol.omega().iter().all(|&v| v == 0.0));
        assert!(sol.x().iter().all(|&v| v == 0.0));
        assert!(sol.y().iter().all(|&v| v == -1.0));
        assert!(sol.potential_energy().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn defaults_and_accessors() {
        let model = Pendulum::default();
        assert_eq!(meters(model.length()), 1.0);
        assert_eq!(kilograms(model.mass()), 1.0);
        assert_eq!(meters_per_second_squared(model.gravity()), 9.81);
        assert_eq!(model.num_states(), 2);
        assert_eq!(
            model,
            Pendulum::new(kg(1.0), m(1.0), constants::gravity()).unwrap()
        );
    }

    #[test]
    fn invalid_parameters_rejected() {
        let g = constants::gravity();
        assert!(matches!(
            Pendulum::new(kg(1.0), m(0.0), g),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(Pendulum::new(kg(-1.0), m(1.0), g).is_err());
        assert!(Pendulum::new(kg(1.0), m(1.0), mps2(f64::NAN)).is_err());
    }

    #[test]
    fn positions_follow_angle() {
        let model = Pendulum::new(kg(2.0), m(2.0), constants::gravity()).unwrap();
        let sol = model.create_result(
            Solution::from_parts(vec![0.0, 1.0], vec![vec![PI / 2.0, PI], vec![0.0, 0.0]])
                .unwrap(),
        );
        let x = sol.x();
        let y = sol.y();
        assert!((x[0] - 2.0).abs() < 1e-12 && y[0].abs() < 1e-12);
        assert!(x[1].abs() < 1e-12 && (y[1] - 2.0).abs() < 1e-12);
        // Upside down: potential g * 2L
        assert!((sol.potential_energy()[1] - 9.81 * 4.0).abs() < 1e-9);
        assert_eq!(kilograms(sol.mass()), 2.0);
    }

    #[test]
    fn velocity_matches_angular_rate() {
        // Uniform rotation theta = w t: speed is L w everywhere
        let w = 0.3;
        let time: Vec<f64> = (0..=200).map(|i| i as f64 * 0.01).collect();
        let theta: Vec<f64> = time.iter().map(|t| w * t).collect();
        let omega = vec![w; time.len()];
        let sol = Pendulum::default()
            .create_result(Solution::from_parts(time, vec![theta, omega]).unwrap());

        let vx = sol.vx().unwrap();
        let vy = sol.vy().unwrap();
        for (vx, vy) in vx.iter().zip(&vy).skip(1).take(199) {
            assert!(((vx * vx + vy * vy).sqrt() - w).abs() < 1e-5);
        }
        let kinetic = sol.kinetic_energy().unwrap();
        assert!((kinetic[100] - 0.5 * w * w).abs() < 1e-5);
    }
}
