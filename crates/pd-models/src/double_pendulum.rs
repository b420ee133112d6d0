//! Double pendulum: two rigid rods with point bobs, the second hung from the first.

use pd_core::gradient;
use pd_core::units::{
    Accel, Length, Mass, constants, kg, kilograms, m, meters, meters_per_second_squared, mps2,
};
use pd_sim::{OdeModel, SimResult, Solution, Solvable};

use crate::params::{finite, positive};

/// Double pendulum with state `[theta1, omega1, theta2, omega2]`.
///
/// The equations of motion are those of two equal bobs. The bob masses are
/// stored but enter neither the dynamics nor the energies reported by
/// [`DoublePendulumSolution`], which are per unit mass for each bob.
#[derive(Clone, Debug, PartialEq)]
pub struct DoublePendulum {
    mass1: f64,
    mass2: f64,
    length1: f64,
    length2: f64,
    gravity: f64,
}

impl Default for DoublePendulum {
    fn default() -> Self {
        Self {
            mass1: 1.0,
            mass2: 1.0,
            length1: 1.0,
            length2: 1.0,
            gravity: constants::GRAVITY_MPS2,
        }
    }
}

impl DoublePendulum {
    /// Create a double pendulum with unit bob masses.
    pub fn new(length1: Length, length2: Length, gravity: Accel) -> SimResult<Self> {
        Ok(Self {
            length1: positive(meters(length1), "upper rod length")?,
            length2: positive(meters(length2), "lower rod length")?,
            gravity: finite(meters_per_second_squared(gravity), "gravity")?,
            ..Self::default()
        })
    }

    /// Replace the bob masses.
    pub fn with_masses(self, mass1: Mass, mass2: Mass) -> SimResult<Self> {
        Ok(Self {
            mass1: positive(kilograms(mass1), "upper bob mass")?,
            mass2: positive(kilograms(mass2), "lower bob mass")?,
            ..self
        })
    }

    pub fn masses(&self) -> (Mass, Mass) {
        (kg(self.mass1), kg(self.mass2))
    }

    pub fn length1(&self) -> Length {
        m(self.length1)
    }

    pub fn length2(&self) -> Length {
        m(self.length2)
    }

    pub fn gravity(&self) -> Accel {
        mps2(self.gravity)
    }
}

impl OdeModel for DoublePendulum {
    fn num_states(&self) -> usize {
        4
    }

    fn rhs(&self, _t: f64, u: &[f64], du: &mut [f64]) {
        let (theta1, omega1, theta2, omega2) = (u[0], u[1], u[2], u[3]);
        let (l1, l2, g) = (self.length1, self.length2, self.gravity);

        let delta = theta2 - theta1;
        let (sin_d, cos_d) = delta.sin_cos();

        let num1 = l1 * omega1 * omega1 * sin_d * cos_d
            + g * theta2.sin() * cos_d
            + l2 * omega2 * omega2 * sin_d
            - 2.0 * g * theta1.sin();
        let num2 = -l2 * omega2 * omega2 * sin_d * cos_d
            + 2.0 * g * theta1.sin() * cos_d
            - 2.0 * l1 * omega1 * omega1 * sin_d
            - 2.0 * g * theta2.sin();

        // 2L - L cos^2 >= L > 0 for positive lengths
        let den1 = 2.0 * l1 - l1 * cos_d * cos_d;
        let den2 = 2.0 * l2 - l2 * cos_d * cos_d;

        du[0] = omega1;
        du[1] = num1 / den1;
        du[2] = omega2;
        du[3] = num2 / den2;
    }
}

impl Solvable for DoublePendulum {
    type Output = DoublePendulumSolution;

    fn create_result(&self, solution: Solution) -> DoublePendulumSolution {
        DoublePendulumSolution {
            solution,
            length1: self.length1,
            length2: self.length2,
            gravity: self.gravity,
        }
    }
}

/// Solved double pendulum trajectory with derived kinematics.
///
/// Positions of the lower bob are offset by the upper bob. Energies treat
/// each bob as a unit point mass.
#[derive(Clone, Debug)]
pub struct DoublePendulumSolution {
    solution: Solution,
    length1: f64,
    length2: f64,
    gravity: f64,
}

impl DoublePendulumSolution {
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn time(&self) -> &[f64] {
        self.solution.time()
    }

    pub fn theta1(&self) -> &[f64] {
        self.solution.component(0).unwrap_or_default()
    }

    pub fn omega1(&self) -> &[f64] {
        self.solution.component(1).unwrap_or_default()
    }

    pub fn theta2(&self) -> &[f64] {
        self.solution.component(2).unwrap_or_default()
    }

    pub fn omega2(&self) -> &[f64] {
        self.solution.component(3).unwrap_or_default()
    }

    pub fn x1(&self) -> Vec<f64> {
        self.theta1()
            .iter()
            .map(|th| self.length1 * th.sin())
            .collect()
    }

    pub fn y1(&self) -> Vec<f64> {
        self.theta1()
            .iter()
            .map(|th| -self.length1 * th.cos())
            .collect()
    }

    pub fn x2(&self) -> Vec<f64> {
        self.x1()
            .iter()
            .zip(self.theta2())
            .map(|(x1, th)| x1 + self.length2 * th.sin())
            .collect()
    }

    pub fn y2(&self) -> Vec<f64> {
        self.y1()
            .iter()
            .zip(self.theta2())
            .map(|(y1, th)| y1 - self.length2 * th.cos())
            .collect()
    }

    pub fn vx1(&self) -> SimResult<Vec<f64>> {
        Ok(gradient(&self.x1(), self.time())?)
    }

    pub fn vy1(&self) -> SimResult<Vec<f64>> {
        Ok(gradient(&self.y1(), self.time())?)
    }

    pub fn vx2(&self) -> SimResult<Vec<f64>> {
        Ok(gradient(&self.x2(), self.time())?)
    }

    pub fn vy2(&self) -> SimResult<Vec<f64>> {
        Ok(gradient(&self.y2(), self.time())?)
    }

    /// `g (y1 + L1) + g (y2 + L1 + L2)`, zero with both bobs hanging straight down.
    pub fn potential_energy(&self) -> Vec<f64> {
        let (l1, l2, g) = (self.length1, self.length2, self.gravity);
        self.y1()
            .iter()
            .zip(self.y2())
            .map(|(y1, y2)| g * (y1 + l1) + g * (y2 + l1 + l2))
            .collect()
    }

    pub fn kinetic_energy(&self) -> SimResult<Vec<f64>> {
        let (vx1, vy1) = (self.vx1()?, self.vy1()?);
        let (vx2, vy2) = (self.vx2()?, self.vy2()?);
        Ok((0..vx1.len())
            .map(|i| {
                0.5 * (vx1[i] * vx1[i] + vy1[i] * vy1[i])
                    + 0.5 * (vx2[i] * vx2[i] + vy2[i] * vy2[i])
            })
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
