//! Concrete ODE models: exponential decay, single pendulum and double pendulum.
//!
//! Each model implements [`pd_sim::OdeModel`] and [`pd_sim::Solvable`]; the
//! pendulum models wrap their trajectories in result types exposing Cartesian
//! positions, velocities and energies.

pub mod double_pendulum;
pub mod exp_decay;
pub mod pendulum;

mod params;

pub use double_pendulum::{DoublePendulum, DoublePendulumSolution};
pub use exp_decay::ExponentialDecay;
pub use pendulum::{Pendulum, PendulumSolution};
