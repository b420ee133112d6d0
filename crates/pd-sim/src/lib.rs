//! ODE model abstraction and solve driver for the pendula models.
//!
//! Provides:
//! - `OdeModel` trait: right-hand side `du/dt = f(t, u)` plus state dimension
//! - `Solvable` trait: model-specific wrapping of solved trajectories
//! - Adaptive Dormand-Prince backends (via `ode_solvers`), an implicit Radau IIA
//!   backend for stiff problems and a fixed-step RK4
//! - `solve` driver sampling the trajectory on a uniform output grid

pub mod error;
pub mod integrator;
pub mod model;
pub mod options;
pub mod radau;
pub mod solution;
pub mod solve;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use integrator::{DormandPrince5, DormandPrince853, Integrator, Rk4};
pub use model::{OdeModel, Solvable};
pub use options::{Method, SolveOptions};
pub use radau::Radau5;
pub use solution::{Solution, SolveStats};
pub use solve::{solve, time_grid};
