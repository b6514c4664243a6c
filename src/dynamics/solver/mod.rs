pub use self::explicit_solver::ExplicitSolver;
pub use self::mpm_hooks::MpmHooks;
pub use crate::core::dynamics::solver::{SolverParameters, StressUpdate, VelocityUpdate};

mod explicit_solver;
mod grid_to_particle;
mod grid_update;
mod mpm_hooks;
mod particle_to_grid;
