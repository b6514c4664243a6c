pub use self::solver_parameters::{SolverParameters, StressUpdate, VelocityUpdate};

mod solver_parameters;
