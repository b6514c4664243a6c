pub use particle::*;

pub mod models;
mod particle;
pub mod solver;
