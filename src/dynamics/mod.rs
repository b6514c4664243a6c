pub use self::handler::{Handler, Identifiable};
pub use self::node::{lock_node, Node, NodeFlags, NodePhase, NodeSet};
pub use self::particle::{Particle, ParticlePhase};

mod handler;
pub mod models;
pub(crate) mod node;
mod particle;
pub mod solver;
