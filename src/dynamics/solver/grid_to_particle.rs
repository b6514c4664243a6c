use super::ExplicitSolver;
use crate::core::dynamics::solver::VelocityUpdate;
use crate::dynamics::{Handler, NodeSet, Particle};
use crate::geometry::Cell;
use crate::math::Real;

impl ExplicitSolver {
    pub(crate) fn grid_to_particle(
        dt: Real,
        phase: usize,
        velocity_update: VelocityUpdate,
        nodes: &NodeSet,
        cells: &Handler<Cell>,
        particles: &mut Handler<Particle>,
    ) {
        Self::for_each_located_particle(particles, cells, |particle, cell| {
            particle.compute_updated_position(cell, nodes, phase, dt, velocity_update);
        })
    }
}
