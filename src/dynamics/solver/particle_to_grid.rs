use super::ExplicitSolver;
use crate::dynamics::{Handler, NodeSet, Particle};
use crate::geometry::Cell;
use crate::math::{Real, Vector};
use rayon::prelude::*;

impl ExplicitSolver {
    /// Runs `f` in parallel on every active particle located in a cell.
    pub(crate) fn for_each_located_particle(
        particles: &mut Handler<Particle>,
        cells: &Handler<Cell>,
        f: impl Fn(&mut Particle, &Cell) + Sync + Send,
    ) {
        particles.par_for_each(|particle| {
            if !particle.status() {
                return;
            }

            if let Some(cell) = particle.cell().and_then(|id| cells.get(id)) {
                f(particle, cell)
            }
        })
    }

    fn scatter(
        particles: &Handler<Particle>,
        cells: &Handler<Cell>,
        f: impl Fn(&Particle, &Cell) + Sync + Send,
    ) {
        particles.par_iter().for_each(|particle| {
            if !particle.status() {
                return;
            }

            if let Some(cell) = particle.cell().and_then(|id| cells.get(id)) {
                f(particle, cell)
            }
        })
    }

    /// Refreshes the reference locations and shape functions of the particles in their
    /// current cells.
    pub(crate) fn update_reference_locations(particles: &mut Handler<Particle>, cells: &Handler<Cell>) {
        Self::for_each_located_particle(particles, cells, |particle, cell| {
            if particle.compute_reference_location(cell) {
                particle.compute_shapefn(cell);
            }
        })
    }

    pub(crate) fn particle_to_grid_mass_momentum(
        phase: usize,
        nodes: &NodeSet,
        cells: &Handler<Cell>,
        particles: &Handler<Particle>,
    ) {
        Self::scatter(particles, cells, |particle, cell| {
            particle.map_mass_momentum_to_nodes(cell, nodes, phase);
        })
    }

    pub(crate) fn particle_to_grid_forces(
        phase: usize,
        gravity: &Vector<Real>,
        nodes: &NodeSet,
        cells: &Handler<Cell>,
        particles: &Handler<Particle>,
    ) {
        Self::scatter(particles, cells, |particle, cell| {
            particle.map_body_force(cell, nodes, phase, gravity);
            particle.map_internal_force(cell, nodes, phase);
        })
    }

    pub(crate) fn update_particles_stress(
        dt: Real,
        phase: usize,
        nodes: &NodeSet,
        cells: &Handler<Cell>,
        particles: &mut Handler<Particle>,
    ) {
        Self::for_each_located_particle(particles, cells, |particle, cell| {
            if particle.compute_strain(cell, nodes, phase, dt) {
                particle.compute_stress(phase);
            }
        })
    }
}
