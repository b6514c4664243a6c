use crate::core::dynamics::solver::{SolverParameters, StressUpdate};
use crate::dynamics::solver::MpmHooks;
use crate::geometry::Mesh;
use crate::math::Real;

/// An explicit MPM solver, updating the particle stresses either before (USF) or after
/// (USL) the nodal integration.
pub struct ExplicitSolver;

impl ExplicitSolver {
    /// Advances `mesh` by `params.dt`, and returns the time step actually taken.
    ///
    /// The particles must already be located. Particles that are inactive, or outside
    /// of the mesh, are skipped.
    pub fn step(params: &SolverParameters, mesh: &mut Mesh, hooks: &mut dyn MpmHooks) -> Real {
        if mesh.particles.is_empty() || params.dt == 0.0 {
            // Nothing to simulate.
            return params.dt;
        }

        let dt = params.dt;
        let phase = params.phase;
        let Mesh {
            nodes,
            cells,
            particles,
            ..
        } = mesh;

        let tt0 = instant::now();

        let t0 = instant::now();
        Self::reset_grid(nodes);
        Self::update_reference_locations(particles, cells);
        info!("Shape functions: {}ms", instant::now() - t0);

        let t0 = instant::now();
        Self::particle_to_grid_mass_momentum(phase, nodes, cells, particles);
        Self::compute_nodal_velocities(nodes);
        info!("Mass and momentum transfer: {}ms", instant::now() - t0);

        if params.stress_update == StressUpdate::Usf {
            let t0 = instant::now();
            Self::update_particles_stress(dt, phase, nodes, cells, particles);
            info!("Stress update: {}ms", instant::now() - t0);
        }

        let t0 = instant::now();
        Self::particle_to_grid_forces(phase, &params.gravity, nodes, cells, particles);
        Self::grid_update(dt, phase, nodes);
        hooks.post_grid_update_hook(nodes);
        info!("Grid update: {}ms", instant::now() - t0);

        let t0 = instant::now();
        Self::grid_to_particle(dt, phase, params.velocity_update, nodes, cells, particles);
        info!("Particle update: {}ms", instant::now() - t0);

        if params.stress_update == StressUpdate::Usl {
            let t0 = instant::now();
            Self::update_particles_stress(dt, phase, nodes, cells, particles);
            info!("Stress update: {}ms", instant::now() - t0);
        }

        info!(
            ">>>> Total step ({}s) computation time: {}ms",
            dt,
            instant::now() - tt0
        );

        dt
    }
}
