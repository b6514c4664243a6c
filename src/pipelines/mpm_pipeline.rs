use crate::dynamics::solver::{ExplicitSolver, MpmHooks, SolverParameters};
use crate::geometry::Mesh;
use crate::math::Real;

/// Drives the explicit solver, re-locating the particles on a schedule.
pub struct MpmPipeline {
    first_step: bool,
    step_id: u64,
}

impl MpmPipeline {
    pub fn new() -> Self {
        MpmPipeline {
            first_step: true,
            step_id: 0,
        }
    }

    /// The number of steps taken so far.
    pub fn step_id(&self) -> u64 {
        self.step_id
    }

    pub fn step(
        &mut self,
        params: &SolverParameters,
        mesh: &mut Mesh,
        hooks: &mut dyn MpmHooks,
    ) -> Real {
        if self.first_step {
            let nphases = mesh.nphases();
            mesh.particles.for_each(|particle| {
                for phase in 0..nphases {
                    particle.compute_mass(phase);
                }
            });
            mesh.locate_particles();
            self.first_step = false;
        } else if params.locate_particles_every > 0
            && self.step_id % params.locate_particles_every as u64 == 0
        {
            let outside = mesh.locate_particles();
            if !outside.is_empty() {
                warn!("{} particles left the mesh.", outside.len());
            }
        }

        let dt = ExplicitSolver::step(params, mesh, hooks);
        self.step_id += 1;
        dt
    }

    /// Runs `params.nsteps` steps and returns the simulated time.
    pub fn run(
        &mut self,
        params: &SolverParameters,
        mesh: &mut Mesh,
        hooks: &mut dyn MpmHooks,
    ) -> Real {
        (0..params.nsteps)
            .map(|_| self.step(params, mesh, hooks))
            .sum()
    }
}

impl Default for MpmPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::MpmPipeline;
    use crate::core::dynamics::solver::SolverParameters;
    use crate::geometry::mesh::test::strip;
    use crate::math::{Point, DIM};

    #[test]
    fn particles_follow_the_flow() {
        let mut mesh = strip(4);
        let mut point = Point::origin();
        point[0] = 0.9;
        for d in 1..DIM {
            point[d] = 0.5;
        }
        mesh.add_particle(0, point, 0.25, 0).unwrap();

        let particle = mesh.particles.get_mut(0).unwrap();
        let mut velocity = na::DVector::zeros(DIM);
        velocity[0] = 1.0;
        assert!(particle.assign_velocity(0, &velocity));
        assert_eq!(particle.mass(0), 250.0);

        let params = SolverParameters {
            gravity: na::zero(),
            dt: 0.01,
            nsteps: 20,
            ..SolverParameters::default()
        };

        let mut pipeline = MpmPipeline::new();
        let time = pipeline.run(&params, &mut mesh, &mut ());

        assert!((time - 0.2).abs() < 1.0e-12);
        assert_eq!(pipeline.step_id(), 20);

        let particle = mesh.particles.get(0).unwrap();
        assert!((particle.coordinates()[0] - 1.1).abs() < 1.0e-10);
        assert_eq!(particle.cell(), Some(1));
        assert!(mesh.cells.get(1).unwrap().status());
        assert!(!mesh.cells.get(0).unwrap().status());
    }
}
