use crate::math::{Real, Vector};

/// When the particle stresses are updated within an explicit step.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StressUpdate {
    /// Update stress first: strains are computed from the nodal velocities obtained by
    /// the mass/momentum scatter, before the nodal forces are assembled.
    Usf,
    /// Update stress last: strains are computed from the integrated nodal velocities.
    Usl,
}

/// How particle velocities are updated from the grid.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VelocityUpdate {
    /// The particle velocity is incremented by the interpolated nodal acceleration.
    Flip,
    /// The particle velocity is replaced by the interpolated nodal velocity.
    Pic,
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolverParameters {
    pub dt: Real,
    pub nsteps: u32,
    pub gravity: Vector<Real>,
    /// The phase advanced by the explicit solver.
    pub phase: usize,
    pub stress_update: StressUpdate,
    pub velocity_update: VelocityUpdate,
    /// Particles are re-located every `locate_particles_every` steps. Zero disables it.
    pub locate_particles_every: u32,
}

impl Default for SolverParameters {
    fn default() -> Self {
        let mut gravity = Vector::zeros();
        gravity[1] = -9.81;

        SolverParameters {
            dt: 1.0e-3,
            nsteps: 1,
            gravity,
            phase: 0,
            stress_update: StressUpdate::Usf,
            velocity_update: VelocityUpdate::Flip,
            locate_particles_every: 1,
        }
    }
}
