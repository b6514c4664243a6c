use crate::dynamics::NodeSet;

pub trait MpmHooks: Send + Sync {
    /// Called once the nodal velocities are integrated, before they are mapped back to
    /// the particles. Boundary conditions go here.
    fn post_grid_update_hook(&mut self, nodes: &mut NodeSet);
}

impl MpmHooks for () {
    fn post_grid_update_hook(&mut self, _: &mut NodeSet) {
        /* nothing */
    }
}
