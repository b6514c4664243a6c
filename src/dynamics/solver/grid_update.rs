use super::ExplicitSolver;
use crate::dynamics::{Node, NodeSet};
use crate::math::Real;

impl ExplicitSolver {
    pub(crate) fn reset_grid(nodes: &mut NodeSet) {
        nodes.par_for_each_node(Node::reset)
    }

    pub(crate) fn compute_nodal_velocities(nodes: &mut NodeSet) {
        nodes.par_for_each_node(|node| {
            if node.status() {
                node.compute_velocity()
            }
        })
    }

    pub(crate) fn grid_update(dt: Real, phase: usize, nodes: &mut NodeSet) {
        nodes.par_for_each_node(|node| {
            if node.status() {
                node.compute_acceleration_velocity(phase, dt);
            }
        })
    }
}
