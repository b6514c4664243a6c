use crate::dynamics::{Handler, Identifiable};
use crate::math::{Index, Point, Real, DIM};
use na::DVector;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

bitflags::bitflags! {
    pub struct NodeFlags: u32 {
        const NONE = 0;
        const ACTIVE = 1 << 0;
        const CONSTRAINED = 1 << 1;
    }
}

/// The accumulators of one phase at a node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodePhase {
    pub mass: Real,
    pub volume: Real,
    pub momentum: DVector<Real>,
    pub external_force: DVector<Real>,
    pub internal_force: DVector<Real>,
    pub velocity: DVector<Real>,
    pub acceleration: DVector<Real>,
}

impl NodePhase {
    fn new(dof: usize) -> Self {
        Self {
            mass: 0.0,
            volume: 0.0,
            momentum: DVector::zeros(dof),
            external_force: DVector::zeros(dof),
            internal_force: DVector::zeros(dof),
            velocity: DVector::zeros(dof),
            acceleration: DVector::zeros(dof),
        }
    }

    fn reset(&mut self) {
        self.mass = 0.0;
        self.volume = 0.0;
        self.momentum.fill(0.0);
        self.external_force.fill(0.0);
        self.internal_force.fill(0.0);
        self.velocity.fill(0.0);
        self.acceleration.fill(0.0);
    }
}

/// A vertex of the background grid.
///
/// Every vector quantity has `dof` components per phase. Accumulators are plain sums:
/// concurrent scatter goes through a [`NodeSet`], which locks each node independently.
#[derive(Clone, Debug)]
pub struct Node {
    id: Index,
    coordinates: Point<Real>,
    dof: usize,
    flags: NodeFlags,
    phases: Vec<NodePhase>,
    velocity_constraints: BTreeMap<usize, Real>,
}

impl Node {
    pub fn new(id: Index, coordinates: Point<Real>, dof: usize, nphases: usize) -> Self {
        Self {
            id,
            coordinates,
            dof,
            flags: NodeFlags::NONE,
            phases: vec![NodePhase::new(dof); nphases],
            velocity_constraints: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Index {
        self.id
    }

    pub fn dof(&self) -> usize {
        self.dof
    }

    pub fn nphases(&self) -> usize {
        self.phases.len()
    }

    pub fn coordinates(&self) -> &Point<Real> {
        &self.coordinates
    }

    pub fn assign_coordinates(&mut self, coordinates: Point<Real>) {
        self.coordinates = coordinates;
    }

    pub fn status(&self) -> bool {
        self.flags.contains(NodeFlags::ACTIVE)
    }

    pub fn assign_status(&mut self, status: bool) {
        self.flags.set(NodeFlags::ACTIVE, status);
    }

    pub fn is_constrained(&self) -> bool {
        self.flags.contains(NodeFlags::CONSTRAINED)
    }

    /// Clears every accumulator and the active flag. Velocity constraints are kept.
    pub fn reset(&mut self) {
        self.phases.iter_mut().for_each(NodePhase::reset);
        self.flags.remove(NodeFlags::ACTIVE);
    }

    pub fn phase(&self, phase: usize) -> Option<&NodePhase> {
        self.phases.get(phase)
    }

    /// A vector accumulator of `phase`, or zeros if the node has no such phase.
    fn vector_or_zeros(&self, phase: usize, field: fn(&NodePhase) -> &DVector<Real>) -> DVector<Real> {
        self.phases
            .get(phase)
            .map_or_else(|| DVector::zeros(self.dof), |p| field(p).clone())
    }

    pub fn mass(&self, phase: usize) -> Real {
        self.phases.get(phase).map_or(0.0, |p| p.mass)
    }

    pub fn volume(&self, phase: usize) -> Real {
        self.phases.get(phase).map_or(0.0, |p| p.volume)
    }

    pub fn momentum(&self, phase: usize) -> DVector<Real> {
        self.vector_or_zeros(phase, |p| &p.momentum)
    }

    pub fn external_force(&self, phase: usize) -> DVector<Real> {
        self.vector_or_zeros(phase, |p| &p.external_force)
    }

    pub fn internal_force(&self, phase: usize) -> DVector<Real> {
        self.vector_or_zeros(phase, |p| &p.internal_force)
    }

    pub fn velocity(&self, phase: usize) -> DVector<Real> {
        self.vector_or_zeros(phase, |p| &p.velocity)
    }

    pub fn acceleration(&self, phase: usize) -> DVector<Real> {
        self.vector_or_zeros(phase, |p| &p.acceleration)
    }

    fn update_scalar(
        &mut self,
        update: bool,
        phase: usize,
        value: Real,
        field: fn(&mut NodePhase) -> &mut Real,
    ) -> bool {
        match self.phases.get_mut(phase) {
            Some(data) => {
                let target = field(data);
                *target = if update { *target + value } else { value };
                true
            }
            None => {
                warn!("Node {}: invalid phase {}.", self.id, phase);
                false
            }
        }
    }

    fn update_vector(
        &mut self,
        update: bool,
        phase: usize,
        value: &DVector<Real>,
        field: fn(&mut NodePhase) -> &mut DVector<Real>,
    ) -> bool {
        if value.len() != self.dof {
            warn!(
                "Node {}: expected a vector with {} components, got {}.",
                self.id,
                self.dof,
                value.len()
            );
            return false;
        }

        match self.phases.get_mut(phase) {
            Some(data) => {
                let target = field(data);
                if update {
                    *target += value;
                } else {
                    target.copy_from(value);
                }
                true
            }
            None => {
                warn!("Node {}: invalid phase {}.", self.id, phase);
                false
            }
        }
    }

    /// Adds `mass` to the nodal mass if `update` is set, overwrites it otherwise.
    pub fn update_mass(&mut self, update: bool, phase: usize, mass: Real) -> bool {
        self.update_scalar(update, phase, mass, |p| &mut p.mass)
    }

    pub fn update_volume(&mut self, update: bool, phase: usize, volume: Real) -> bool {
        self.update_scalar(update, phase, volume, |p| &mut p.volume)
    }

    pub fn update_momentum(&mut self, update: bool, phase: usize, momentum: &DVector<Real>) -> bool {
        self.update_vector(update, phase, momentum, |p| &mut p.momentum)
    }

    pub fn update_external_force(
        &mut self,
        update: bool,
        phase: usize,
        force: &DVector<Real>,
    ) -> bool {
        self.update_vector(update, phase, force, |p| &mut p.external_force)
    }

    pub fn update_internal_force(
        &mut self,
        update: bool,
        phase: usize,
        force: &DVector<Real>,
    ) -> bool {
        self.update_vector(update, phase, force, |p| &mut p.internal_force)
    }

    pub fn update_acceleration(
        &mut self,
        update: bool,
        phase: usize,
        acceleration: &DVector<Real>,
    ) -> bool {
        self.update_vector(update, phase, acceleration, |p| &mut p.acceleration)
    }

    /// Sets `velocity = momentum / mass` for every phase with a positive mass (zero
    /// otherwise), then applies the velocity constraints.
    pub fn compute_velocity(&mut self) {
        for phase in &mut self.phases {
            if phase.mass > 0.0 {
                phase.velocity = &phase.momentum / phase.mass;
            } else {
                phase.velocity.fill(0.0);
            }
        }

        self.apply_velocity_constraints();
    }

    /// Integrates the nodal forces of `phase` over `dt`.
    ///
    /// Returns `false` for a massless node, which is left untouched.
    pub fn compute_acceleration_velocity(&mut self, phase: usize, dt: Real) -> bool {
        let dof = self.dof;
        let data = match self.phases.get_mut(phase) {
            Some(data) if data.mass > 0.0 => data,
            _ => return false,
        };

        data.acceleration = (&data.external_force + &data.internal_force) / data.mass;
        data.velocity += &data.acceleration * dt;

        for (constrained_dof, value) in &self.velocity_constraints {
            if constrained_dof / dof == phase {
                let direction = constrained_dof % dof;
                data.velocity[direction] = *value;
                data.acceleration[direction] = 0.0;
            }
        }

        true
    }

    /// Stages a prescribed velocity for the degree of freedom `direction + phase * dof`.
    pub fn assign_velocity_constraint(&mut self, dof: usize, velocity: Real) -> bool {
        if dof >= self.dof * self.phases.len() {
            warn!("Node {}: invalid velocity constraint dof {}.", self.id, dof);
            return false;
        }

        self.velocity_constraints.insert(dof, velocity);
        self.flags.insert(NodeFlags::CONSTRAINED);
        true
    }

    pub fn velocity_constraints(&self) -> &BTreeMap<usize, Real> {
        &self.velocity_constraints
    }

    /// Overwrites the constrained velocity components with their prescribed values.
    pub fn apply_velocity_constraints(&mut self) {
        for (dof, value) in &self.velocity_constraints {
            let phase = dof / self.dof;
            let direction = dof % self.dof;
            self.phases[phase].velocity[direction] = *value;
        }
    }
}

impl Identifiable for Node {
    fn id(&self) -> Index {
        self.id
    }
}

/// The node arena, locked node by node.
pub type NodeSet = Handler<Mutex<Node>>;

/// Poisoned locks are recovered.
pub fn lock_node(node: &Mutex<Node>) -> MutexGuard<'_, Node> {
    node.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Handler<Mutex<Node>> {
    /// Runs `f` on the node `id` while holding its lock.
    pub fn with_node<R>(&self, id: Index, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        self.get(id).map(|node| f(&mut lock_node(node)))
    }

    pub fn insert_node(&mut self, node: Node) -> bool {
        self.insert(node.id(), Mutex::new(node))
    }

    /// Runs `f` on every node in parallel. No locking is needed here.
    pub fn par_for_each_node(&mut self, f: impl Fn(&mut Node) + Sync + Send) {
        self.par_for_each(|node| f(node.get_mut().unwrap_or_else(PoisonError::into_inner)))
    }
}

/// Pads or truncates a nodal vector to the spatial dimension.
pub(crate) fn spatial_part(vector: &DVector<Real>) -> crate::math::Vector<Real> {
    crate::math::Vector::from_fn(|i, _| {
        if i < DIM && i < vector.len() {
            vector[i]
        } else {
            0.0
        }
    })
}

#[cfg(test)]
mod test {
    use super::{Node, NodeSet};
    use crate::math::{Point, DIM};
    use na::DVector;

    fn node() -> Node {
        Node::new(0, Point::origin(), DIM, 1)
    }

    #[test]
    fn mass_accumulation() {
        let mut node = node();
        assert!(node.update_mass(true, 0, 100.5));
        assert!(node.update_mass(true, 0, 100.5));
        assert_eq!(node.mass(0), 201.0);

        assert!(node.update_mass(false, 0, 100.0));
        assert_eq!(node.mass(0), 100.0);

        assert!(!node.update_mass(true, 1, 1.0));
        assert_eq!(node.mass(0), 100.0);
    }

    #[test]
    fn vector_setters_reject_wrong_dimension() {
        let mut node = node();
        let force = DVector::from_element(DIM, 10.0);
        let wrong = DVector::from_element(DIM + 1, 1.0);

        assert!(node.update_external_force(true, 0, &force));
        assert!(node.update_internal_force(true, 0, &force));
        assert!(node.update_momentum(true, 0, &force));
        assert!(node.update_acceleration(true, 0, &force));

        assert!(!node.update_external_force(true, 0, &wrong));
        assert!(!node.update_internal_force(false, 0, &wrong));
        assert!(!node.update_momentum(true, 0, &wrong));
        assert!(!node.update_acceleration(false, 0, &wrong));

        assert_eq!(node.external_force(0), force);
        assert_eq!(node.internal_force(0), force);
        assert_eq!(node.momentum(0), force);
        assert_eq!(node.acceleration(0), force);

        assert!(node.update_external_force(true, 0, &force));
        assert_eq!(node.external_force(0), force.clone() * 2.0);
        assert!(node.update_external_force(false, 0, &force));
        assert_eq!(node.external_force(0), force);
    }

    #[test]
    fn unknown_phases_read_as_zero() {
        let mut node = node();
        node.update_mass(false, 0, 3.0);
        node.update_momentum(false, 0, &DVector::from_element(DIM, 6.0));
        node.compute_velocity();

        assert_eq!(node.mass(1), 0.0);
        assert_eq!(node.volume(4), 0.0);
        assert_eq!(node.momentum(1), DVector::zeros(DIM));
        assert_eq!(node.velocity(1), DVector::zeros(DIM));
        assert_eq!(node.acceleration(2), DVector::zeros(DIM));
        assert_eq!(node.external_force(1), DVector::zeros(DIM));
        assert_eq!(node.internal_force(1), DVector::zeros(DIM));
        assert!(node.phase(1).is_none());
        assert_eq!(node.velocity(0), DVector::from_element(DIM, 2.0));
    }

    #[test]
    fn velocity_from_momentum() {
        let mut node = node();
        node.update_momentum(false, 0, &DVector::from_element(DIM, 10.0));

        node.compute_velocity();
        assert_eq!(node.velocity(0), DVector::zeros(DIM));

        node.update_mass(false, 0, 100.0);
        node.compute_velocity();
        for v in node.velocity(0).iter() {
            assert!((v - 0.1).abs() < 1.0e-15);
        }
    }

    #[test]
    fn velocity_constraints_are_staged() {
        let mut node = node();
        node.update_mass(false, 0, 2.0);
        node.update_momentum(false, 0, &DVector::from_element(DIM, 4.0));

        assert!(node.assign_velocity_constraint(0, -1.0));
        assert!(!node.assign_velocity_constraint(DIM, 1.0));
        assert!(node.is_constrained());
        assert_eq!(node.velocity(0)[0], 0.0);

        node.compute_velocity();
        assert_eq!(node.velocity(0)[0], -1.0);
        assert_eq!(node.velocity(0)[1], 2.0);
    }

    #[test]
    fn force_integration() {
        let mut node = node();
        assert!(!node.compute_acceleration_velocity(0, 0.1));

        node.update_mass(false, 0, 2.0);
        node.update_external_force(false, 0, &DVector::from_element(DIM, 4.0));
        node.update_internal_force(false, 0, &DVector::from_element(DIM, -2.0));
        node.assign_velocity_constraint(1, 0.5);

        assert!(node.compute_acceleration_velocity(0, 0.1));
        assert!((node.acceleration(0)[0] - 1.0).abs() < 1.0e-15);
        assert!((node.velocity(0)[0] - 0.1).abs() < 1.0e-15);
        assert_eq!(node.acceleration(0)[1], 0.0);
        assert_eq!(node.velocity(0)[1], 0.5);
    }

    #[test]
    fn node_with_more_dofs_than_dimensions() {
        let mut node = Node::new(3, Point::origin(), 6, 1);
        assert_eq!(node.dof(), 6);
        assert!(!node.update_momentum(true, 0, &DVector::from_element(DIM, 1.0)));
        assert!(node.update_momentum(true, 0, &DVector::from_element(6, 1.0)));
    }

    #[test]
    fn status_and_reset() {
        let mut nodes = NodeSet::new();
        assert!(nodes.insert_node(node()));
        assert!(!nodes.insert_node(node()));

        nodes.with_node(0, |node| {
            node.assign_status(true);
            node.update_mass(false, 0, 1.0);
            node.assign_velocity_constraint(0, 1.0);
        });

        nodes.par_for_each_node(|node| node.reset());

        let status = nodes.with_node(0, |node| {
            (node.status(), node.mass(0), node.velocity_constraints().len())
        });
        assert_eq!(status, Some((false, 0.0, 1)));
        assert_eq!(nodes.with_node(1, |node| node.id()), None);
    }

    #[test]
    fn coordinates_update_through_the_handler() {
        let mut nodes = NodeSet::new();
        for id in 0..3 {
            nodes.insert_node(Node::new(id, Point::origin(), DIM, 1));
        }

        nodes.par_for_each_node(|node| {
            let mut coordinates = Point::origin();
            coordinates[0] = node.id() as f64;
            node.assign_coordinates(coordinates);
        });

        for id in 0..3 {
            assert_eq!(
                nodes.with_node(id, |node| node.coordinates()[0]),
                Some(id as f64)
            );
        }
    }
}
