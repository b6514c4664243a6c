use crate::core::geometry::ShapeFn;
use crate::dynamics::node::spatial_part;
use crate::dynamics::{lock_node, Identifiable, Node, NodeSet};
use crate::math::{
    BMatrix, Index, Matrix, NodalMatrix, Point, Real, Vector, VoigtVector, DEFAULT_EPSILON, DIM,
};
use anyhow::{bail, ensure};
use na::DVector;
use std::collections::BTreeMap;

const MAX_INVERSE_MAPPING_ITERATIONS: usize = 20;
const INVERSE_MAPPING_TOLERANCE: Real = 1.0e-12;

/// An element of the background grid.
///
/// A cell refers to its nodes by id, and caches their coordinates when they are added.
#[derive(Clone, Debug)]
pub struct Cell {
    id: Index,
    nnodes: usize,
    shapefn: ShapeFn,
    nodes: Vec<Option<Index>>,
    nodal_coordinates: NodalMatrix<Real>,
    neighbours: BTreeMap<usize, Index>,
    particles: Vec<Index>,
    volume: Option<Real>,
    centroid_jacobian_det: Real,
    centroid_gradients: Option<NodalMatrix<Real>>,
}

impl Cell {
    /// A cell with `nnodes` node slots, interpolated by `shapefn`.
    ///
    /// Fails if `nnodes` does not exceed the dimension, or if `shapefn` has fewer
    /// functions than `nnodes`.
    pub fn new(id: Index, nnodes: usize, shapefn: ShapeFn) -> anyhow::Result<Self> {
        ensure!(
            nnodes > DIM,
            "cell {}: {} nodes is too few for a {}-dimensional cell",
            id,
            nnodes,
            DIM
        );
        ensure!(
            shapefn.nfunctions() >= nnodes,
            "cell {}: the {} shape functions cannot interpolate {} nodes",
            id,
            shapefn.name(),
            nnodes
        );

        Ok(Self {
            id,
            nnodes,
            shapefn,
            nodes: vec![None; nnodes],
            nodal_coordinates: NodalMatrix::zeros(nnodes),
            neighbours: BTreeMap::new(),
            particles: vec![],
            volume: None,
            centroid_jacobian_det: 0.0,
            centroid_gradients: None,
        })
    }

    pub fn id(&self) -> Index {
        self.id
    }

    pub fn nnodes(&self) -> usize {
        self.nnodes
    }

    pub fn nfunctions(&self) -> usize {
        self.shapefn.nfunctions()
    }

    pub fn shapefn(&self) -> ShapeFn {
        self.shapefn
    }

    /// The ids of the nodes added so far, in local order.
    pub fn nodes(&self) -> impl Iterator<Item = Index> + '_ {
        self.nodes.iter().flatten().copied()
    }

    pub fn node_id(&self, local_id: usize) -> Option<Index> {
        self.nodes.get(local_id).copied().flatten()
    }

    pub fn nodal_coordinates(&self) -> &NodalMatrix<Real> {
        &self.nodal_coordinates
    }

    /// Attaches `node` to the slot `local_id`.
    ///
    /// Fails, without any change, if the slot does not exist or is already filled.
    pub fn add_node(&mut self, local_id: usize, node: &Node) -> bool {
        match self.nodes.get_mut(local_id) {
            Some(slot @ None) => {
                *slot = Some(node.id());
                self.nodal_coordinates
                    .row_mut(local_id)
                    .copy_from(&node.coordinates().coords.transpose());
                true
            }
            Some(Some(_)) => {
                warn!("Cell {}: local node {} is already set.", self.id, local_id);
                false
            }
            None => {
                warn!(
                    "Cell {}: local node {} is out of range (nnodes = {}).",
                    self.id, local_id, self.nnodes
                );
                false
            }
        }
    }

    /// Records the cell `neighbour` under the local index `local_id`.
    ///
    /// Returns `Ok(false)` if `local_id` is already taken. A cell cannot be its own
    /// neighbour.
    pub fn add_neighbour(&mut self, local_id: usize, neighbour: Index) -> anyhow::Result<bool> {
        if neighbour == self.id {
            bail!("cell {}: a cell cannot be its own neighbour", self.id);
        }

        if self.neighbours.contains_key(&local_id) {
            return Ok(false);
        }

        self.neighbours.insert(local_id, neighbour);
        Ok(true)
    }

    pub fn neighbours(&self) -> &BTreeMap<usize, Index> {
        &self.neighbours
    }

    /// Computes the volume and the centroid data once every node is set.
    pub fn initialise(&mut self) -> bool {
        if self.nodes.iter().any(Option::is_none) {
            warn!("Cell {}: cannot initialise a cell with missing nodes.", self.id);
            return false;
        }

        if !self.compute_volume() {
            return false;
        }

        let centroid = Vector::zeros();
        self.centroid_jacobian_det = self
            .shapefn
            .jacobian(&centroid, &self.nodal_coordinates)
            .determinant();
        self.centroid_gradients = self
            .shapefn
            .grad_shapefn_physical(&centroid, &self.nodal_coordinates);

        if self.centroid_gradients.is_none() {
            warn!("Cell {}: degenerate Jacobian at the centroid.", self.id);
        }

        self.is_initialised()
    }

    pub fn is_initialised(&self) -> bool {
        self.nodes.iter().all(Option::is_some)
            && self.volume.map(|v| v > DEFAULT_EPSILON).unwrap_or(false)
            && self.centroid_gradients.is_some()
    }

    pub fn volume(&self) -> Option<Real> {
        self.volume
    }

    fn corner(&self, local_id: usize) -> Vector<Real> {
        self.nodal_coordinates.row(local_id).transpose()
    }

    /// Checks that the corner and inhedron tables of the shape function only refer to
    /// nodes of this cell.
    fn index_tables_fit(&self) -> bool {
        let corners = self.shapefn.corner_indices().iter();
        let inhedron = self.shapefn.inhedron_indices().iter().flatten();

        match corners.chain(inhedron).find(|i| **i >= self.nnodes) {
            Some(i) => {
                error!(
                    "Cell {}: the {} index tables refer to node {}, but the cell has {} nodes.",
                    self.id,
                    self.shapefn.name(),
                    i,
                    self.nnodes
                );
                false
            }
            None => true,
        }
    }

    /// Computes the area of a quadrilateral from its sides and diagonals.
    #[cfg(feature = "dim2")]
    pub fn compute_volume(&mut self) -> bool {
        if !self.index_tables_fit() {
            return false;
        }

        let corners = self.shapefn.corner_indices();
        if corners.len() != 4 {
            error!(
                "Cell {}: expected 4 corners, the corner table has {}.",
                self.id,
                corners.len()
            );
            return false;
        }

        let x = [
            self.corner(corners[0]),
            self.corner(corners[1]),
            self.corner(corners[2]),
            self.corner(corners[3]),
        ];

        let a = (x[1] - x[0]).norm_squared();
        let b = (x[2] - x[1]).norm_squared();
        let c = (x[3] - x[2]).norm_squared();
        let d = (x[0] - x[3]).norm_squared();
        let p = (x[2] - x[0]).norm_squared();
        let q = (x[3] - x[1]).norm_squared();
        let k = a + c - b - d;

        self.volume = Some(0.25 * (4.0 * p * q - k * k).max(0.0).sqrt());
        true
    }

    /// Computes the volume of a trilinear hexahedron as a sum of tetrahedra triple
    /// products (Davies & Salmond, AIAA J. 23(6), 1985).
    #[cfg(feature = "dim3")]
    pub fn compute_volume(&mut self) -> bool {
        if !self.index_tables_fit() {
            return false;
        }

        let corners = self.shapefn.corner_indices();
        if corners.len() != 8 {
            error!(
                "Cell {}: expected 8 corners, the corner table has {}.",
                self.id,
                corners.len()
            );
            return false;
        }

        let a = self.corner(corners[7]);
        let b = self.corner(corners[6]);
        let c = self.corner(corners[2]);
        let d = self.corner(corners[3]);
        let e = self.corner(corners[4]);
        let f = self.corner(corners[5]);
        let g = self.corner(corners[1]);
        let h = self.corner(corners[0]);

        let bdca = (b - d).cross(&(c - a));
        let ebfa = (e - b).cross(&(f - a));
        let deha = (d - e).cross(&(h - a));

        let volume = ((a - g).dot(&(bdca + ebfa + deha))
            + (b - g).dot(&bdca)
            + (e - g).dot(&ebfa)
            + (d - g).dot(&deha))
            / 12.0;

        self.volume = Some(volume.abs());
        true
    }

    #[cfg(feature = "dim2")]
    fn simplex_volume(&self, point: &Vector<Real>, simplex: &[usize; DIM]) -> Real {
        let a = self.corner(simplex[0]) - point;
        let b = self.corner(simplex[1]) - point;
        0.5 * a.perp(&b).abs()
    }

    #[cfg(feature = "dim3")]
    fn simplex_volume(&self, point: &Vector<Real>, simplex: &[usize; DIM]) -> Real {
        let a = self.corner(simplex[0]) - point;
        let b = self.corner(simplex[1]) - point;
        let c = self.corner(simplex[2]) - point;
        a.dot(&b.cross(&c)).abs() / 6.0
    }

    /// Checks whether `point` lies in the cell by splitting the cell into simplices
    /// sharing `point` as a vertex: their volumes add up to the cell volume only if the
    /// point is inside.
    pub fn point_in_cell(&self, point: &Point<Real>) -> bool {
        let volume = match self.volume {
            Some(volume) => volume,
            None => return false,
        };

        let mut sum = 0.0;
        for simplex in self.shapefn.inhedron_indices() {
            sum += self.simplex_volume(&point.coords, simplex);
            if sum > volume + DEFAULT_EPSILON {
                return false;
            }
        }

        (sum - volume).abs() <= DEFAULT_EPSILON
    }

    /// Maps `point` to the reference element with Newton iterations.
    ///
    /// Converges in one iteration for affine cells. Returns `None` if the Jacobian becomes
    /// singular or the iterations do not converge.
    pub fn transform_real_to_unit_cell(&self, point: &Point<Real>) -> Option<Vector<Real>> {
        let mut xi = Vector::zeros();

        for _ in 0..MAX_INVERSE_MAPPING_ITERATIONS {
            let values = self.shapefn.shapefn(&xi);
            let mapped = self.interpolate_coordinates(&values);
            let jacobian: Matrix<Real> = self.shapefn.jacobian(&xi, &self.nodal_coordinates);
            let delta = jacobian.transpose().try_inverse()? * (point.coords - mapped);
            xi += delta;

            if delta.norm() < INVERSE_MAPPING_TOLERANCE {
                return Some(xi);
            }
        }

        warn!(
            "Cell {}: the inverse mapping of {} did not converge.",
            self.id, point
        );
        None
    }

    fn interpolate_coordinates(&self, values: &DVector<Real>) -> Vector<Real> {
        let n = self.nnodes.min(values.len());
        self.nodal_coordinates.rows(0, n).transpose() * values.rows(0, n)
    }

    /// The B-matrices of this cell at the reference location `xi`.
    pub fn bmatrix(&self, xi: &Vector<Real>) -> Option<Vec<BMatrix<Real>>> {
        self.shapefn
            .bmatrix_with_coordinates(xi, &self.nodal_coordinates)
            .map(|mut bmatrix| {
                bmatrix.truncate(self.nnodes);
                bmatrix
            })
    }

    /// `true` while at least one particle is located in this cell.
    pub fn status(&self) -> bool {
        !self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Index] {
        &self.particles
    }

    pub fn add_particle_id(&mut self, id: Index) -> bool {
        if self.particles.contains(&id) {
            false
        } else {
            self.particles.push(id);
            true
        }
    }

    pub fn remove_particle_id(&mut self, id: Index) -> bool {
        let len = self.particles.len();
        self.particles.retain(|p| *p != id);
        self.particles.len() != len
    }

    pub fn clear_particle_ids(&mut self) {
        self.particles.clear();
    }

    /*
     * Particle -> node scatter.
     */
    /// Runs `f` on every node with a non-zero weight at `xi`. Nodes with a zero weight,
    /// e.g. the far side of a cell when `xi` lies on a face, are left inactive.
    ///
    /// Returns `false` if any node rejected its update.
    fn scatter(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        mut f: impl FnMut(&mut Node, Real) -> bool,
    ) -> bool {
        let values = self.shapefn.shapefn(xi);
        let mut accepted = true;

        for (node_id, weight) in self.nodes().zip(values.iter()) {
            if *weight == 0.0 {
                continue;
            }

            if let Some(node) = nodes.get(node_id) {
                accepted &= f(&mut lock_node(node), *weight);
            }
        }

        if !accepted {
            warn!("Cell {}: a node rejected a particle contribution.", self.id);
        }

        accepted
    }

    fn to_dof(node: &Node, vector: &Vector<Real>) -> DVector<Real> {
        DVector::from_fn(node.dof(), |i, _| if i < DIM { vector[i] } else { 0.0 })
    }

    pub fn assign_mass_to_nodes(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        phase: usize,
        mass: Real,
    ) -> bool {
        self.scatter(nodes, xi, |node, weight| {
            node.assign_status(true);
            node.update_mass(true, phase, weight * mass)
        })
    }

    pub fn assign_momentum_to_nodes(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        phase: usize,
        mass: Real,
        velocity: &Vector<Real>,
    ) -> bool {
        let momentum = velocity * mass;
        self.scatter(nodes, xi, |node, weight| {
            let value = Self::to_dof(node, &(momentum * weight));
            node.update_momentum(true, phase, &value)
        })
    }

    pub fn assign_body_force_to_nodes(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        phase: usize,
        mass: Real,
        gravity: &Vector<Real>,
    ) -> bool {
        let force = gravity * mass;
        self.scatter(nodes, xi, |node, weight| {
            let value = Self::to_dof(node, &(force * weight));
            node.update_external_force(true, phase, &value)
        })
    }

    /// Adds `-volume * B_i^T * stress` to the internal force of every active node.
    pub fn assign_internal_force_to_nodes(
        &self,
        nodes: &NodeSet,
        bmatrix: &[BMatrix<Real>],
        phase: usize,
        volume: Real,
        stress: &VoigtVector<Real>,
    ) -> bool {
        let mut accepted = true;

        for (node_id, b) in self.nodes().zip(bmatrix.iter()) {
            if let Some(node) = nodes.get(node_id) {
                let mut node = lock_node(node);
                if node.status() {
                    let force: Vector<Real> = -(b.transpose() * stress) * volume;
                    let value = Self::to_dof(&node, &force);
                    accepted &= node.update_internal_force(true, phase, &value);
                }
            }
        }

        if !accepted {
            warn!("Cell {}: a node rejected an internal force.", self.id);
        }

        accepted
    }

    /*
     * Node -> particle gather.
     */
    fn gather(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        field: impl Fn(&Node) -> Vector<Real>,
    ) -> Vector<Real> {
        let values = self.shapefn.shapefn(xi);

        self.nodes()
            .zip(values.iter())
            .filter_map(|(node_id, weight)| {
                nodes
                    .get(node_id)
                    .map(|node| field(&lock_node(node)) * *weight)
            })
            .sum()
    }

    /// The velocity of `phase` interpolated at `xi`.
    pub fn interpolate_velocity(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        phase: usize,
    ) -> Vector<Real> {
        self.gather(nodes, xi, |node| spatial_part(&node.velocity(phase)))
    }

    pub fn interpolate_acceleration(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        phase: usize,
    ) -> Vector<Real> {
        self.gather(nodes, xi, |node| spatial_part(&node.acceleration(phase)))
    }

    /// The nodal velocities relative to the velocity interpolated at `xi` from the
    /// active nodes.
    ///
    /// Inactive nodes received no mass, so their velocity is unknown: they are taken to
    /// move with the interpolated velocity. Since the gradients of the shape functions
    /// sum to zero, this leaves the velocity gradient unchanged when every node is active.
    fn relative_velocities(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        phase: usize,
    ) -> Vec<Vector<Real>> {
        let velocities: Vec<Option<Vector<Real>>> = self
            .nodes()
            .map(|node_id| {
                nodes
                    .with_node(node_id, |node| {
                        Some(spatial_part(&node.velocity(phase))).filter(|_| node.status())
                    })
                    .flatten()
            })
            .collect();

        let values = self.shapefn.shapefn(xi);
        let mut weight = 0.0;
        let mut reference = Vector::zeros();

        for (velocity, value) in velocities.iter().zip(values.iter()) {
            if let Some(velocity) = velocity {
                weight += *value;
                reference += velocity * *value;
            }
        }

        if weight > 0.0 {
            reference /= weight;
        }

        velocities
            .into_iter()
            .map(|velocity| velocity.map_or_else(Vector::zeros, |v| v - reference))
            .collect()
    }

    /// The Voigt strain rate `sum_i B_i v_i` at the reference location `xi`.
    pub fn compute_strain_rate(
        &self,
        nodes: &NodeSet,
        xi: &Vector<Real>,
        bmatrix: &[BMatrix<Real>],
        phase: usize,
    ) -> VoigtVector<Real> {
        self.relative_velocities(nodes, xi, phase)
            .iter()
            .zip(bmatrix.iter())
            .map(|(velocity, b)| b * velocity)
            .sum()
    }

    /// The rate of change of the Jacobian determinant at the centroid: `det(J) * div(v)`.
    pub fn jacobian_rate_at_centroid(&self, nodes: &NodeSet, phase: usize) -> Real {
        let gradients = match &self.centroid_gradients {
            Some(gradients) => gradients,
            None => return 0.0,
        };

        let divergence: Real = self
            .relative_velocities(nodes, &Vector::zeros(), phase)
            .iter()
            .enumerate()
            .map(|(i, velocity)| gradients.row(i).transpose().dot(velocity))
            .sum();

        self.centroid_jacobian_det * divergence
    }
}

impl Identifiable for Cell {
    fn id(&self) -> Index {
        self.id
    }
}
