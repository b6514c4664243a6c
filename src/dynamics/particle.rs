use crate::core::dynamics::solver::VelocityUpdate;
use crate::core::dynamics::{PackedParticleHeader, PackedParticlePhase, NO_CELL};
use crate::dynamics::models::Material;
use crate::dynamics::{Identifiable, NodeSet};
use crate::geometry::Cell;
use crate::math::{BMatrix, Index, Point, Real, Vector, VoigtVector, DIM};
use na::DVector;
use std::sync::Arc;

/// The state of one phase carried by a particle.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ParticlePhase {
    pub mass: Real,
    pub stress: VoigtVector<Real>,
    pub strain: VoigtVector<Real>,
    pub strain_rate: VoigtVector<Real>,
    /// Strain increment of the last step.
    pub dstrain: VoigtVector<Real>,
    /// Change of the host cell Jacobian determinant over the last step.
    pub dvolumetric_strain: Real,
    pub velocity: Vector<Real>,
    pub momentum: Vector<Real>,
    pub acceleration: Vector<Real>,
}

impl Default for ParticlePhase {
    fn default() -> Self {
        Self {
            mass: 0.0,
            stress: VoigtVector::zeros(),
            strain: VoigtVector::zeros(),
            strain_rate: VoigtVector::zeros(),
            dstrain: VoigtVector::zeros(),
            dvolumetric_strain: 0.0,
            velocity: Vector::zeros(),
            momentum: Vector::zeros(),
            acceleration: Vector::zeros(),
        }
    }
}

impl ParticlePhase {
    fn pack(&self) -> PackedParticlePhase {
        PackedParticlePhase {
            mass: self.mass,
            dvolumetric_strain: self.dvolumetric_strain,
            stress: self.stress,
            strain: self.strain,
            strain_rate: self.strain_rate,
            dstrain: self.dstrain,
            velocity: self.velocity,
            momentum: self.momentum,
            acceleration: self.acceleration,
        }
    }

    fn unpack(packed: &PackedParticlePhase) -> Self {
        Self {
            mass: packed.mass,
            stress: packed.stress,
            strain: packed.strain,
            strain_rate: packed.strain_rate,
            dstrain: packed.dstrain,
            dvolumetric_strain: packed.dvolumetric_strain,
            velocity: packed.velocity,
            momentum: packed.momentum,
            acceleration: packed.acceleration,
        }
    }
}

/// A material point.
///
/// The particle refers to its host cell by id. Its reference location `xi`, and the shape
/// function values and B-matrices cached from it, are only meaningful while that cell
/// is current.
#[derive(Clone, Debug)]
pub struct Particle {
    id: Index,
    coordinates: Point<Real>,
    status: bool,
    cell: Option<Index>,
    xi: Vector<Real>,
    shapefn: DVector<Real>,
    bmatrix: Vec<BMatrix<Real>>,
    volume: Real,
    phases: Vec<ParticlePhase>,
    material: Option<Arc<dyn Material>>,
    material_id: Option<u32>,
}

impl Particle {
    pub fn new(id: Index, coordinates: Point<Real>, nphases: usize) -> Self {
        Self {
            id,
            coordinates,
            status: true,
            cell: None,
            xi: Vector::zeros(),
            shapefn: DVector::zeros(0),
            bmatrix: vec![],
            volume: 0.0,
            phases: vec![ParticlePhase::default(); nphases.max(1)],
            material: None,
            material_id: None,
        }
    }

    pub fn id(&self) -> Index {
        self.id
    }

    pub fn coordinates(&self) -> &Point<Real> {
        &self.coordinates
    }

    pub fn assign_coordinates(&mut self, coordinates: Point<Real>) {
        self.coordinates = coordinates;
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn assign_status(&mut self, status: bool) {
        self.status = status;
    }

    pub fn nphases(&self) -> usize {
        self.phases.len()
    }

    pub fn phase(&self, phase: usize) -> Option<&ParticlePhase> {
        self.phases.get(phase)
    }

    pub fn phase_mut(&mut self, phase: usize) -> Option<&mut ParticlePhase> {
        self.phases.get_mut(phase)
    }

    /// The id of the host cell.
    pub fn cell(&self) -> Option<Index> {
        self.cell
    }

    /// The location of the particle in the reference element of its host cell.
    pub fn reference_location(&self) -> &Vector<Real> {
        &self.xi
    }

    pub fn shapefn(&self) -> &DVector<Real> {
        &self.shapefn
    }

    pub fn bmatrix(&self) -> &[BMatrix<Real>] {
        &self.bmatrix
    }

    pub fn volume(&self) -> Real {
        self.volume
    }

    pub fn assign_volume(&mut self, volume: Real) -> bool {
        if volume <= 0.0 {
            warn!("Particle {}: invalid volume {}.", self.id, volume);
            return false;
        }

        self.volume = volume;
        true
    }

    pub fn material(&self) -> Option<&Arc<dyn Material>> {
        self.material.as_ref()
    }

    pub fn material_id(&self) -> Option<u32> {
        self.material_id
    }

    pub fn assign_material(&mut self, material: Arc<dyn Material>) -> bool {
        if !material.status() {
            warn!(
                "Particle {}: material {} has no properties.",
                self.id,
                material.id()
            );
            return false;
        }

        self.material_id = Some(material.id());
        self.material = Some(material);
        true
    }

    /*
     * Accessors of the per-phase state. An out-of-range phase reads as zero.
     */
    fn phase_or_default(&self, phase: usize) -> ParticlePhase {
        self.phases.get(phase).copied().unwrap_or_default()
    }

    pub fn mass(&self, phase: usize) -> Real {
        self.phase_or_default(phase).mass
    }

    pub fn stress(&self, phase: usize) -> VoigtVector<Real> {
        self.phase_or_default(phase).stress
    }

    pub fn strain(&self, phase: usize) -> VoigtVector<Real> {
        self.phase_or_default(phase).strain
    }

    pub fn strain_rate(&self, phase: usize) -> VoigtVector<Real> {
        self.phase_or_default(phase).strain_rate
    }

    pub fn dstrain(&self, phase: usize) -> VoigtVector<Real> {
        self.phase_or_default(phase).dstrain
    }

    pub fn dvolumetric_strain(&self, phase: usize) -> Real {
        self.phase_or_default(phase).dvolumetric_strain
    }

    pub fn velocity(&self, phase: usize) -> Vector<Real> {
        self.phase_or_default(phase).velocity
    }

    pub fn momentum(&self, phase: usize) -> Vector<Real> {
        self.phase_or_default(phase).momentum
    }

    pub fn acceleration(&self, phase: usize) -> Vector<Real> {
        self.phase_or_default(phase).acceleration
    }

    fn checked_vector(&self, phase: usize, value: &DVector<Real>, what: &str) -> Option<Vector<Real>> {
        if phase >= self.phases.len() || value.len() != DIM {
            warn!(
                "Particle {}: cannot assign a {} of dimension {} to phase {}.",
                self.id,
                what,
                value.len(),
                phase
            );
            return None;
        }

        Some(Vector::from_iterator(value.iter().copied()))
    }

    pub fn assign_velocity(&mut self, phase: usize, velocity: &DVector<Real>) -> bool {
        match self.checked_vector(phase, velocity, "velocity") {
            Some(velocity) => {
                self.phases[phase].velocity = velocity;
                true
            }
            None => false,
        }
    }

    pub fn assign_momentum(&mut self, phase: usize, momentum: &DVector<Real>) -> bool {
        match self.checked_vector(phase, momentum, "momentum") {
            Some(momentum) => {
                self.phases[phase].momentum = momentum;
                true
            }
            None => false,
        }
    }

    pub fn assign_acceleration(&mut self, phase: usize, acceleration: &DVector<Real>) -> bool {
        match self.checked_vector(phase, acceleration, "acceleration") {
            Some(acceleration) => {
                self.phases[phase].acceleration = acceleration;
                true
            }
            None => false,
        }
    }

    /// Assigns a stress given by its 6 Voigt components.
    pub fn assign_stress(&mut self, phase: usize, stress: &DVector<Real>) -> bool {
        if phase >= self.phases.len() || stress.len() != 6 {
            warn!(
                "Particle {}: cannot assign a stress of dimension {} to phase {}.",
                self.id,
                stress.len(),
                phase
            );
            return false;
        }

        self.phases[phase].stress = VoigtVector::from_iterator(stress.iter().copied());
        true
    }

    /// Sets the mass of `phase` from the particle volume and the material density.
    pub fn compute_mass(&mut self, phase: usize) -> bool {
        let density = match &self.material {
            Some(material) if material.status() => material.density(),
            _ => {
                warn!("Particle {}: cannot compute the mass without material.", self.id);
                return false;
            }
        };

        if self.volume <= 0.0 || phase >= self.phases.len() {
            warn!("Particle {}: cannot compute the mass of phase {}.", self.id, phase);
            return false;
        }

        self.phases[phase].mass = self.volume * density;
        true
    }

    /*
     * Host cell.
     */
    /// Locates this particle in `cell`.
    ///
    /// The cell must be initialised and contain the particle. On success, the particle is
    /// registered in the cell and its reference location and shape functions are computed.
    pub fn assign_cell(&mut self, cell: &mut Cell) -> bool {
        if let Some(current) = self.cell {
            if current != cell.id() {
                warn!(
                    "Particle {}: already in cell {}, cannot move it to cell {}.",
                    self.id,
                    current,
                    cell.id()
                );
                return false;
            }
        }

        if !cell.is_initialised() || !cell.point_in_cell(&self.coordinates) {
            return false;
        }

        let xi = match cell.transform_real_to_unit_cell(&self.coordinates) {
            Some(xi) => xi,
            None => return false,
        };

        self.cell = Some(cell.id());
        self.xi = xi;
        cell.add_particle_id(self.id);
        self.compute_shapefn(cell)
    }

    /// Unregisters this particle from its host `cell`.
    pub fn remove_cell(&mut self, cell: &mut Cell) -> bool {
        if self.cell != Some(cell.id()) {
            return false;
        }

        cell.remove_particle_id(self.id);
        self.clear_cell();
        true
    }

    pub(crate) fn clear_cell(&mut self) {
        self.cell = None;
        self.xi = Vector::zeros();
        self.shapefn = DVector::zeros(0);
        self.bmatrix.clear();
    }

    fn is_hosted_by(&self, cell: &Cell) -> bool {
        if self.cell == Some(cell.id()) {
            true
        } else {
            warn!(
                "Particle {}: cell {} is not the host cell ({:?}).",
                self.id,
                cell.id(),
                self.cell
            );
            false
        }
    }

    /// Recomputes the reference location in the host cell.
    pub fn compute_reference_location(&mut self, cell: &Cell) -> bool {
        if !self.is_hosted_by(cell) {
            return false;
        }

        match cell.transform_real_to_unit_cell(&self.coordinates) {
            Some(xi) => {
                self.xi = xi;
                true
            }
            None => false,
        }
    }

    /// Caches the shape functions and B-matrices of the host cell at the reference location.
    pub fn compute_shapefn(&mut self, cell: &Cell) -> bool {
        if !self.is_hosted_by(cell) {
            return false;
        }

        match cell.bmatrix(&self.xi) {
            Some(bmatrix) => {
                let values = cell.shapefn().shapefn(&self.xi);
                self.shapefn = values.rows(0, cell.nnodes().min(values.len())).into_owned();
                self.bmatrix = bmatrix;
                true
            }
            None => {
                warn!(
                    "Particle {}: degenerate Jacobian in cell {}.",
                    self.id,
                    cell.id()
                );
                false
            }
        }
    }

    /*
     * Particle -> node.
     */
    pub fn map_mass_momentum_to_nodes(&self, cell: &Cell, nodes: &NodeSet, phase: usize) -> bool {
        if !self.is_hosted_by(cell) || phase >= self.phases.len() {
            return false;
        }

        let data = &self.phases[phase];
        cell.assign_mass_to_nodes(nodes, &self.xi, phase, data.mass)
            && cell.assign_momentum_to_nodes(nodes, &self.xi, phase, data.mass, &data.velocity)
    }

    pub fn map_body_force(
        &self,
        cell: &Cell,
        nodes: &NodeSet,
        phase: usize,
        gravity: &Vector<Real>,
    ) -> bool {
        if !self.is_hosted_by(cell) || phase >= self.phases.len() {
            return false;
        }

        cell.assign_body_force_to_nodes(nodes, &self.xi, phase, self.phases[phase].mass, gravity)
    }

    pub fn map_internal_force(&self, cell: &Cell, nodes: &NodeSet, phase: usize) -> bool {
        if !self.is_hosted_by(cell) || phase >= self.phases.len() {
            return false;
        }

        cell.assign_internal_force_to_nodes(
            nodes,
            &self.bmatrix,
            phase,
            self.volume,
            &self.phases[phase].stress,
        )
    }

    /*
     * Node -> particle.
     */
    /// Computes the strain rate and the strain increment `dstrain = B v dt` from the
    /// nodal velocities, along with the host cell Jacobian increment.
    pub fn compute_strain(&mut self, cell: &Cell, nodes: &NodeSet, phase: usize, dt: Real) -> bool {
        if !self.is_hosted_by(cell) || phase >= self.phases.len() {
            return false;
        }

        let strain_rate = cell.compute_strain_rate(nodes, &self.xi, &self.bmatrix, phase);
        let dvolumetric_strain = dt * cell.jacobian_rate_at_centroid(nodes, phase);

        let data = &mut self.phases[phase];
        data.strain_rate = strain_rate;
        data.dstrain = strain_rate * dt;
        data.strain += data.dstrain;
        data.dvolumetric_strain = dvolumetric_strain;
        true
    }

    /// Updates the stress of `phase` with the particle material.
    pub fn compute_stress(&mut self, phase: usize) -> bool {
        let material = match &self.material {
            Some(material) => material.clone(),
            None => {
                warn!("Particle {}: cannot compute the stress without material.", self.id);
                return false;
            }
        };

        if phase >= self.phases.len() {
            return false;
        }

        let data = self.phases[phase];
        let stress = material.compute_stress(&data.stress, &data.dstrain, self, phase);
        self.phases[phase].stress = stress;
        true
    }

    /// Updates the velocity and advects the particle with the nodal velocities.
    pub fn compute_updated_position(
        &mut self,
        cell: &Cell,
        nodes: &NodeSet,
        phase: usize,
        dt: Real,
        velocity_update: VelocityUpdate,
    ) -> bool {
        if !self.is_hosted_by(cell) || phase >= self.phases.len() {
            return false;
        }

        let nodal_velocity = cell.interpolate_velocity(nodes, &self.xi, phase);
        let acceleration = cell.interpolate_acceleration(nodes, &self.xi, phase);

        let data = &mut self.phases[phase];
        data.acceleration = acceleration;
        data.velocity = match velocity_update {
            VelocityUpdate::Flip => data.velocity + acceleration * dt,
            VelocityUpdate::Pic => nodal_velocity,
        };
        data.momentum = data.velocity * data.mass;

        self.coordinates += nodal_velocity * dt;
        true
    }

    /*
     * Serialization.
     */
    /// Packs the particle into a self-contained byte buffer.
    ///
    /// The material is recorded by id. Shape functions are not stored and must be
    /// recomputed after unpacking.
    pub fn pack(&self) -> Vec<u8> {
        let header = PackedParticleHeader {
            id: self.id,
            cell: self.cell.unwrap_or(NO_CELL),
            nphases: self.phases.len() as u32,
            status: self.status as u32,
            material: self.material_id.unwrap_or(0),
            has_material: self.material_id.is_some() as u32,
            volume: self.volume,
            coordinates: self.coordinates,
            xi: self.xi,
        };

        let mut buffer = Vec::with_capacity(header.packed_size());
        buffer.extend_from_slice(bytemuck::bytes_of(&header));

        for phase in &self.phases {
            buffer.extend_from_slice(bytemuck::bytes_of(&phase.pack()));
        }

        buffer
    }

    /// Restores the state packed in `buffer`.
    ///
    /// Fails, leaving the particle untouched, if the buffer is truncated or has trailing
    /// bytes. The material handle is dropped: it has to be reassigned from the restored
    /// material id.
    pub fn unpack(&mut self, buffer: &[u8]) -> bool {
        if buffer.len() < PackedParticleHeader::SIZE {
            warn!("Particle buffer too short ({} bytes).", buffer.len());
            return false;
        }

        let header: PackedParticleHeader =
            bytemuck::pod_read_unaligned(&buffer[..PackedParticleHeader::SIZE]);

        if header.nphases == 0 || buffer.len() != header.packed_size() {
            warn!(
                "Particle {}: buffer of {} bytes, expected {}.",
                header.id,
                buffer.len(),
                header.packed_size()
            );
            return false;
        }

        self.phases = buffer[PackedParticleHeader::SIZE..]
            .chunks_exact(PackedParticlePhase::SIZE)
            .map(|bytes| ParticlePhase::unpack(&bytemuck::pod_read_unaligned(bytes)))
            .collect();

        self.id = header.id;
        self.cell = (header.cell != NO_CELL).then_some(header.cell);
        self.status = header.status != 0;
        self.material_id = (header.has_material != 0).then_some(header.material);
        self.material = None;
        self.volume = header.volume;
        self.coordinates = header.coordinates;
        self.xi = header.xi;
        self.shapefn = DVector::zeros(0);
        self.bmatrix.clear();
        true
    }
}

impl Identifiable for Particle {
    fn id(&self) -> Index {
        self.id
    }
}

#[cfg(test)]
mod test {
    use super::Particle;
    use crate::math::{Point, DIM};
    use na::DVector;

    #[test]
    fn checked_setters() {
        let mut particle = Particle::new(0, Point::origin(), 1);

        assert!(!particle.assign_velocity(0, &DVector::from_element(DIM + 1, 1.0)));
        assert!(!particle.assign_momentum(0, &DVector::from_element(DIM - 1, 1.0)));
        assert!(!particle.assign_acceleration(1, &DVector::from_element(DIM, 1.0)));
        assert!(!particle.assign_stress(0, &DVector::from_element(3, 1.0)));
        assert_eq!(particle.velocity(0).norm(), 0.0);

        assert!(particle.assign_velocity(0, &DVector::from_element(DIM, 2.0)));
        assert!(particle.assign_stress(0, &DVector::from_element(6, -1.0)));
        assert_eq!(particle.velocity(0)[DIM - 1], 2.0);
        assert_eq!(particle.stress(0)[5], -1.0);
    }

    #[test]
    fn mass_requires_a_material() {
        let mut particle = Particle::new(0, Point::origin(), 1);
        assert!(!particle.assign_volume(0.0));
        assert!(particle.assign_volume(2.0));
        assert!(!particle.compute_mass(0));
        assert_eq!(particle.mass(0), 0.0);
    }

    #[test]
    fn pack_unpack() {
        let mut coordinates = Point::origin();
        coordinates[0] = 1.25;
        coordinates[DIM - 1] = -3.5e-7;

        let mut particle = Particle::new(42, coordinates, 2);
        particle.assign_volume(0.125);
        particle.assign_velocity(1, &DVector::from_element(DIM, 0.1));
        particle.assign_stress(0, &DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        particle.phase_mut(1).unwrap().dvolumetric_strain = -2.5e-3;

        let buffer = particle.pack();

        let mut restored = Particle::new(0, Point::origin(), 1);
        assert!(restored.unpack(&buffer));
        assert_eq!(restored.id(), 42);
        assert_eq!(restored.coordinates(), &coordinates);
        assert_eq!(restored.nphases(), 2);
        assert_eq!(restored.volume(), 0.125);
        assert_eq!(restored.cell(), None);
        assert_eq!(restored.phase(0), particle.phase(0));
        assert_eq!(restored.phase(1), particle.phase(1));
        assert_eq!(restored.pack(), buffer);
    }

    #[test]
    fn unpack_rejects_malformed_buffers() {
        let buffer = Particle::new(7, Point::origin(), 1).pack();
        let mut particle = Particle::new(0, Point::origin(), 1);

        assert!(!particle.unpack(&buffer[..buffer.len() - 1]));
        assert!(!particle.unpack(&buffer[..10]));

        let mut longer = buffer.clone();
        longer.push(0);
        assert!(!particle.unpack(&longer));
        assert_eq!(particle.id(), 0);
    }

    #[cfg(feature = "dim2")]
    #[test]
    fn assign_cell() {
        use crate::core::geometry::ShapeFn;
        use crate::geometry::cell::test::build_cell;
        use na::{point, vector};

        let (mut cell, _) = build_cell(
            10,
            ShapeFn::Quadrilateral4,
            &[
                point![0.5, 0.5],
                point![1.5, 0.5],
                point![1.5, 1.5],
                point![0.5, 1.5],
            ],
        );

        let mut outside = Particle::new(1, point![2.0, 0.75], 1);
        assert!(!outside.assign_cell(&mut cell));
        assert!(!cell.status());

        let mut particle = Particle::new(0, point![0.75, 0.75], 1);
        assert!(particle.assign_cell(&mut cell));
        assert_eq!(particle.cell(), Some(10));
        assert!(cell.status());
        assert_eq!(cell.particles(), &[0]);
        assert!((particle.reference_location() - vector![-0.5, -0.5]).norm() < 1.0e-12);
        assert!((particle.shapefn()[0] - 0.5625).abs() < 1.0e-12);
        assert_eq!(particle.bmatrix().len(), 4);

        assert!(particle.remove_cell(&mut cell));
        assert_eq!(particle.cell(), None);
        assert!(!cell.status());
    }

    #[cfg(feature = "dim3")]
    #[test]
    fn assign_cell() {
        use crate::core::geometry::ShapeFn;
        use crate::geometry::cell::test::build_cell;
        use na::{point, vector};

        let (mut cell, _) = build_cell(
            3,
            ShapeFn::Hexahedron8,
            &[
                point![0.0, 0.0, 0.0],
                point![2.0, 0.0, 0.0],
                point![2.0, 2.0, 0.0],
                point![0.0, 2.0, 0.0],
                point![0.0, 0.0, 2.0],
                point![2.0, 0.0, 2.0],
                point![2.0, 2.0, 2.0],
                point![0.0, 2.0, 2.0],
            ],
        );

        let mut particle = Particle::new(5, point![1.5, 1.5, 1.5], 1);
        assert!(particle.assign_cell(&mut cell));
        assert_eq!(particle.cell(), Some(3));
        assert!(cell.status());
        assert!((particle.reference_location() - vector![0.5, 0.5, 0.5]).norm() < 1.0e-12);
        // The node at (2, 2, 2).
        assert!((particle.shapefn()[6] - 0.421875).abs() < 1.0e-12);
    }
}
