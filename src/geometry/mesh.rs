use crate::dynamics::models::Material;
use crate::dynamics::{lock_node, Handler, Node, NodeSet, Particle};
use crate::geometry::{Cell, ShapeFn};
use crate::math::{Index, Point, Real, DIM};
use anyhow::{anyhow, bail, ensure, Context};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The background grid together with the particles moving through it.
pub struct Mesh {
    pub nodes: NodeSet,
    pub cells: Handler<Cell>,
    pub particles: Handler<Particle>,
    pub materials: BTreeMap<u32, Arc<dyn Material>>,
    nphases: usize,
}

impl Mesh {
    pub fn new(nphases: usize) -> Self {
        Self {
            nodes: NodeSet::new(),
            cells: Handler::new(),
            particles: Handler::new(),
            materials: BTreeMap::new(),
            nphases: nphases.max(1),
        }
    }

    pub fn nphases(&self) -> usize {
        self.nphases
    }

    pub fn add_node(&mut self, id: Index, coordinates: Point<Real>) -> anyhow::Result<()> {
        ensure!(
            self.nodes
                .insert_node(Node::new(id, coordinates, DIM, self.nphases)),
            "duplicate node id {}",
            id
        );
        Ok(())
    }

    /// Adds a cell connecting `node_ids`, given in the local order of `shapefn`.
    pub fn add_cell(&mut self, id: Index, shapefn: ShapeFn, node_ids: &[Index]) -> anyhow::Result<()> {
        ensure!(!self.cells.contains(id), "duplicate cell id {}", id);

        let mut cell = Cell::new(id, node_ids.len(), shapefn)?;

        for (local_id, node_id) in node_ids.iter().enumerate() {
            let node = self
                .nodes
                .get(*node_id)
                .ok_or_else(|| anyhow!("cell {}: unknown node {}", id, node_id))?;

            ensure!(
                cell.add_node(local_id, &lock_node(node)),
                "cell {}: cannot add node {} at {}",
                id,
                node_id,
                local_id
            );
        }

        ensure!(cell.initialise(), "cell {}: degenerate geometry", id);
        self.cells.push(cell);
        Ok(())
    }

    pub fn add_material(&mut self, material: Box<dyn Material>) -> anyhow::Result<()> {
        ensure!(
            material.status(),
            "material {} has no properties",
            material.id()
        );
        ensure!(
            !self.materials.contains_key(&material.id()),
            "duplicate material id {}",
            material.id()
        );

        self.materials.insert(material.id(), Arc::from(material));
        Ok(())
    }

    /// Adds a particle and computes its mass for every phase.
    ///
    /// The particle is not located: call `locate_particles` once all particles are added.
    pub fn add_particle(
        &mut self,
        id: Index,
        coordinates: Point<Real>,
        volume: Real,
        material: u32,
    ) -> anyhow::Result<()> {
        ensure!(!self.particles.contains(id), "duplicate particle id {}", id);

        let material = self
            .materials
            .get(&material)
            .cloned()
            .ok_or_else(|| anyhow!("particle {}: unknown material {}", id, material))?;

        let mut particle = Particle::new(id, coordinates, self.nphases);
        ensure!(
            particle.assign_volume(volume),
            "particle {}: invalid volume {}",
            id,
            volume
        );
        particle.assign_material(material);

        for phase in 0..self.nphases {
            particle.compute_mass(phase);
        }

        self.particles.push(particle);
        Ok(())
    }

    /// Registers as neighbours every pair of cells sharing at least one node.
    pub fn find_cell_neighbours(&mut self) -> anyhow::Result<()> {
        let mut node_to_cells: BTreeMap<Index, Vec<Index>> = BTreeMap::new();

        for cell in &self.cells {
            for node_id in cell.nodes() {
                node_to_cells.entry(node_id).or_default().push(cell.id());
            }
        }

        for cell in self.cells.iter_mut() {
            let neighbours: BTreeSet<Index> = cell
                .nodes()
                .filter_map(|node_id| node_to_cells.get(&node_id))
                .flatten()
                .copied()
                .filter(|neighbour| *neighbour != cell.id())
                .collect();

            for (local_id, neighbour) in neighbours.into_iter().enumerate() {
                cell.add_neighbour(local_id, neighbour)?;
            }
        }

        Ok(())
    }

    fn find_host_cell(&self, particle: &Particle) -> Option<Index> {
        let point = particle.coordinates();
        let current = particle.cell().and_then(|id| self.cells.get(id));

        if let Some(cell) = current {
            if cell.point_in_cell(point) {
                return Some(cell.id());
            }

            // Particles move by less than a cell per step: search next door first.
            for neighbour in cell.neighbours().values() {
                if let Some(neighbour) = self.cells.get(*neighbour) {
                    if neighbour.point_in_cell(point) {
                        return Some(neighbour.id());
                    }
                }
            }
        }

        self.cells
            .iter()
            .find(|cell| cell.point_in_cell(point))
            .map(|cell| cell.id())
    }

    /// Finds the host cell of every particle, and updates their reference locations and
    /// shape functions.
    ///
    /// Returns the ids of the particles found outside of the mesh. These are deactivated.
    pub fn locate_particles(&mut self) -> Vec<Index> {
        let hosts: Vec<(Index, Option<Index>)> = self
            .particles
            .par_iter()
            .map(|particle| (particle.id(), self.find_host_cell(particle)))
            .collect();

        let mut outside = vec![];

        for (particle_id, host) in hosts {
            let particle = match self.particles.get_mut(particle_id) {
                Some(particle) => particle,
                None => continue,
            };

            if particle.cell().is_some() && particle.cell() == host {
                if let Some(cell) = host.and_then(|id| self.cells.get(id)) {
                    if particle.compute_reference_location(cell) {
                        particle.compute_shapefn(cell);
                    }
                }
                continue;
            }

            if let Some(previous) = particle.cell() {
                match self.cells.get_mut(previous) {
                    Some(cell) => {
                        particle.remove_cell(cell);
                    }
                    None => particle.clear_cell(),
                }
            }

            let assigned = match host.and_then(|id| self.cells.get_mut(id)) {
                Some(cell) => particle.assign_cell(cell),
                None => false,
            };

            if assigned {
                particle.assign_status(true);
            } else {
                warn!(
                    "Particle {} at {} is outside of the mesh.",
                    particle_id,
                    particle.coordinates()
                );
                particle.assign_status(false);
                outside.push(particle_id);
            }
        }

        outside
    }

    /// Packs every particle.
    pub fn checkpoint_particles(&self) -> Vec<Vec<u8>> {
        self.particles.iter().map(Particle::pack).collect()
    }

    /// Replaces every particle by the ones packed in `buffers`, then locates them.
    pub fn resume_particles(&mut self, buffers: &[Vec<u8>]) -> anyhow::Result<()> {
        let mut particles = Handler::new();

        for (i, buffer) in buffers.iter().enumerate() {
            let mut particle = Particle::new(0, Point::origin(), self.nphases);
            if !particle.unpack(buffer) {
                bail!("malformed particle buffer {}", i);
            }

            if let Some(material_id) = particle.material_id() {
                let material = self.materials.get(&material_id).cloned().with_context(|| {
                    format!("particle {}: unknown material {}", particle.id(), material_id)
                })?;
                particle.assign_material(material);
            }

            particle.clear_cell();
            ensure!(
                particles.push(particle),
                "duplicate particle id in buffer {}",
                i
            );
        }

        self.cells.for_each(Cell::clear_particle_ids);
        self.particles = particles;
        self.locate_particles();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::Mesh;
    use crate::core::dynamics::models::MaterialProperties;
    use crate::dynamics::models::create_material;
    use crate::math::{Index, Point, Real, DIM};

    pub(crate) fn bingham_properties() -> MaterialProperties {
        MaterialProperties::from([
            ("density", 1000.0),
            ("youngs_modulus", 1.0e7),
            ("poisson_ratio", 0.3),
            ("tau0", 771.8),
            ("mu", 0.0451),
            ("critical_shear_rate", 0.2),
        ])
    }

    /// A regular grid of `n` unit cells along x, one cell thick along the other axes.
    pub(crate) fn strip(n: usize) -> Mesh {
        let mut mesh = Mesh::new(1);
        let mut material = create_material(&format!("LinearElastic{}D", DIM), 0).unwrap();
        material
            .properties(&MaterialProperties::from([
                ("density", 1000.0),
                ("youngs_modulus", 1.0e6),
                ("poisson_ratio", 0.25),
            ]))
            .unwrap();
        mesh.add_material(material).unwrap();

        let layers = 1 << (DIM - 1);
        let nodes_per_column = layers as Index;

        for i in 0..=n {
            for k in 0..layers {
                let mut point = Point::origin();
                point[0] = i as Real;
                for d in 1..DIM {
                    point[d] = ((k >> (d - 1)) & 1) as Real;
                }
                mesh.add_node(i as Index * nodes_per_column + k as Index, point)
                    .unwrap();
            }
        }

        for i in 0..n {
            let a = i as Index * nodes_per_column;
            let b = a + nodes_per_column;
            #[cfg(feature = "dim2")]
            let (shapefn, nodes) = (crate::geometry::ShapeFn::Quadrilateral4, vec![a, b, b + 1, a + 1]);
            #[cfg(feature = "dim3")]
            let (shapefn, nodes) = (
                crate::geometry::ShapeFn::Hexahedron8,
                vec![a, b, b + 1, a + 1, a + 2, b + 2, b + 3, a + 3],
            );
            mesh.add_cell(i as Index, shapefn, &nodes).unwrap();
        }

        mesh.find_cell_neighbours().unwrap();
        mesh
    }

    fn point_at(x: Real) -> Point<Real> {
        let mut point = Point::origin();
        point[0] = x;
        for d in 1..DIM {
            point[d] = 0.5;
        }
        point
    }

    #[test]
    fn assembly_errors() {
        let mut mesh = strip(2);
        assert!(mesh.add_node(0, Point::origin()).is_err());
        assert!(mesh.add_cell(0, crate::geometry::ShapeFn::ALL[0], &[0, 1, 2, 3]).is_err());
        assert!(mesh.add_cell(9, crate::geometry::ShapeFn::ALL[0], &[100, 1, 2, 3]).is_err());
        assert!(mesh.add_particle(0, point_at(0.5), 1.0, 7).is_err());
        assert!(mesh.add_particle(0, point_at(0.5), -1.0, 0).is_err());

        let simplex: Vec<Index> = (0..=DIM as Index).collect();
        assert!(mesh.add_cell(9, crate::geometry::ShapeFn::ALL[0], &simplex).is_err());
        assert!(!mesh.cells.contains(9));

        let unassigned = create_material(&format!("Bingham{}D", DIM), 1).unwrap();
        assert!(mesh.add_material(unassigned).is_err());

        let mut bingham = create_material(&format!("Bingham{}D", DIM), 1).unwrap();
        bingham.properties(&bingham_properties()).unwrap();
        assert!(mesh.add_material(bingham).is_ok());
    }

    #[test]
    fn neighbours() {
        let mesh = strip(3);
        let neighbours = |id: Index| -> Vec<Index> {
            mesh.cells.get(id).unwrap().neighbours().values().copied().collect()
        };

        assert_eq!(neighbours(0), vec![1]);
        assert_eq!(neighbours(1), vec![0, 2]);
        assert_eq!(neighbours(2), vec![1]);
    }

    #[test]
    fn locate() {
        let mut mesh = strip(3);
        mesh.add_particle(0, point_at(0.5), 0.25, 0).unwrap();
        mesh.add_particle(1, point_at(2.25), 0.25, 0).unwrap();
        mesh.add_particle(2, point_at(7.0), 0.25, 0).unwrap();

        assert_eq!(mesh.locate_particles(), vec![2]);
        assert_eq!(mesh.particles.get(0).unwrap().cell(), Some(0));
        assert_eq!(mesh.particles.get(1).unwrap().cell(), Some(2));
        assert!(!mesh.particles.get(2).unwrap().status());
        assert!((mesh.particles.get(0).unwrap().mass(0) - 250.0).abs() < 1.0e-12);

        // Move a particle to the next cell.
        mesh.particles
            .get_mut(0)
            .unwrap()
            .assign_coordinates(point_at(1.5));
        assert_eq!(mesh.locate_particles(), vec![2]);
        assert_eq!(mesh.particles.get(0).unwrap().cell(), Some(1));
        assert!(!mesh.cells.get(0).unwrap().status());
        assert_eq!(mesh.cells.get(1).unwrap().particles(), &[0]);
    }

    #[test]
    fn checkpoint_and_resume() {
        let mut mesh = strip(2);
        mesh.add_particle(3, point_at(0.5), 0.25, 0).unwrap();
        mesh.add_particle(4, point_at(1.75), 0.25, 0).unwrap();
        mesh.locate_particles();

        let checkpoint = mesh.checkpoint_particles();

        mesh.particles
            .get_mut(3)
            .unwrap()
            .assign_coordinates(point_at(1.25));
        mesh.locate_particles();

        mesh.resume_particles(&checkpoint).unwrap();
        let particle = mesh.particles.get(3).unwrap();
        assert_eq!(particle.coordinates(), &point_at(0.5));
        assert_eq!(particle.cell(), Some(0));
        assert!(particle.material().is_some());
        assert_eq!(mesh.cells.get(0).unwrap().particles(), &[3]);
        assert_eq!(mesh.cells.get(1).unwrap().particles(), &[4]);

        assert!(mesh.resume_particles(&[vec![0; 3]]).is_err());
    }
}
