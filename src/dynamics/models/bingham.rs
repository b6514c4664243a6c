use crate::core::dynamics::models::{BinghamViscoplasticity, MaterialKind, MaterialProperties};
use crate::dynamics::models::Material;
use crate::dynamics::Particle;
use crate::math::{Real, VoigtVector};
use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Bingham {
    id: u32,
    properties: MaterialProperties,
    model: Option<BinghamViscoplasticity>,
}

impl Bingham {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            properties: MaterialProperties::new(),
            model: None,
        }
    }

    pub fn model(&self) -> Option<&BinghamViscoplasticity> {
        self.model.as_ref()
    }
}

impl Material for Bingham {
    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> MaterialKind {
        MaterialKind::Bingham
    }

    fn properties(&mut self, properties: &MaterialProperties) -> anyhow::Result<()> {
        let model = BinghamViscoplasticity::from_properties(properties)
            .with_context(|| format!("invalid properties for material {}", self.id))?;
        self.model = Some(model);
        self.properties = properties.clone();
        Ok(())
    }

    fn status(&self) -> bool {
        self.model.is_some()
    }

    fn property(&self, key: &str) -> Real {
        match (&self.model, key) {
            (Some(model), "bulk_modulus") => model.bulk_modulus,
            _ => self.properties.get(key).unwrap_or(Real::MAX),
        }
    }

    fn compute_stress(
        &self,
        stress: &VoigtVector<Real>,
        _dstrain: &VoigtVector<Real>,
        particle: &Particle,
        phase: usize,
    ) -> VoigtVector<Real> {
        match &self.model {
            Some(model) => model.compute_stress(
                stress,
                &particle.strain_rate(phase),
                particle.dvolumetric_strain(phase),
            ),
            None => *stress,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Bingham;
    use crate::dynamics::models::{Material, MaterialProperties};
    use crate::dynamics::{NodeSet, Particle};
    use crate::geometry::Cell;
    use crate::math::{Point, Real, VoigtVector};

    fn bingham() -> Bingham {
        let mut material = Bingham::new(0);
        material
            .properties(&MaterialProperties::from([
                ("density", 1000.0),
                ("youngs_modulus", 1.0e7),
                ("poisson_ratio", 0.3),
                ("tau0", 771.8),
                ("mu", 0.0451),
                ("critical_shear_rate", 0.2),
            ]))
            .unwrap();
        material
    }

    fn assert_relative_eq(a: &VoigtVector<Real>, b: &VoigtVector<Real>) {
        for i in 0..6 {
            let scale = b[i].abs().max(1.0);
            assert!((a[i] - b[i]).abs() <= 1.0e-7 * scale, "{} != {}", a, b);
        }
    }

    /// Prescribes the velocity of node 0 and returns the stress of a particle at `point`
    /// after one unit step from rest.
    fn stress_after_one_step(
        mut cell: Cell,
        nodes: NodeSet,
        point: Point<Real>,
        velocity: &[Real],
    ) -> VoigtVector<Real> {
        nodes.with_node(0, |node| {
            for (dof, v) in velocity.iter().enumerate() {
                assert!(node.assign_velocity_constraint(dof, *v));
            }
        });
        nodes.iter().for_each(|node| {
            let mut node = node.lock().unwrap();
            node.assign_status(true);
            node.compute_velocity();
        });

        let material = bingham();
        let mut particle = Particle::new(0, point, 1);
        assert!(particle.assign_cell(&mut cell));
        assert!(particle.compute_strain(&cell, &nodes, 0, 1.0));

        material.compute_stress(&VoigtVector::zeros(), &particle.dstrain(0), &particle, 0)
    }

    #[test]
    fn properties() {
        let mut material = Bingham::new(3);
        assert!(!material.status());
        assert_eq!(material.property("density"), Real::MAX);
        assert!(material
            .properties(&MaterialProperties::from([("density", 1000.0)]))
            .is_err());
        assert!(!material.status());

        let material = bingham();
        assert!(material.status());
        assert_eq!(material.property("tau0"), 771.8);
        assert_eq!(material.property("unknown"), Real::MAX);
        assert!((material.property("bulk_modulus") - 1.0e7 / 1.2).abs() < 1.0e-6);
        assert_eq!(material.density(), 1000.0);
    }

    #[test]
    fn no_stress_at_rest() {
        let particle = Particle::new(0, Point::origin(), 1);
        let stress = bingham().compute_stress(
            &VoigtVector::zeros(),
            &VoigtVector::zeros(),
            &particle,
            0,
        );
        assert_eq!(stress, VoigtVector::zeros());
    }

    #[cfg(feature = "dim2")]
    mod dim2 {
        use super::{assert_relative_eq, stress_after_one_step};
        use crate::core::geometry::ShapeFn;
        use crate::geometry::cell::test::build_cell;
        use crate::math::VoigtVector;
        use na::point;

        fn stress(velocity: &[f64]) -> VoigtVector<f64> {
            let (cell, nodes) = build_cell(
                0,
                ShapeFn::Quadrilateral4,
                &[
                    point![-2.0, -2.0],
                    point![2.0, -2.0],
                    point![2.0, 2.0],
                    point![-2.0, 2.0],
                ],
            );
            stress_after_one_step(cell, nodes, point![0.5, 0.5], velocity)
        }

        #[test]
        fn no_motion() {
            assert_eq!(stress(&[0.0, 0.0]), VoigtVector::zeros());
        }

        #[test]
        fn below_critical_shear_rate() {
            let expected =
                VoigtVector::new(-208333.33333333, -208333.33333333, 0.0, 0.0, 0.0, 0.0);
            assert_relative_eq(&stress(&[0.02, 0.03]), &expected);
        }

        #[test]
        fn above_critical_shear_rate() {
            let expected = VoigtVector::new(
                -20833765.64471337,
                -20833981.80040339,
                0.0,
                -540.38922505,
                0.0,
                0.0,
            );
            assert_relative_eq(&stress(&[2.0, 3.0]), &expected);
        }
    }

    #[cfg(feature = "dim3")]
    mod dim3 {
        use super::{assert_relative_eq, stress_after_one_step};
        use crate::core::geometry::ShapeFn;
        use crate::geometry::cell::test::build_cell;
        use crate::math::VoigtVector;
        use na::point;

        fn stress(velocity: &[f64]) -> VoigtVector<f64> {
            // The reference z axis runs along -y.
            let (cell, nodes) = build_cell(
                0,
                ShapeFn::Hexahedron8,
                &[
                    point![-2.0, 2.0, -2.0],
                    point![2.0, 2.0, -2.0],
                    point![2.0, 2.0, 2.0],
                    point![-2.0, 2.0, 2.0],
                    point![-2.0, -2.0, -2.0],
                    point![2.0, -2.0, -2.0],
                    point![2.0, -2.0, 2.0],
                    point![-2.0, -2.0, 2.0],
                ],
            );
            stress_after_one_step(cell, nodes, point![0.5, 0.5, 0.5], velocity)
        }

        #[test]
        fn no_motion() {
            assert_eq!(stress(&[0.0, 0.0, 0.0]), VoigtVector::zeros());
        }

        #[test]
        fn below_critical_shear_rate() {
            let expected = VoigtVector::new(-125000.0, -125000.0, -125000.0, 0.0, 0.0, 0.0);
            assert_relative_eq(&stress(&[0.02, 0.03, 0.04]), &expected);
        }

        #[test]
        fn above_critical_shear_rate() {
            let expected = VoigtVector::new(
                -12500332.757177856,
                -12499700.518539926,
                -12500665.514355714,
                -149.7407300358801,
                -49.9135766786267,
                -499.13576678626697,
            );
            assert_relative_eq(&stress(&[2.0, 3.0, 4.0]), &expected);
        }
    }
}
