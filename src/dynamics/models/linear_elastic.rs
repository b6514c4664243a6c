use crate::core::dynamics::models::{LinearElasticity, MaterialKind, MaterialProperties};
use crate::dynamics::models::Material;
use crate::dynamics::Particle;
use crate::math::{Real, VoigtVector};
use anyhow::Context;

#[derive(Clone, Debug)]
pub struct LinearElastic {
    id: u32,
    properties: MaterialProperties,
    model: Option<LinearElasticity>,
}

impl LinearElastic {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            properties: MaterialProperties::new(),
            model: None,
        }
    }
}

impl Material for LinearElastic {
    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> MaterialKind {
        MaterialKind::LinearElastic
    }

    fn properties(&mut self, properties: &MaterialProperties) -> anyhow::Result<()> {
        let model = LinearElasticity::from_properties(properties)
            .with_context(|| format!("invalid properties for material {}", self.id))?;
        self.model = Some(model);
        self.properties = properties.clone();
        Ok(())
    }

    fn status(&self) -> bool {
        self.model.is_some()
    }

    fn property(&self, key: &str) -> Real {
        self.properties.get(key).unwrap_or(Real::MAX)
    }

    fn compute_stress(
        &self,
        stress: &VoigtVector<Real>,
        dstrain: &VoigtVector<Real>,
        _particle: &Particle,
        _phase: usize,
    ) -> VoigtVector<Real> {
        match &self.model {
            Some(model) => model.compute_stress(stress, dstrain),
            None => *stress,
        }
    }
}
