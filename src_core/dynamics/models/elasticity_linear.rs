use crate::dynamics::models::{MaterialProperties, MissingProperty};
use crate::math::{Real, VoigtVector};
use na::Matrix6;

/// Isotropic small-strain Hooke law.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearElasticity {
    pub density: Real,
    pub youngs_modulus: Real,
    pub poisson_ratio: Real,
    pub stiffness: Matrix6<Real>,
}

impl LinearElasticity {
    pub fn new(density: Real, youngs_modulus: Real, poisson_ratio: Real) -> Self {
        Self {
            density,
            youngs_modulus,
            poisson_ratio,
            stiffness: crate::utils::isotropic_stiffness(youngs_modulus, poisson_ratio),
        }
    }

    pub fn from_properties(properties: &MaterialProperties) -> Result<Self, MissingProperty> {
        Ok(Self::new(
            properties.require("density")?,
            properties.require("youngs_modulus")?,
            properties.require("poisson_ratio")?,
        ))
    }

    pub fn compute_stress(
        &self,
        stress: &VoigtVector<Real>,
        dstrain: &VoigtVector<Real>,
    ) -> VoigtVector<Real> {
        stress + self.stiffness * dstrain
    }
}
