use crate::core::dynamics::models::{MaterialKind, MaterialProperties};
use crate::dynamics::Particle;
use crate::math::{Real, VoigtVector};
use std::fmt;

/// A constitutive law shared by every particle made of it.
///
/// `properties` must be called once before any `compute_stress`. The material keeps no
/// per-particle state: everything it needs is read from the particle.
pub trait Material: fmt::Debug + Send + Sync {
    fn id(&self) -> u32;
    fn kind(&self) -> MaterialKind;

    fn name(&self) -> String {
        self.kind().name()
    }

    /// Assigns the calibrated properties. Fails if a required property is missing.
    fn properties(&mut self, properties: &MaterialProperties) -> anyhow::Result<()>;

    /// `true` once the properties are assigned.
    fn status(&self) -> bool;

    /// The configured value of `key`, or `Real::MAX` if it is unknown.
    fn property(&self, key: &str) -> Real;

    fn density(&self) -> Real {
        self.property("density")
    }

    /// The stress of `particle` after the strain increment `dstrain`.
    ///
    /// This never fails: a material without properties returns `stress` unchanged.
    fn compute_stress(
        &self,
        stress: &VoigtVector<Real>,
        dstrain: &VoigtVector<Real>,
        particle: &Particle,
        phase: usize,
    ) -> VoigtVector<Real>;
}
