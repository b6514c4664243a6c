use crate::dynamics::models::{MaterialProperties, MissingProperty};
use crate::math::{self, Real, VoigtVector};

/// Bingham viscoplastic fluid.
///
/// Below `critical_shear_rate` the material only carries pressure. Above it, the
/// shear stress follows the apparent viscosity `tau0 / shear_rate + mu`.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct BinghamViscoplasticity {
    pub density: Real,
    pub youngs_modulus: Real,
    pub poisson_ratio: Real,
    /// Yield stress.
    pub tau0: Real,
    /// Plastic viscosity.
    pub mu: Real,
    pub critical_shear_rate: Real,
    pub bulk_modulus: Real,
}

impl BinghamViscoplasticity {
    pub fn new(
        density: Real,
        youngs_modulus: Real,
        poisson_ratio: Real,
        tau0: Real,
        mu: Real,
        critical_shear_rate: Real,
    ) -> Self {
        Self {
            density,
            youngs_modulus,
            poisson_ratio,
            tau0,
            mu,
            critical_shear_rate,
            bulk_modulus: crate::utils::bulk_modulus(youngs_modulus, poisson_ratio),
        }
    }

    pub fn from_properties(properties: &MaterialProperties) -> Result<Self, MissingProperty> {
        Ok(Self::new(
            properties.require("density")?,
            properties.require("youngs_modulus")?,
            properties.require("poisson_ratio")?,
            properties.require("tau0")?,
            properties.require("mu")?,
            properties.require("critical_shear_rate")?,
        ))
    }

    /// The equivalent shear rate `sqrt(2 D:D)` of a Voigt strain rate.
    pub fn shear_rate(strain_rate: &VoigtVector<Real>) -> Real {
        let d = math::voigt_to_tensorial(strain_rate);
        // Off-diagonal terms appear twice in the full contraction.
        (2.0 * (d.norm_squared() + d.fixed_rows::<3>(3).norm_squared())).sqrt()
    }

    /// The stress after one step.
    ///
    /// `dvolumetric_strain` is the change of the host cell Jacobian determinant over the
    /// step, sampled at the cell centroid. It drives the pressure through the bulk modulus.
    pub fn compute_stress(
        &self,
        stress: &VoigtVector<Real>,
        strain_rate: &VoigtVector<Real>,
        dvolumetric_strain: Real,
    ) -> VoigtVector<Real> {
        let pressure = -math::mean_normal(stress) - self.bulk_modulus * dvolumetric_strain;
        let shear_rate = Self::shear_rate(strain_rate);

        let tau = if shear_rate > self.critical_shear_rate {
            let apparent_viscosity = self.tau0 / shear_rate + self.mu;
            math::voigt_to_tensorial(strain_rate) * (2.0 * apparent_viscosity)
        } else {
            VoigtVector::zeros()
        };

        tau - math::dirac_delta() * pressure
    }
}

#[cfg(test)]
mod test {
    use super::BinghamViscoplasticity;
    use crate::dynamics::models::MaterialProperties;
    use crate::math::VoigtVector;

    fn bingham() -> BinghamViscoplasticity {
        BinghamViscoplasticity::from_properties(&MaterialProperties::from([
            ("density", 1000.0),
            ("youngs_modulus", 1.0e7),
            ("poisson_ratio", 0.3),
            ("tau0", 771.8),
            ("mu", 0.0451),
            ("critical_shear_rate", 0.2),
        ]))
        .unwrap()
    }

    fn assert_relative_eq(a: &VoigtVector<f64>, b: &VoigtVector<f64>) {
        for i in 0..6 {
            let scale = b[i].abs().max(1.0);
            assert!((a[i] - b[i]).abs() <= 1.0e-7 * scale, "{} != {}", a, b);
        }
    }

    #[test]
    fn missing_properties_are_reported() {
        let properties = MaterialProperties::from([("density", 1000.0)]);
        let err = BinghamViscoplasticity::from_properties(&properties).unwrap_err();
        assert_eq!(err.0, "youngs_modulus");
    }

    #[test]
    fn rest_state_is_stress_free() {
        let stress = bingham().compute_stress(&VoigtVector::zeros(), &VoigtVector::zeros(), 0.0);
        assert_eq!(stress, VoigtVector::zeros());
    }

    #[test]
    fn shear_rate_counts_off_diagonal_terms_twice() {
        let rate = VoigtVector::new(0.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        // D_xy = D_yx = 1.
        assert!((BinghamViscoplasticity::shear_rate(&rate) - 2.0).abs() < 1.0e-15);
    }

    #[cfg(feature = "dim2")]
    #[test]
    fn yielded_response() {
        let rate = VoigtVector::new(-0.1875, -0.28125, 0.0, -0.46875, 0.0, 0.0);
        let stress = bingham().compute_stress(&VoigtVector::zeros(), &rate, -2.5);
        let expected = VoigtVector::new(
            -20833765.64471337,
            -20833981.80040339,
            0.0,
            -540.38922505,
            0.0,
            0.0,
        );
        assert_relative_eq(&stress, &expected);
    }

    #[cfg(feature = "dim2")]
    #[test]
    fn pressure_accumulates_from_previous_stress() {
        let model = bingham();
        let previous = VoigtVector::new(-100.0, -300.0, 0.0, 0.0, 0.0, 0.0);
        let stress = model.compute_stress(&previous, &VoigtVector::zeros(), -0.025);
        let expected_pressure = 200.0 + 0.025 * model.bulk_modulus;
        assert_relative_eq(
            &stress,
            &VoigtVector::new(-expected_pressure, -expected_pressure, 0.0, 0.0, 0.0, 0.0),
        );
    }
}
