use crate::math::Real;
use na::Matrix6;

/// Computes the Lamé parameters (lambda, mu) from the young modulus and poisson ratio.
pub fn lame_lambda_mu(young_modulus: Real, poisson_ratio: Real) -> (Real, Real) {
    (
        young_modulus * poisson_ratio / ((1.0 + poisson_ratio) * (1.0 - 2.0 * poisson_ratio)),
        shear_modulus(young_modulus, poisson_ratio),
    )
}

pub fn shear_modulus(young_modulus: Real, poisson_ratio: Real) -> Real {
    young_modulus / (2.0 * (1.0 + poisson_ratio))
}

pub fn bulk_modulus(young_modulus: Real, poisson_ratio: Real) -> Real {
    young_modulus / (3.0 * (1.0 - 2.0 * poisson_ratio))
}

/// The isotropic elastic stiffness acting on Voigt strains with engineering shears.
pub fn isotropic_stiffness(young_modulus: Real, poisson_ratio: Real) -> Matrix6<Real> {
    let (lambda, mu) = lame_lambda_mu(young_modulus, poisson_ratio);
    let mut stiffness = Matrix6::zeros();

    for i in 0..3 {
        for j in 0..3 {
            stiffness[(i, j)] = lambda;
        }
        stiffness[(i, i)] += 2.0 * mu;
        stiffness[(i + 3, i + 3)] = mu;
    }

    stiffness
}
