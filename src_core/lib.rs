pub extern crate nalgebra as na;

extern crate alloc;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

pub mod prelude {
    pub use crate::dynamics::models::*;
    pub use crate::dynamics::solver::*;
    pub use crate::geometry::*;
    pub use crate::math::*;
}

pub mod math {
    pub use super::granule_math::math::*;
    use na::Vector6;

    /// A symmetric second-order tensor in Voigt notation: `(xx, yy, zz, xy, yz, xz)`.
    ///
    /// Strain-like quantities store engineering shear components (`2 * e_xy`).
    pub type VoigtVector<N> = Vector6<N>;

    /// The strain-displacement operator of one node.
    pub type BMatrix<N> = na::SMatrix<N, 6, DIM>;

    /// One row per element node, one column per spatial dimension.
    pub type NodalMatrix<N> = na::OMatrix<N, na::Dyn, Dim>;

    /// The Kronecker delta in Voigt form, restricted to the active normal components.
    pub fn dirac_delta() -> VoigtVector<Real> {
        let mut delta = VoigtVector::zeros();
        delta.fixed_rows_mut::<DIM>(0).fill(1.0);
        delta
    }

    /// Mean of the active normal components.
    pub fn mean_normal(tensor: &VoigtVector<Real>) -> Real {
        tensor.fixed_rows::<DIM>(0).sum() / (DIM as Real)
    }

    /// Converts engineering shear components to tensorial ones.
    pub fn voigt_to_tensorial(strain: &VoigtVector<Real>) -> VoigtVector<Real> {
        let mut result = *strain;
        result.fixed_rows_mut::<3>(3).scale_mut(0.5);
        result
    }
}

mod granule_math {
    mod real {
        /// The scalar type used throughout this crate.
        pub type Real = f64;
    }

    /// Compilation flags dependent aliases for mathematical types.
    #[cfg(feature = "dim3")]
    pub mod math {
        pub use super::real::*;
        use na::{Matrix3, Point3, Vector3, U3};

        /// The default tolerance used for geometric operations.
        pub const DEFAULT_EPSILON: Real = 1.0e-10;

        /// The dimension of the space.
        pub const DIM: usize = 3;

        /// The dimension of the ambient space.
        pub type Dim = U3;

        /// The point type.
        pub type Point<N> = Point3<N>;

        /// The vector type.
        pub type Vector<N> = Vector3<N>;

        /// The matrix type.
        pub type Matrix<N> = Matrix3<N>;
    }

    /// Compilation flags dependent aliases for mathematical types.
    #[cfg(feature = "dim2")]
    pub mod math {
        pub use super::real::*;
        use na::{Matrix2, Point2, Vector2, U2};

        /// The default tolerance used for geometric operations.
        pub const DEFAULT_EPSILON: Real = 1.0e-10;

        /// The dimension of the space.
        pub const DIM: usize = 2;

        /// The dimension of the ambient space.
        pub type Dim = U2;

        /// The point type.
        pub type Point<N> = Point2<N>;

        /// The vector type.
        pub type Vector<N> = Vector2<N>;

        /// The matrix type.
        pub type Matrix<N> = Matrix2<N>;
    }
}

pub mod dynamics;
pub mod geometry;
pub mod utils;
