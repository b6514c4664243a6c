#[cfg(feature = "dim2")]
pub extern crate granule2d_core;
#[cfg(feature = "dim3")]
pub extern crate granule3d_core;

pub extern crate nalgebra as na;

#[macro_use]
extern crate log;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

#[cfg(feature = "dim2")]
pub use granule2d_core as core;
#[cfg(feature = "dim3")]
pub use granule3d_core as core;

pub mod prelude {
    pub use crate::dynamics::models::*;
    pub use crate::dynamics::solver::*;
    pub use crate::dynamics::*;
    pub use crate::geometry::*;
    pub use crate::math::*;
    pub use crate::pipelines::*;
}

pub mod math {
    pub use crate::core::math::*;

    /// Global identifier of nodes, cells and particles.
    pub type Index = u64;
}

pub mod dynamics;
pub mod geometry;
pub mod pipelines;
