pub use self::cell::Cell;
pub use self::mesh::Mesh;
pub use crate::core::geometry::{ShapeFn, ShapeFnDegree, ShapeFnError};

pub(crate) mod cell;
pub(crate) mod mesh;
