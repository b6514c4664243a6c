pub use self::shape_function::{bmatrix_from_gradients, ShapeFn, ShapeFnDegree, ShapeFnError};

mod basis;
#[cfg(feature = "dim3")]
mod hexahedron;
#[cfg(feature = "dim2")]
mod quadrilateral;
mod shape_function;
