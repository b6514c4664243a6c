use super::basis::Basis;
use crate::math::{BMatrix, Matrix, NodalMatrix, Real, Vector, DIM};
use na::DVector;
use core::fmt;

#[cfg(feature = "dim3")]
use super::hexahedron::{HEXAHEDRON20, HEXAHEDRON27, HEXAHEDRON8};
#[cfg(feature = "dim2")]
use super::quadrilateral::{QUADRILATERAL4, QUADRILATERAL8, QUADRILATERAL9};

/// Polynomial degree of an element basis.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeFnDegree {
    Linear,
    Quadratic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeFnError {
    /// No element of the current dimension has this many nodes.
    UnsupportedNodeCount(usize),
    /// The element name is not registered for the current dimension.
    UnknownElement(String),
}

impl fmt::Display for ShapeFnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeFnError::UnsupportedNodeCount(n) => write!(
                f,
                "no {}-dimensional element has {} shape functions",
                DIM, n
            ),
            ShapeFnError::UnknownElement(name) => write!(f, "unknown element type `{}`", name),
        }
    }
}

impl std::error::Error for ShapeFnError {}

pub(crate) struct ReferenceElement {
    pub name: &'static str,
    pub nodes: &'static [[Real; DIM]],
    pub degree: ShapeFnDegree,
    pub basis: Basis,
    pub sides: &'static [[usize; 2]],
    pub corners: &'static [usize],
    pub inhedron: &'static [[usize; DIM]],
}

/// The shape functions of one element topology.
///
/// This is a plain tag: it is `Copy` and every cell of a given topology can hold its own.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeFn {
    #[cfg(feature = "dim2")]
    Quadrilateral4,
    #[cfg(feature = "dim2")]
    Quadrilateral8,
    #[cfg(feature = "dim2")]
    Quadrilateral9,
    #[cfg(feature = "dim3")]
    Hexahedron8,
    #[cfg(feature = "dim3")]
    Hexahedron20,
    #[cfg(feature = "dim3")]
    Hexahedron27,
}

impl ShapeFn {
    #[cfg(feature = "dim2")]
    pub const ALL: [ShapeFn; 3] = [
        ShapeFn::Quadrilateral4,
        ShapeFn::Quadrilateral8,
        ShapeFn::Quadrilateral9,
    ];
    #[cfg(feature = "dim3")]
    pub const ALL: [ShapeFn; 3] = [
        ShapeFn::Hexahedron8,
        ShapeFn::Hexahedron20,
        ShapeFn::Hexahedron27,
    ];

    /// The element of the current dimension with `nfunctions` nodes.
    pub fn new(nfunctions: usize) -> Result<Self, ShapeFnError> {
        Self::ALL
            .iter()
            .copied()
            .find(|shapefn| shapefn.nfunctions() == nfunctions)
            .ok_or(ShapeFnError::UnsupportedNodeCount(nfunctions))
    }

    /// Looks an element up by its registered name, e.g. `"ED2Q4"` or `"ED3H20"`.
    pub fn from_name(name: &str) -> Result<Self, ShapeFnError> {
        Self::ALL
            .iter()
            .copied()
            .find(|shapefn| shapefn.name() == name)
            .ok_or_else(|| ShapeFnError::UnknownElement(name.to_string()))
    }

    fn element(self) -> &'static ReferenceElement {
        match self {
            #[cfg(feature = "dim2")]
            ShapeFn::Quadrilateral4 => &QUADRILATERAL4,
            #[cfg(feature = "dim2")]
            ShapeFn::Quadrilateral8 => &QUADRILATERAL8,
            #[cfg(feature = "dim2")]
            ShapeFn::Quadrilateral9 => &QUADRILATERAL9,
            #[cfg(feature = "dim3")]
            ShapeFn::Hexahedron8 => &HEXAHEDRON8,
            #[cfg(feature = "dim3")]
            ShapeFn::Hexahedron20 => &HEXAHEDRON20,
            #[cfg(feature = "dim3")]
            ShapeFn::Hexahedron27 => &HEXAHEDRON27,
        }
    }

    pub fn name(self) -> &'static str {
        self.element().name
    }

    pub fn nfunctions(self) -> usize {
        self.element().nodes.len()
    }

    pub fn degree(self) -> ShapeFnDegree {
        self.element().degree
    }

    /// Evaluates every shape function at the reference location `xi`.
    pub fn shapefn(self, xi: &Vector<Real>) -> DVector<Real> {
        let element = self.element();
        element.basis.values(element.nodes, xi)
    }

    /// The derivatives `dN_i / dxi_j` at the reference location `xi`.
    pub fn grad_shapefn(self, xi: &Vector<Real>) -> NodalMatrix<Real> {
        let element = self.element();
        element.basis.gradients(element.nodes, xi)
    }

    /// The Jacobian `J_ij = dx_j / dxi_i` of the map from the reference element to the
    /// cell described by `nodal_coordinates` (one row per node).
    ///
    /// If fewer coordinates than shape functions are given, only the leading shape
    /// functions contribute.
    pub fn jacobian(self, xi: &Vector<Real>, nodal_coordinates: &NodalMatrix<Real>) -> Matrix<Real> {
        let grad = self.grad_shapefn(xi);
        let n = grad.nrows().min(nodal_coordinates.nrows());
        grad.rows(0, n).transpose() * nodal_coordinates.rows(0, n)
    }

    /// The physical derivatives `dN_i / dx_j`, or `None` if the cell is degenerate at `xi`.
    pub fn grad_shapefn_physical(
        self,
        xi: &Vector<Real>,
        nodal_coordinates: &NodalMatrix<Real>,
    ) -> Option<NodalMatrix<Real>> {
        let grad = self.grad_shapefn(xi);
        let n = grad.nrows().min(nodal_coordinates.nrows());
        let jacobian: Matrix<Real> = grad.rows(0, n).transpose() * nodal_coordinates.rows(0, n);
        let inv_jacobian = jacobian.try_inverse()?;
        Some(grad * inv_jacobian.transpose())
    }

    /// The B-matrices of the reference element itself.
    pub fn bmatrix(self, xi: &Vector<Real>) -> Vec<BMatrix<Real>> {
        bmatrix_from_gradients(&self.grad_shapefn(xi))
    }

    /// The B-matrices of the cell described by `nodal_coordinates`.
    pub fn bmatrix_with_coordinates(
        self,
        xi: &Vector<Real>,
        nodal_coordinates: &NodalMatrix<Real>,
    ) -> Option<Vec<BMatrix<Real>>> {
        self.grad_shapefn_physical(xi, nodal_coordinates)
            .map(|grad| bmatrix_from_gradients(&grad))
    }

    /// Reference coordinates of the element nodes, one row per node.
    pub fn unit_cell_coordinates(self) -> NodalMatrix<Real> {
        let nodes = self.element().nodes;
        NodalMatrix::from_fn(nodes.len(), |i, j| nodes[i][j])
    }

    /// Node pairs of every edge of the element.
    pub fn sides_indices(self) -> &'static [[usize; 2]] {
        self.element().sides
    }

    pub fn corner_indices(self) -> &'static [usize] {
        self.element().corners
    }

    /// Boundary simplices (edges in 2D, triangles in 3D) of the element. Joining each
    /// of them to an inner point splits the cell into triangles or tetrahedra.
    pub fn inhedron_indices(self) -> &'static [[usize; DIM]] {
        self.element().inhedron
    }
}

/// Assembles the Voigt strain-displacement operator of every node from its gradient.
///
/// Shear rows use engineering strains.
pub fn bmatrix_from_gradients(grad: &NodalMatrix<Real>) -> Vec<BMatrix<Real>> {
    grad.row_iter()
        .map(|g| {
            let mut b = BMatrix::zeros();
            for d in 0..DIM {
                b[(d, d)] = g[d];
            }

            #[cfg(feature = "dim2")]
            {
                b[(3, 0)] = g[1];
                b[(3, 1)] = g[0];
            }

            #[cfg(feature = "dim3")]
            {
                b[(3, 0)] = g[1];
                b[(3, 1)] = g[0];
                b[(4, 1)] = g[2];
                b[(4, 2)] = g[1];
                b[(5, 0)] = g[2];
                b[(5, 2)] = g[0];
            }

            b
        })
        .collect()
}
