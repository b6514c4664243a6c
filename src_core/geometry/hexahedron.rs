//! Reference hexahedra on `[-1, 1]³`.
//!
//! Corners come first (bottom face `0..4`, top face `4..8`, both counter-clockwise),
//! followed by the edge mid-points `8..20`, the face centres `20..26` and the
//! cell centre `26`.
//!
//! ```text
//!        7             6
//!          *_ _ _ _ _ _*
//!         /|           /|
//!        / |          / |
//!     4 *_ |_ _ _ _ _* 5|
//!       |  |         |  |
//!       |  |         |  |
//!       |  *_ _ _ _ _|_ *
//!       | / 3        | / 2
//!       |/           |/
//!       *_ _ _ _ _ _ *
//!     0               1
//! ```

use super::basis::Basis;
use super::shape_function::{ReferenceElement, ShapeFnDegree};

const NODES: [[f64; 3]; 27] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    // Edges.
    [0.0, -1.0, -1.0],
    [-1.0, 0.0, -1.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, -1.0],
    [1.0, -1.0, 0.0],
    [0.0, 1.0, -1.0],
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [0.0, -1.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    // Faces.
    [0.0, 0.0, -1.0],
    [0.0, -1.0, 0.0],
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    // Centre.
    [0.0, 0.0, 0.0],
];

const SIDES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

const CORNERS: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Two triangles per face.
const INHEDRON: [[usize; 3]; 12] = [
    [0, 1, 2],
    [0, 2, 3],
    [4, 5, 6],
    [4, 6, 7],
    [0, 1, 5],
    [0, 5, 4],
    [3, 2, 6],
    [3, 6, 7],
    [0, 3, 7],
    [0, 7, 4],
    [1, 2, 6],
    [1, 6, 5],
];

pub(crate) static HEXAHEDRON8: ReferenceElement = ReferenceElement {
    name: "ED3H8",
    nodes: &[
        NODES[0], NODES[1], NODES[2], NODES[3], NODES[4], NODES[5], NODES[6], NODES[7],
    ],
    degree: ShapeFnDegree::Linear,
    basis: Basis::Lagrange1,
    sides: &SIDES,
    corners: &CORNERS,
    inhedron: &INHEDRON,
};

pub(crate) static HEXAHEDRON20: ReferenceElement = ReferenceElement {
    name: "ED3H20",
    nodes: &[
        NODES[0], NODES[1], NODES[2], NODES[3], NODES[4], NODES[5], NODES[6], NODES[7],
        NODES[8], NODES[9], NODES[10], NODES[11], NODES[12], NODES[13], NODES[14], NODES[15],
        NODES[16], NODES[17], NODES[18], NODES[19],
    ],
    degree: ShapeFnDegree::Quadratic,
    basis: Basis::Serendipity,
    sides: &SIDES,
    corners: &CORNERS,
    inhedron: &INHEDRON,
};

pub(crate) static HEXAHEDRON27: ReferenceElement = ReferenceElement {
    name: "ED3H27",
    nodes: &NODES,
    degree: ShapeFnDegree::Quadratic,
    basis: Basis::Lagrange2,
    sides: &SIDES,
    corners: &CORNERS,
    inhedron: &INHEDRON,
};
