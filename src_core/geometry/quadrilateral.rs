//! Reference quadrilaterals on `[-1, 1]²`.
//!
//! ```text
//!   3      6      2
//!    *-----*-----*
//!    |           |
//!  7 *     * 8   * 5
//!    |           |
//!    *-----*-----*
//!   0      4      1
//! ```

use super::basis::Basis;
use super::shape_function::{ReferenceElement, ShapeFnDegree};

const NODES: [[f64; 2]; 9] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
    [0.0, -1.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [-1.0, 0.0],
    [0.0, 0.0],
];

const SIDES: [[usize; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];
const CORNERS: [usize; 4] = [0, 1, 2, 3];

pub(crate) static QUADRILATERAL4: ReferenceElement = ReferenceElement {
    name: "ED2Q4",
    nodes: &[NODES[0], NODES[1], NODES[2], NODES[3]],
    degree: ShapeFnDegree::Linear,
    basis: Basis::Lagrange1,
    sides: &SIDES,
    corners: &CORNERS,
    inhedron: &SIDES,
};

pub(crate) static QUADRILATERAL8: ReferenceElement = ReferenceElement {
    name: "ED2Q8",
    nodes: &[
        NODES[0], NODES[1], NODES[2], NODES[3], NODES[4], NODES[5], NODES[6], NODES[7],
    ],
    degree: ShapeFnDegree::Quadratic,
    basis: Basis::Serendipity,
    sides: &SIDES,
    corners: &CORNERS,
    inhedron: &SIDES,
};

pub(crate) static QUADRILATERAL9: ReferenceElement = ReferenceElement {
    name: "ED2Q9",
    nodes: &NODES,
    degree: ShapeFnDegree::Quadratic,
    basis: Basis::Lagrange2,
    sides: &SIDES,
    corners: &CORNERS,
    inhedron: &SIDES,
};
