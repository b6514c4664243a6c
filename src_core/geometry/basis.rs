//! Polynomial bases of the reference elements.
//!
//! Node `i` of a reference element is attached to a reference position `n_i` whose
//! components are all in `{-1, 0, 1}`.

use crate::math::{NodalMatrix, Real, Vector, DIM};
use na::DVector;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Basis {
    /// Tensor product of linear 1-D Lagrange polynomials.
    Lagrange1,
    /// Tensor product of quadratic 1-D Lagrange polynomials.
    Lagrange2,
    /// Quadratic serendipity basis (corner and edge nodes only).
    Serendipity,
}

impl Basis {
    pub fn values(self, nodes: &[[Real; DIM]], xi: &Vector<Real>) -> DVector<Real> {
        DVector::from_iterator(
            nodes.len(),
            nodes.iter().map(|node| match self {
                Basis::Lagrange1 => lagrange_value(node, xi, linear),
                Basis::Lagrange2 => lagrange_value(node, xi, quadratic),
                Basis::Serendipity => serendipity_value(node, xi),
            }),
        )
    }

    pub fn gradients(self, nodes: &[[Real; DIM]], xi: &Vector<Real>) -> NodalMatrix<Real> {
        let mut result = NodalMatrix::zeros(nodes.len());

        for (i, node) in nodes.iter().enumerate() {
            let grad = match self {
                Basis::Lagrange1 => lagrange_gradient(node, xi, linear, linear_derivative),
                Basis::Lagrange2 => lagrange_gradient(node, xi, quadratic, quadratic_derivative),
                Basis::Serendipity => serendipity_gradient(node, xi),
            };
            result.row_mut(i).copy_from(&grad.transpose());
        }

        result
    }
}

fn linear(node: Real, x: Real) -> Real {
    0.5 * (1.0 + node * x)
}

fn linear_derivative(node: Real, _x: Real) -> Real {
    0.5 * node
}

fn quadratic(node: Real, x: Real) -> Real {
    if node == 0.0 {
        1.0 - x * x
    } else {
        0.5 * x * (x + node)
    }
}

fn quadratic_derivative(node: Real, x: Real) -> Real {
    if node == 0.0 {
        -2.0 * x
    } else {
        x + 0.5 * node
    }
}

fn lagrange_value(node: &[Real; DIM], xi: &Vector<Real>, basis: fn(Real, Real) -> Real) -> Real {
    (0..DIM).map(|d| basis(node[d], xi[d])).product()
}

fn lagrange_gradient(
    node: &[Real; DIM],
    xi: &Vector<Real>,
    basis: fn(Real, Real) -> Real,
    derivative: fn(Real, Real) -> Real,
) -> Vector<Real> {
    Vector::from_fn(|j, _| {
        (0..DIM)
            .map(|d| {
                if d == j {
                    derivative(node[d], xi[d])
                } else {
                    basis(node[d], xi[d])
                }
            })
            .product()
    })
}

/// Index of the single zero component of an edge node, `None` for a corner node.
fn edge_direction(node: &[Real; DIM]) -> Option<usize> {
    node.iter().position(|n| *n == 0.0)
}

fn serendipity_value(node: &[Real; DIM], xi: &Vector<Real>) -> Real {
    match edge_direction(node) {
        None => {
            let weight = 0.5f64.powi(DIM as i32);
            let product: Real = (0..DIM).map(|d| 1.0 + node[d] * xi[d]).product();
            let sum: Real = (0..DIM).map(|d| node[d] * xi[d]).sum();
            weight * product * (sum - (DIM - 1) as Real)
        }
        Some(k) => {
            let weight = 0.5f64.powi(DIM as i32 - 1);
            let product: Real = (0..DIM)
                .filter(|d| *d != k)
                .map(|d| 1.0 + node[d] * xi[d])
                .product();
            weight * (1.0 - xi[k] * xi[k]) * product
        }
    }
}

fn serendipity_gradient(node: &[Real; DIM], xi: &Vector<Real>) -> Vector<Real> {
    match edge_direction(node) {
        None => {
            let weight = 0.5f64.powi(DIM as i32);
            let product: Real = (0..DIM).map(|d| 1.0 + node[d] * xi[d]).product();
            let sum: Real = (0..DIM).map(|d| node[d] * xi[d]).sum();

            Vector::from_fn(|j, _| {
                let others: Real = (0..DIM)
                    .filter(|d| *d != j)
                    .map(|d| 1.0 + node[d] * xi[d])
                    .product();
                weight * node[j] * (others * (sum - (DIM - 1) as Real) + product)
            })
        }
        Some(k) => {
            let weight = 0.5f64.powi(DIM as i32 - 1);
            let bubble = 1.0 - xi[k] * xi[k];

            Vector::from_fn(|j, _| {
                let others: Real = (0..DIM)
                    .filter(|d| *d != k && *d != j)
                    .map(|d| 1.0 + node[d] * xi[d])
                    .product();

                if j == k {
                    weight * -2.0 * xi[k] * others
                } else {
                    weight * bubble * node[j] * others
                }
            })
        }
    }
}
