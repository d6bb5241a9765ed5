//! Dense linear algebra used by the tensor and fitting code.
//!
//! [`matrix::Matrix`] wraps a dynamically sized `nalgebra` matrix and turns every
//! shape violation into a [`matrix::MatrixError`] instead of a panic. On top of
//! the plain arithmetic it provides the two numeric kernels the rest of the
//! crate relies on: a cyclic Jacobi eigen-solver for symmetric matrices and an
//! SVD-based least-squares solve.

pub mod matrix;

pub use matrix::{EigenOrder, LeastSquares, Matrix, MatrixError, SymmetricEigen};
