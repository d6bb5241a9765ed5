use nalgebra::{DMatrix, DVector, Matrix3};
use std::fmt;
use std::ops::Index;
use thiserror::Error;

/// Below this absolute determinant a square matrix is treated as singular.
pub const SINGULAR_TOLERANCE: f64 = 1e-12;
/// Jacobi iteration stops once the off-diagonal norm falls below this fraction
/// of the matrix norm.
pub const EIGEN_TOLERANCE: f64 = 1e-14;
pub const MAX_JACOBI_SWEEPS: usize = 100;
/// Relative tolerance used when checking a matrix for symmetry.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;
/// Singular values below this fraction of the largest one do not count toward
/// the numerical rank.
pub const RANK_TOLERANCE: f64 = 1e-10;
pub const MAX_SVD_ITERATIONS: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatrixError {
    #[error("Dimension mismatch in {operation}: {left:?} vs {right:?}")]
    DimensionMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Operation '{operation}' requires a square matrix, got {rows}x{cols}")]
    NotSquare {
        operation: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("Matrix is not symmetric (max asymmetry {asymmetry:e})")]
    NotSymmetric { asymmetry: f64 },

    #[error("Matrix is singular (determinant {determinant:e})")]
    Singular { determinant: f64 },

    #[error("{operation} did not converge after {sweeps} sweeps")]
    NonConvergence {
        operation: &'static str,
        sweeps: usize,
    },

    #[error("Operation '{operation}' received a non-finite entry")]
    NonFinite { operation: &'static str },
}

/// Ordering applied to eigenvalues (and their eigenvectors) after decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EigenOrder {
    #[default]
    DescendingMagnitude,
    AscendingMagnitude,
    Ascending,
    Descending,
}

/// Eigenvalues and the matching orthonormal eigenvectors (one per column).
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricEigen {
    pub values: Vec<f64>,
    pub vectors: Matrix,
}

/// Result of an SVD-based least-squares solve.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquares {
    pub solution: Matrix,
    pub rank: usize,
    pub singular_values: Vec<f64>,
}

/// A dense, row/column-addressed matrix of `f64` with dimension-checked arithmetic.
///
/// All operations return new values; nothing is mutated behind the caller's back.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: DMatrix<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    pub fn identity(n: usize) -> Self {
        Self {
            data: DMatrix::identity(n, n),
        }
    }

    /// Builds a matrix from values listed row by row.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> Result<Self, MatrixError> {
        if values.len() != rows * cols {
            return Err(MatrixError::DimensionMismatch {
                operation: "from_row_slice",
                left: (rows, cols),
                right: (values.len(), 1),
            });
        }
        Ok(Self {
            data: DMatrix::from_row_slice(rows, cols, values),
        })
    }

    pub fn from_diagonal(values: &[f64]) -> Self {
        Self {
            data: DMatrix::from_diagonal(&DVector::from_column_slice(values)),
        }
    }

    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            data: DMatrix::from_column_slice(values.len(), 1, values),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[(row, col)] = value;
    }

    pub fn as_nalgebra(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Returns the matrix as a fixed 3x3 when it has that shape.
    pub fn to_matrix3(&self) -> Option<Matrix3<f64>> {
        (self.shape() == (3, 3)).then(|| Matrix3::from_iterator(self.data.iter().copied()))
    }

    pub fn try_add(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape("add", other)?;
        Ok(Self {
            data: &self.data + &other.data,
        })
    }

    pub fn try_sub(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape("subtract", other)?;
        Ok(Self {
            data: &self.data - &other.data,
        })
    }

    pub fn try_mul(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols() != other.rows() {
            return Err(MatrixError::DimensionMismatch {
                operation: "multiply",
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(Self {
            data: &self.data * &other.data,
        })
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        Self {
            data: &self.data * factor,
        }
    }

    pub fn transpose(&self) -> Matrix {
        Self {
            data: self.data.transpose(),
        }
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.data.norm()
    }

    pub fn trace(&self) -> Result<f64, MatrixError> {
        self.require_square("trace")?;
        Ok(self.data.trace())
    }

    pub fn determinant(&self) -> Result<f64, MatrixError> {
        self.require_square("determinant")?;
        Ok(self.data.determinant())
    }

    pub fn inverse(&self) -> Result<Matrix, MatrixError> {
        let determinant = self.determinant()?;
        if determinant.abs() < SINGULAR_TOLERANCE {
            return Err(MatrixError::Singular { determinant });
        }
        self.data
            .clone()
            .try_inverse()
            .map(|data| Self { data })
            .ok_or(MatrixError::Singular { determinant })
    }

    /// Largest absolute difference between mirrored entries.
    pub fn asymmetry(&self) -> Result<f64, MatrixError> {
        self.require_square("asymmetry")?;
        let n = self.rows();
        let mut worst = 0.0f64;
        for i in 0..n {
            for j in (i + 1)..n {
                worst = worst.max((self.data[(i, j)] - self.data[(j, i)]).abs());
            }
        }
        Ok(worst)
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        match self.asymmetry() {
            Ok(asymmetry) => asymmetry <= tolerance * self.norm(),
            Err(_) => false,
        }
    }

    /// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
    ///
    /// The eigenvectors are returned as orthonormal columns, sorted to follow
    /// `order`. Ties keep the order in which the diagonal produced them.
    ///
    /// # Errors
    ///
    /// * [`MatrixError::NotSquare`] / [`MatrixError::NotSymmetric`] on bad input.
    /// * [`MatrixError::NonConvergence`] if the off-diagonal mass is still above
    ///   tolerance after [`MAX_JACOBI_SWEEPS`] sweeps.
    pub fn symmetric_eigen(&self, order: EigenOrder) -> Result<SymmetricEigen, MatrixError> {
        let asymmetry = self.asymmetry()?;
        if asymmetry > SYMMETRY_TOLERANCE * self.norm() {
            return Err(MatrixError::NotSymmetric { asymmetry });
        }

        let (values, vectors) = jacobi_eigen(&self.data)?;

        let mut indices: Vec<usize> = (0..values.len()).collect();
        let key = |v: f64| match order {
            EigenOrder::DescendingMagnitude => -v.abs(),
            EigenOrder::AscendingMagnitude => v.abs(),
            EigenOrder::Ascending => v,
            EigenOrder::Descending => -v,
        };
        indices.sort_by(|&a, &b| key(values[a]).total_cmp(&key(values[b])));

        let n = values.len();
        let mut sorted_vectors = DMatrix::zeros(n, n);
        for (col, &idx) in indices.iter().enumerate() {
            sorted_vectors.set_column(col, &vectors.column(idx));
        }

        Ok(SymmetricEigen {
            values: indices.iter().map(|&i| values[i]).collect(),
            vectors: Self {
                data: sorted_vectors,
            },
        })
    }

    /// Least-squares solution of `self * x = rhs` through an SVD.
    ///
    /// Rank-deficient systems still produce the minimum-norm solution; callers
    /// that need a full-rank fit must check [`LeastSquares::rank`].
    pub fn solve_least_squares(&self, rhs: &Matrix) -> Result<LeastSquares, MatrixError> {
        if rhs.rows() != self.rows() {
            return Err(MatrixError::DimensionMismatch {
                operation: "solve_least_squares",
                left: self.shape(),
                right: rhs.shape(),
            });
        }

        if !self.data.iter().chain(rhs.data.iter()).all(|v| v.is_finite()) {
            return Err(MatrixError::NonFinite {
                operation: "solve_least_squares",
            });
        }

        let svd = self
            .data
            .clone()
            .try_svd(true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
            .ok_or(MatrixError::NonConvergence {
                operation: "solve_least_squares",
                sweeps: MAX_SVD_ITERATIONS,
            })?;
        let singular_values: Vec<f64> = svd.singular_values.iter().copied().collect();
        let largest = singular_values.iter().copied().fold(0.0f64, f64::max);
        if largest == 0.0 {
            return Err(MatrixError::Singular { determinant: 0.0 });
        }
        let cutoff = RANK_TOLERANCE * largest;
        let rank = singular_values.iter().filter(|&&s| s > cutoff).count();

        let solution = svd
            .solve(&rhs.data, cutoff)
            .map_err(|_| MatrixError::Singular { determinant: 0.0 })?;

        Ok(LeastSquares {
            solution: Self { data: solution },
            rank,
            singular_values,
        })
    }

    fn check_same_shape(&self, operation: &'static str, other: &Matrix) -> Result<(), MatrixError> {
        if self.shape() != other.shape() {
            return Err(MatrixError::DimensionMismatch {
                operation,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    fn require_square(&self, operation: &'static str) -> Result<(), MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare {
                operation,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(())
    }
}

fn off_diagonal_norm(a: &DMatrix<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                sum += a[(i, j)] * a[(i, j)];
            }
        }
    }
    sum.sqrt()
}

fn jacobi_eigen(matrix: &DMatrix<f64>) -> Result<(Vec<f64>, DMatrix<f64>), MatrixError> {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = DMatrix::<f64>::identity(n, n);
    let scale = matrix.norm();

    let converged = |a: &DMatrix<f64>| off_diagonal_norm(a) <= EIGEN_TOLERANCE * scale;

    let mut sweeps = 0;
    while !converged(&a) {
        if sweeps == MAX_JACOBI_SWEEPS {
            return Err(MatrixError::NonConvergence {
                operation: "symmetric_eigen",
                sweeps,
            });
        }
        sweeps += 1;

        for p in 0..n.saturating_sub(1) {
            for q in (p + 1)..n {
                let apq = a[(p, q)];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[(k, p)];
                    let akq = a[(k, q)];
                    a[(k, p)] = c * akp - s * akq;
                    a[(k, q)] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[(p, k)];
                    let aqk = a[(q, k)];
                    a[(p, k)] = c * apk - s * aqk;
                    a[(q, k)] = s * apk + c * aqk;
                }
                a[(p, q)] = 0.0;
                a[(q, p)] = 0.0;

                for k in 0..n {
                    let vkp = v[(k, p)];
                    let vkq = v[(k, q)];
                    v[(k, p)] = c * vkp - s * vkq;
                    v[(k, q)] = s * vkp + c * vkq;
                }
            }
        }
    }

    Ok(((0..n).map(|i| a[(i, i)]).collect(), v))
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index]
    }
}

impl From<DMatrix<f64>> for Matrix {
    fn from(data: DMatrix<f64>) -> Self {
        Self { data }
    }
}

impl From<Matrix3<f64>> for Matrix {
    fn from(m: Matrix3<f64>) -> Self {
        Self {
            data: DMatrix::from_column_slice(3, 3, m.as_slice()),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:>11.3e}", self.data[(row, col)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn approx_eq(a: &Matrix, b: &Matrix, tol: f64) -> bool {
        a.shape() == b.shape() && (a.as_nalgebra() - b.as_nalgebra()).amax() < tol
    }

    fn sample_symmetric() -> Matrix {
        Matrix::from_row_slice(3, 3, &[4.0, 1.0, -2.0, 1.0, 2.0, 0.5, -2.0, 0.5, -3.0]).unwrap()
    }

    #[test]
    fn from_row_slice_rejects_wrong_value_count() {
        let result = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn from_row_slice_fills_row_major() {
        let m = Matrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m.shape(), (2, 3));
    }

    #[test]
    fn add_and_subtract_require_equal_shapes() {
        let a = Matrix::new(2, 2);
        let b = Matrix::new(2, 3);
        assert!(matches!(
            a.try_add(&b),
            Err(MatrixError::DimensionMismatch { operation: "add", .. })
        ));
        assert!(matches!(
            a.try_sub(&b),
            Err(MatrixError::DimensionMismatch { operation: "subtract", .. })
        ));
    }

    #[test]
    fn multiply_checks_inner_dimension() {
        let a = Matrix::new(2, 3);
        let b = Matrix::new(2, 3);
        assert!(a.try_mul(&b).is_err());
        let product = a.try_mul(&b.transpose()).unwrap();
        assert_eq!(product.shape(), (2, 2));
    }

    #[test]
    fn multiply_computes_expected_product() {
        let a = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Matrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]).unwrap();
        let expected = Matrix::from_row_slice(2, 2, &[2.0, 1.0, 4.0, 3.0]).unwrap();
        assert!(approx_eq(&a.try_mul(&b).unwrap(), &expected, TOLERANCE));
    }

    #[test]
    fn scale_and_transpose_behave_elementwise() {
        let a = Matrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = a.scale(2.0).transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t[(2, 1)], 12.0);
        assert_eq!(t[(0, 1)], 8.0);
    }

    #[test]
    fn inverse_of_well_conditioned_matrix_round_trips() {
        let a = Matrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]).unwrap();
        let inv = a.inverse().unwrap();
        assert!(approx_eq(&a.try_mul(&inv).unwrap(), &Matrix::identity(2), TOLERANCE));
    }

    #[test]
    fn inverse_fails_for_singular_matrix() {
        let a = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]).unwrap();
        assert!(matches!(a.inverse(), Err(MatrixError::Singular { .. })));
    }

    #[test]
    fn inverse_fails_for_non_square_matrix() {
        let a = Matrix::new(2, 3);
        assert!(matches!(a.inverse(), Err(MatrixError::NotSquare { .. })));
    }

    #[test]
    fn symmetric_eigen_reconstructs_input() {
        let a = sample_symmetric();
        let eigen = a.symmetric_eigen(EigenOrder::default()).unwrap();
        let d = Matrix::from_diagonal(&eigen.values);
        let v = &eigen.vectors;
        let rebuilt = v.try_mul(&d).unwrap().try_mul(&v.transpose()).unwrap();
        assert!(approx_eq(&rebuilt, &a, 1e-9));
    }

    #[test]
    fn symmetric_eigen_vectors_are_orthonormal() {
        let eigen = sample_symmetric()
            .symmetric_eigen(EigenOrder::Ascending)
            .unwrap();
        let v = &eigen.vectors;
        let vtv = v.transpose().try_mul(v).unwrap();
        assert!(approx_eq(&vtv, &Matrix::identity(3), 1e-9));
    }

    #[test]
    fn symmetric_eigen_honours_requested_order() {
        let a = Matrix::from_diagonal(&[1.0, -5.0, 3.0]);

        let desc_mag = a.symmetric_eigen(EigenOrder::DescendingMagnitude).unwrap();
        assert_eq!(desc_mag.values, vec![-5.0, 3.0, 1.0]);

        let asc_mag = a.symmetric_eigen(EigenOrder::AscendingMagnitude).unwrap();
        assert_eq!(asc_mag.values, vec![1.0, 3.0, -5.0]);

        let asc = a.symmetric_eigen(EigenOrder::Ascending).unwrap();
        assert_eq!(asc.values, vec![-5.0, 1.0, 3.0]);

        let desc = a.symmetric_eigen(EigenOrder::Descending).unwrap();
        assert_eq!(desc.values, vec![3.0, 1.0, -5.0]);
        assert_eq!(desc.vectors[(2, 0)], 1.0);
    }

    #[test]
    fn symmetric_eigen_rejects_asymmetric_input() {
        let a = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]).unwrap();
        assert!(matches!(
            a.symmetric_eigen(EigenOrder::default()),
            Err(MatrixError::NotSymmetric { .. })
        ));
    }

    #[test]
    fn symmetric_eigen_of_zero_matrix_is_trivial() {
        let eigen = Matrix::new(3, 3)
            .symmetric_eigen(EigenOrder::default())
            .unwrap();
        assert_eq!(eigen.values, vec![0.0, 0.0, 0.0]);
        assert_eq!(eigen.vectors, Matrix::identity(3));
    }

    #[test]
    fn least_squares_recovers_exact_solution() {
        let a = Matrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, -1.0]).unwrap();
        let x = Matrix::column_vector(&[0.5, -1.5]);
        let b = a.try_mul(&x).unwrap();

        let fit = a.solve_least_squares(&b).unwrap();
        assert_eq!(fit.rank, 2);
        assert!(approx_eq(&fit.solution, &x, 1e-12));
    }

    #[test]
    fn least_squares_reports_rank_deficiency() {
        let a = Matrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]).unwrap();
        let b = Matrix::column_vector(&[1.0, 2.0, 3.0]);
        let fit = a.solve_least_squares(&b).unwrap();
        assert_eq!(fit.rank, 1);
    }

    #[test]
    fn least_squares_checks_rhs_rows() {
        let a = Matrix::new(3, 2);
        let b = Matrix::column_vector(&[1.0, 2.0]);
        assert!(matches!(
            a.solve_least_squares(&b),
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn least_squares_rejects_non_finite_entries() {
        let mut a = Matrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
        let b = Matrix::column_vector(&[1.0, 2.0, 3.0]);
        a.set(1, 0, f64::NAN);
        assert!(matches!(
            a.solve_least_squares(&b),
            Err(MatrixError::NonFinite { .. })
        ));

        let a = Matrix::identity(3);
        let b = Matrix::column_vector(&[1.0, f64::INFINITY, 0.0]);
        assert!(matches!(
            a.solve_least_squares(&b),
            Err(MatrixError::NonFinite { .. })
        ));
    }

    #[test]
    fn matrix3_conversion_preserves_layout() {
        let a = sample_symmetric();
        let m3 = a.to_matrix3().unwrap();
        assert_eq!(m3[(0, 2)], -2.0);
        assert_eq!(Matrix::from(m3), a);
        assert!(Matrix::new(2, 2).to_matrix3().is_none());
    }
}
