use crate::core::linalg::{Matrix, MatrixError};
use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};
use thiserror::Error;

/// Tolerance for `RᵀR = I` and `det R = 1` when validating a rotation matrix.
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RotationError {
    #[error("Matrix is not a proper rotation (orthonormality error {orthonormality:e}, determinant {determinant})")]
    NotRotation {
        orthonormality: f64,
        determinant: f64,
    },

    #[error("Rotation requires a 3x3 matrix: {source}")]
    Shape {
        #[from]
        source: MatrixError,
    },
}

/// A proper rigid rotation in three dimensions.
///
/// Used to carry a backbone from its molecular frame into a principal alignment
/// frame and to re-express order tensors in a shared reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation(Rotation3<f64>);

impl Rotation {
    pub fn identity() -> Self {
        Self(Rotation3::identity())
    }

    /// Validates a 3x3 matrix as orthonormal with determinant +1.
    pub fn from_matrix(matrix: &Matrix) -> Result<Self, RotationError> {
        let m = matrix.to_matrix3().ok_or(MatrixError::DimensionMismatch {
            operation: "rotation",
            left: matrix.shape(),
            right: (3, 3),
        })?;
        Self::from_matrix3(m)
    }

    pub fn from_matrix3(m: Matrix3<f64>) -> Result<Self, RotationError> {
        let orthonormality = (m.transpose() * m - Matrix3::identity()).amax();
        let determinant = m.determinant();
        if orthonormality > ORTHONORMAL_TOLERANCE
            || (determinant - 1.0).abs() > ORTHONORMAL_TOLERANCE
        {
            return Err(RotationError::NotRotation {
                orthonormality,
                determinant,
            });
        }
        Ok(Self(Rotation3::from_matrix_unchecked(m)))
    }

    /// Rotation by `angle_degrees` about `axis` (right-hand rule).
    pub fn from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Self {
        Self(Rotation3::from_axis_angle(
            &Unit::new_normalize(*axis),
            angle_degrees.to_radians(),
        ))
    }

    /// Active z-y-z Euler rotation `Rz(alpha) · Ry(beta) · Rz(gamma)`, angles in degrees.
    pub fn from_euler_zyz(alpha: f64, beta: f64, gamma: f64) -> Self {
        let rz = |angle: f64| Rotation3::from_axis_angle(&Vector3::z_axis(), angle.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), beta.to_radians());
        Self(rz(alpha) * ry * rz(gamma))
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.0 * point
    }

    pub fn apply_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.0 * vector
    }

    /// `self ∘ other`: the result applies `other` first, then `self`.
    pub fn compose(&self, other: &Rotation) -> Rotation {
        Self(self.0 * other.0)
    }

    /// The inverse rotation.
    pub fn transpose(&self) -> Rotation {
        Self(self.0.transpose())
    }

    pub fn matrix3(&self) -> Matrix3<f64> {
        *self.0.matrix()
    }

    pub fn matrix(&self) -> Matrix {
        Matrix::from(self.matrix3())
    }

    pub fn as_nalgebra(&self) -> &Rotation3<f64> {
        &self.0
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Rotation3<f64>> for Rotation {
    fn from(rotation: Rotation3<f64>) -> Self {
        Self(rotation)
    }
}
