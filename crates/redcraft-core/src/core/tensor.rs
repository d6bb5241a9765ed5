//! Saupe order (alignment) tensors.
//!
//! An [`OrderTensor`] is a traceless symmetric 3x3 tensor stored as its five
//! independent components `Sxx, Syy, Sxy, Sxz, Syz` (`Szz = -Sxx - Syy`).
//!
//! Tensors determined from different media (or different structures) live in
//! arbitrary molecular frames, so comparing them requires a shared frame. This
//! module provides the decomposition into principal values and a proper
//! rotation with a fully pinned axis order and sign convention, the
//! canonicalization built on it, and the order-tensor-matrix (OTM) distance.
//!
//! ## Axis convention
//!
//! Principal values are ordered `|Sxx| <= |Syy| <= |Szz|`. The x and y
//! eigenvectors are each flipped so that their largest-magnitude component is
//! positive (ties resolved toward the lowest index) and z is taken as `x × y`,
//! which makes the rotation proper. Any two correct eigen-solvers agree after
//! this step, even though they may disagree before it.

use crate::core::linalg::{EigenOrder, Matrix, MatrixError};
use crate::core::rotation::Rotation;
use nalgebra::{Matrix3, Vector3};
use std::fmt;
use thiserror::Error;

/// Relative tolerance for the symmetry and trace checks in [`OrderTensor::from_matrix`].
const SHAPE_TOLERANCE: f64 = 1e-9;

/// Off-diagonal entries smaller than this fraction of the tensor norm are
/// treated as zero when choosing canonical signs.
const SIGN_TOLERANCE: f64 = 1e-12;

/// Principal magnitudes closer than this fraction of the largest one count as
/// tied; tied values are then ordered by signed value.
const TIE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TensorError {
    #[error("Invalid order tensor shape: {0}")]
    InvalidShape(String),

    #[error("Matrix operation failed: {source}")]
    Matrix {
        #[from]
        source: MatrixError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrderTensor {
    pub sxx: f64,
    pub syy: f64,
    pub sxy: f64,
    pub sxz: f64,
    pub syz: f64,
}

/// Principal values (ordered by magnitude, ascending) and the proper rotation
/// whose columns are the matching principal axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalFrame {
    pub values: [f64; 3],
    pub rotation: Rotation,
}

impl PrincipalFrame {
    /// The diagonal saturation matrix `diag(Sxx, Syy, Szz)`.
    pub fn saturation(&self) -> Matrix {
        Matrix::from_diagonal(&self.values)
    }

    /// `R · S · Rᵀ`, the tensor in the frame it was decomposed from.
    pub fn reconstruct(&self) -> OrderTensor {
        let r = self.rotation.matrix3();
        let s = Matrix3::from_diagonal(&Vector3::from(self.values));
        OrderTensor::from_matrix3_unchecked(&(r * s * r.transpose()))
    }
}

impl OrderTensor {
    pub fn new(sxx: f64, syy: f64, sxy: f64, sxz: f64, syz: f64) -> Self {
        Self {
            sxx,
            syy,
            sxy,
            sxz,
            syz,
        }
    }

    pub fn from_components(components: [f64; 5]) -> Self {
        let [sxx, syy, sxy, sxz, syz] = components;
        Self::new(sxx, syy, sxy, sxz, syz)
    }

    /// Accepts either a 5-element component vector (5x1 or 1x5) or a symmetric,
    /// traceless 3x3 matrix.
    pub fn from_matrix(matrix: &Matrix) -> Result<Self, TensorError> {
        match matrix.shape() {
            (5, 1) | (1, 5) => {
                let mut components = [0.0; 5];
                for (i, component) in components.iter_mut().enumerate() {
                    *component = if matrix.rows() == 5 {
                        matrix[(i, 0)]
                    } else {
                        matrix[(0, i)]
                    };
                }
                Ok(Self::from_components(components))
            }
            (3, 3) => {
                let norm = matrix.norm();
                let asymmetry = matrix.asymmetry()?;
                if asymmetry > SHAPE_TOLERANCE * norm {
                    return Err(TensorError::InvalidShape(format!(
                        "matrix is not symmetric (asymmetry {asymmetry:e})"
                    )));
                }
                let trace = matrix.trace()?;
                if trace.abs() > SHAPE_TOLERANCE * norm {
                    return Err(TensorError::InvalidShape(format!(
                        "matrix is not traceless (trace {trace:e})"
                    )));
                }
                Ok(Self::new(
                    matrix[(0, 0)],
                    matrix[(1, 1)],
                    matrix[(0, 1)],
                    matrix[(0, 2)],
                    matrix[(1, 2)],
                ))
            }
            (rows, cols) => Err(TensorError::InvalidShape(format!(
                "expected 3x3 or 5-component matrix, got {rows}x{cols}"
            ))),
        }
    }

    pub(crate) fn from_matrix3_unchecked(m: &Matrix3<f64>) -> Self {
        Self::new(
            m[(0, 0)],
            m[(1, 1)],
            0.5 * (m[(0, 1)] + m[(1, 0)]),
            0.5 * (m[(0, 2)] + m[(2, 0)]),
            0.5 * (m[(1, 2)] + m[(2, 1)]),
        )
    }

    pub fn szz(&self) -> f64 {
        -self.sxx - self.syy
    }

    pub fn components(&self) -> [f64; 5] {
        [self.sxx, self.syy, self.sxy, self.sxz, self.syz]
    }

    pub fn to_matrix3(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.sxx, self.sxy, self.sxz, //
            self.sxy, self.syy, self.syz, //
            self.sxz, self.syz, self.szz(),
        )
    }

    pub fn to_matrix(&self) -> Matrix {
        Matrix::from(self.to_matrix3())
    }

    /// Frobenius norm of the full 3x3 tensor.
    pub fn norm(&self) -> f64 {
        self.to_matrix3().norm()
    }

    /// Expresses the tensor in a rotated frame: `Rᵀ · S · R`.
    pub fn in_frame(&self, frame: &Rotation) -> OrderTensor {
        let r = frame.matrix3();
        Self::from_matrix3_unchecked(&(r.transpose() * self.to_matrix3() * r))
    }

    /// Value of `vᵀ · S · v` for a direction `v`.
    pub fn project(&self, v: &Vector3<f64>) -> f64 {
        v.dot(&(self.to_matrix3() * v))
    }

    /// Splits the tensor into principal values and a proper rotation.
    pub fn decompose(&self) -> Result<PrincipalFrame, TensorError> {
        let eigen = self
            .to_matrix()
            .symmetric_eigen(EigenOrder::AscendingMagnitude)?;
        let vectors = eigen.vectors.to_matrix3().ok_or_else(|| {
            TensorError::InvalidShape("eigenvectors are not 3x3".to_string())
        })?;

        let mut values = [eigen.values[0], eigen.values[1], eigen.values[2]];
        let mut columns = [0, 1, 2];
        // With equal magnitudes and opposite signs (eta = 1) the positive value
        // becomes Szz.
        let tied = (values[2].abs() - values[1].abs()).abs() <= TIE_TOLERANCE * values[2].abs();
        if tied && values[1] > values[2] {
            values.swap(1, 2);
            columns.swap(1, 2);
        }

        let x = pin_sign(vectors.column(columns[0]).into_owned());
        let y = pin_sign(vectors.column(columns[1]).into_owned());
        let z = x.cross(&y);

        let rotation = Rotation::from_matrix3(Matrix3::from_columns(&[x, y, z]))
            .map_err(|e| TensorError::InvalidShape(format!("principal axes: {e}")))?;

        Ok(PrincipalFrame { values, rotation })
    }

    pub fn principal_values(&self) -> Result<[f64; 3], TensorError> {
        Ok(self.decompose()?.values)
    }

    /// The largest-magnitude principal value.
    pub fn axial(&self) -> Result<f64, TensorError> {
        Ok(self.principal_values()?[2])
    }

    /// Asymmetry parameter `(Sxx - Syy) / Szz` in the principal frame; zero
    /// for the null tensor.
    pub fn rhombicity(&self) -> Result<f64, TensorError> {
        let [sxx, syy, szz] = self.principal_values()?;
        if szz == 0.0 {
            return Ok(0.0);
        }
        Ok((sxx - syy) / szz)
    }

    /// The principal-frame (diagonal) representative of this tensor.
    pub fn canonicalize(&self) -> Result<OrderTensor, TensorError> {
        let [sxx, syy, _] = self.decompose()?.values;
        Ok(Self::new(sxx, syy, 0.0, 0.0, 0.0))
    }

    /// Order-tensor-matrix distance: the Frobenius norm of the difference,
    /// normalized by the mean norm of the two tensors.
    ///
    /// Symmetric, zero for identical tensors, and bounded by 2.
    pub fn distance(&self, other: &OrderTensor) -> f64 {
        let scale = 0.5 * (self.norm() + other.norm());
        if scale == 0.0 {
            return 0.0;
        }
        (self.to_matrix3() - other.to_matrix3()).norm() / scale
    }
}

/// Flips `v` so its largest-magnitude component is positive.
fn pin_sign(v: Vector3<f64>) -> Vector3<f64> {
    let mut dominant = 0;
    for i in 1..3 {
        if v[i].abs() > v[dominant].abs() {
            dominant = i;
        }
    }
    if v[dominant] < 0.0 { -v } else { v }
}

/// Sign pattern of a diagonal sign-flip rotation; the product is always +1.
const SIGN_FLIPS: [[f64; 3]; 4] = [
    [1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
];

fn sign_class(value: f64, scale: f64) -> i8 {
    if value.abs() <= SIGN_TOLERANCE * scale {
        0
    } else if value > 0.0 {
        1
    } else {
        -1
    }
}

/// Picks the sign-flip rotation that leaves `Sxy` and then `Sxz` (then `Syz`)
/// non-negative. Such a flip never changes a diagonal tensor.
fn canonical_flip(tensor: &OrderTensor) -> Rotation {
    let scale = tensor.norm();
    let mut best = SIGN_FLIPS[0];
    let mut best_key = None;
    for flip in SIGN_FLIPS {
        let [a, b, c] = flip;
        let key = (
            sign_class(a * b * tensor.sxy, scale),
            sign_class(a * c * tensor.sxz, scale),
            sign_class(b * c * tensor.syz, scale),
        );
        if best_key.is_none_or(|current| key > current) {
            best_key = Some(key);
            best = flip;
        }
    }
    Rotation::from(nalgebra::Rotation3::from_matrix_unchecked(
        Matrix3::from_diagonal(&Vector3::from(best)),
    ))
}

/// Brings a set of per-medium tensors into one shared frame.
///
/// The first medium's principal frame becomes the reference; the second
/// medium's tensor then fixes the remaining sign ambiguity of that frame. The
/// first tensor of the output is always diagonal.
pub fn canonicalize_set(tensors: &[OrderTensor]) -> Result<Vec<OrderTensor>, TensorError> {
    let Some(first) = tensors.first() else {
        return Ok(Vec::new());
    };

    let frame = first.decompose()?;
    let mut reference = frame.rotation;
    if let Some(second) = tensors.get(1) {
        let flip = canonical_flip(&second.in_frame(&reference));
        reference = reference.compose(&flip);
    }

    let [sxx, syy, _] = frame.values;
    let mut canonical = Vec::with_capacity(tensors.len());
    canonical.push(OrderTensor::new(sxx, syy, 0.0, 0.0, 0.0));
    canonical.extend(tensors[1..].iter().map(|t| t.in_frame(&reference)));
    Ok(canonical)
}

/// Sum of per-medium distances, without any frame alignment.
pub fn multi_tensor_distance(a: &[OrderTensor], b: &[OrderTensor]) -> Result<f64, TensorError> {
    check_same_media(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x.distance(y)).sum())
}

/// Per-medium OTM distances after canonicalizing both sets independently.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorDistances {
    pub per_medium: Vec<f64>,
    pub total: f64,
}

pub fn canonical_distance(
    a: &[OrderTensor],
    b: &[OrderTensor],
) -> Result<TensorDistances, TensorError> {
    check_same_media(a, b)?;
    let ca = canonicalize_set(a)?;
    let cb = canonicalize_set(b)?;
    let per_medium: Vec<f64> = ca.iter().zip(&cb).map(|(x, y)| x.distance(y)).collect();
    let total = per_medium.iter().sum();
    Ok(TensorDistances { per_medium, total })
}

fn check_same_media(a: &[OrderTensor], b: &[OrderTensor]) -> Result<(), TensorError> {
    if a.len() != b.len() {
        return Err(TensorError::InvalidShape(format!(
            "tensor sets cover different media counts ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

impl fmt::Display for OrderTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.to_matrix3();
        for row in 0..3 {
            writeln!(
                f,
                "{:>11.3e} {:>11.3e} {:>11.3e}",
                m[(row, 0)],
                m[(row, 1)],
                m[(row, 2)]
            )?;
        }
        Ok(())
    }
}
