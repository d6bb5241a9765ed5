//! Residual dipolar coupling fitting.
//!
//! [`redcat::Redcat`] holds the experimental tables of every alignment medium
//! and solves, per medium, the linear least-squares problem
//!
//! ```text
//! Dmax · [x²-z², y²-z², 2xy, 2xz, 2yz] · [Sxx, Syy, Sxy, Sxz, Syz]ᵀ = D
//! ```
//!
//! for the order tensor that best explains the measured couplings `D` given
//! the unit bond vectors `(x, y, z)` of a built backbone. [`constants`]
//! provides the static coupling constants `Dmax` of each bond kind.

pub mod constants;
pub mod redcat;
