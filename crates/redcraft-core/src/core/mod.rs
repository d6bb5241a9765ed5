//! # Core Module
//!
//! Stateless building blocks of the RDC fitting pipeline.
//!
//! - **Linear algebra** ([`linalg`]) - dimension-checked dense matrices, a Jacobi
//!   eigen-solver and SVD least squares
//! - **Order tensors** ([`tensor`]) - decomposition, canonical frames and distances
//! - **Rotations** ([`rotation`]) and NeRF placement helpers ([`utils::geometry`])
//! - **Structure** ([`models`]) - backbone construction from torsion angles
//! - **Energy** ([`forcefield`]) - the Cα Lennard-Jones contact term
//! - **RDC fitting** ([`rdc`]) - per-medium tensor fits and RMSD
//! - **File I/O** ([`io`]) - RDC tables in, PDB and REDCAT files out

pub mod forcefield;
pub mod io;
pub mod linalg;
pub mod models;
pub mod rdc;
pub mod rotation;
pub mod tensor;
pub mod utils;
