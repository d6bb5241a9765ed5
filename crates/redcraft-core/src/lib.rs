//! # REDCRAFT Core Library
//!
//! Order-tensor fitting of protein backbone conformations against residual
//! dipolar coupling (RDC) data collected in one or more alignment media.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three layers from the leaf types up to the public
//! entry points:
//!
//! - **[`core`]: The Foundation.** Dense linear algebra, Saupe order tensors and
//!   their canonical frames, rotations, the backbone builder, the RDC fitter and the
//!   file formats it reads and writes.
//!
//! - **[`engine`]: Run State.** Configuration loaded from TOML, the per-run
//!   evaluation request, the shared read-only context and the error type that
//!   every line-level failure is folded into.
//!
//! - **[`workflows`]: The Public API.** One call per torsion-angle line that builds,
//!   fits and reports.

pub mod core;
pub mod engine;
pub mod workflows;
