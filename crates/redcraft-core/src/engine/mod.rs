//! # Engine Module
//!
//! Run-level state for evaluating torsion-angle lines against RDC data.
//!
//! - **Configuration** ([`config`]) - physical parameters loaded from TOML and the
//!   per-run [`EvaluateRequest`](config::EvaluateRequest) assembled from CLI flags
//! - **Context** ([`context`]) - the read-only bundle handed to each line
//! - **Error Handling** ([`error`]) - [`EngineError`](error::EngineError), wrapping the
//!   errors of every core layer a line can hit

pub mod config;
pub mod context;
pub mod error;
