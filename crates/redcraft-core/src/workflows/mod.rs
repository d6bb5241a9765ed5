//! # Workflows Module
//!
//! High-level entry points that tie the [`engine`](crate::engine) and
//! [`core`](crate::core) layers together.
//!
//! - **Evaluation Workflow** ([`evaluate`]) - builds a backbone from one line of
//!   torsion angles, optionally rotates it into the principal alignment frame,
//!   fits an order tensor per alignment medium and gathers the requested reports
//!   and output files into an [`Evaluation`](evaluate::Evaluation).

pub mod evaluate;
