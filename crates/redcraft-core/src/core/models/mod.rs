//! Backbone structure models.
//!
//! - [`residue`] - residue names, amino-acid types and per-residue atom slots
//! - [`bond`] - the internuclear vectors measured by RDC experiments
//! - [`polypeptide`] - incremental backbone construction from torsion angles

pub mod bond;
pub mod polypeptide;
pub mod residue;
