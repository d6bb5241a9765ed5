//! Reading experimental RDC tables and writing fitted structures.
//!
//! Inputs are the plain-text per-medium coupling tables ([`rdc_table`]).
//! Outputs share the [`traits::StructureFile`] interface: PDB coordinates of a
//! built chain ([`pdb`]) and REDCAT-format coupling rows ([`redcat`]).

pub mod pdb;
pub mod rdc_table;
pub mod redcat;
pub mod traits;
