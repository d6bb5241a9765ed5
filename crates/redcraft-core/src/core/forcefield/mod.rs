//! Pairwise contact energy used to reject sterically implausible backbones.
//!
//! Only a single term is modelled: a Lennard-Jones 12-6 potential between Cα
//! atoms that are far enough apart in sequence. See [`params::CaEnergyParams`].

pub mod params;
pub(crate) mod potentials;
