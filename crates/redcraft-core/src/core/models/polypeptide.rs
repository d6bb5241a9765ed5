use super::bond::BondVectorKind;
use super::residue::{BackboneAtom, Residue};
use crate::core::forcefield::params::CaEnergyParams;
use crate::core::io::pdb::{PdbFile, PdbMetadata};
use crate::core::io::traits::StructureFile;
use crate::core::rotation::Rotation;
use crate::core::utils::geometry::{calculate_hn_position, place_atom, unit_vector};
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::trace;

/// Name given to the terminal cap residue appended by [`Polypeptide::close`].
pub const CAP_RESIDUE_NAME: &str = "NME";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Cannot extend a chain that has already been closed")]
    Closed,
    #[error("Chain must be closed before it can be evaluated")]
    NotClosed,
    #[error("Chain has no residues")]
    EmptyChain,
    #[error("Residue index {index} is out of range for a chain of {count} residues")]
    ResidueOutOfRange { index: usize, count: usize },
    #[error("Residue {index} is missing one of its N, CA or C atoms")]
    IncompleteBackbone { index: usize },
}

/// Ideal backbone bond lengths (Å) and angles (degrees).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct BackboneGeometry {
    pub n_ca: f64,
    pub ca_c: f64,
    pub c_n: f64,
    pub c_o: f64,
    pub n_h: f64,
    pub ca_ha: f64,
    pub ca_cb: f64,
    pub n_ca_c: f64,
    pub ca_c_n: f64,
    pub c_n_ca: f64,
    pub ca_c_o: f64,
    pub omega: f64,
    pub c_ca_cb: f64,
    /// Improper torsion N-C-CA-CB; positive for L residues.
    pub n_c_ca_cb: f64,
    pub c_ca_ha: f64,
    pub n_c_ca_ha: f64,
}

impl Default for BackboneGeometry {
    fn default() -> Self {
        Self {
            n_ca: 1.458,
            ca_c: 1.525,
            c_n: 1.329,
            c_o: 1.231,
            n_h: 1.02,
            ca_ha: 1.09,
            ca_cb: 1.53,
            n_ca_c: 111.2,
            ca_c_n: 116.2,
            c_n_ca: 121.7,
            ca_c_o: 120.5,
            omega: 180.0,
            c_ca_cb: 110.1,
            n_c_ca_cb: 122.7,
            c_ca_ha: 109.5,
            n_c_ca_ha: -118.0,
        }
    }
}

/// A protein backbone built residue by residue from torsion angles.
///
/// Residue `i`'s atoms depend only on the angles of residues `0..=i`, so the
/// chain can be extended incrementally. [`Polypeptide::close`] appends a cap
/// residue (N, H and CA only) that completes the last peptide bond; the cap is
/// never counted by [`Polypeptide::residue_count`].
#[derive(Debug, Clone, PartialEq)]
pub struct Polypeptide {
    geometry: BackboneGeometry,
    residues: Vec<Residue>,
    closed: bool,
}

impl Polypeptide {
    pub fn new(geometry: BackboneGeometry) -> Self {
        Self {
            geometry,
            residues: Vec::new(),
            closed: false,
        }
    }

    /// Builds and closes a chain from `(phi, psi)` pairs and matching residue names.
    pub fn from_torsions<S: AsRef<str>>(
        geometry: BackboneGeometry,
        torsions: &[(f64, f64)],
        names: &[S],
    ) -> Result<Self, BuildError> {
        let mut chain = Self::new(geometry);
        for (i, &(phi, psi)) in torsions.iter().enumerate() {
            let name = names.get(i).map(|n| n.as_ref()).unwrap_or("ALA");
            chain.append_amino_acid(phi, psi, name)?;
        }
        chain.close()?;
        Ok(chain)
    }

    pub fn geometry(&self) -> &BackboneGeometry {
        &self.geometry
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of real residues; the terminal cap is excluded.
    pub fn residue_count(&self) -> usize {
        if self.closed {
            self.residues.len() - 1
        } else {
            self.residues.len()
        }
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        if index < self.residue_count() {
            self.residues.get(index)
        } else {
            None
        }
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues[..self.residue_count()]
    }

    pub fn cap(&self) -> Option<&Residue> {
        if self.closed {
            self.residues.last()
        } else {
            None
        }
    }

    /// Real residues followed by the cap, if any.
    pub fn all_residues(&self) -> &[Residue] {
        &self.residues
    }

    /// Extends the chain by one residue with backbone torsions `phi`, `psi` (degrees).
    pub fn append_amino_acid(&mut self, phi: f64, psi: f64, name: &str) -> Result<(), BuildError> {
        if self.closed {
            return Err(BuildError::Closed);
        }
        let index = self.residues.len();
        let g = self.geometry;
        let mut residue = Residue::new(index, name, phi, psi);

        let (n, ca, c, prev_c) = match self.residues.last() {
            None => {
                let n = Point3::origin();
                let ca = Point3::new(g.n_ca, 0.0, 0.0);
                let theta = (180.0 - g.n_ca_c).to_radians();
                let c = ca + Vector3::new(theta.cos(), theta.sin(), 0.0) * g.ca_c;
                // Virtual C' of a preceding residue, positioned by phi.
                let prev_c = place_atom(&c, &ca, &n, g.c_n, g.c_n_ca, phi);
                (n, ca, c, prev_c)
            }
            Some(prev) => {
                let (pn, pca, pc) = backbone_frame(prev)?;
                let n = place_atom(&pn, &pca, &pc, g.c_n, g.ca_c_n, prev.psi);
                let ca = place_atom(&pca, &pc, &n, g.n_ca, g.c_n_ca, g.omega);
                let c = place_atom(&pc, &n, &ca, g.ca_c, g.n_ca_c, phi);
                (n, ca, c, pc)
            }
        };

        residue.set_atom(BackboneAtom::N, n);
        residue.set_atom(BackboneAtom::CA, ca);
        residue.set_atom(BackboneAtom::C, c);
        residue.set_atom(
            BackboneAtom::O,
            place_atom(&n, &ca, &c, g.c_o, g.ca_c_o, psi + 180.0),
        );
        if residue.has_amide_hydrogen() {
            residue.set_atom(
                BackboneAtom::H,
                calculate_hn_position(&n, &ca, &prev_c, g.n_h),
            );
        }
        residue.set_atom(
            BackboneAtom::HA,
            place_atom(&n, &c, &ca, g.ca_ha, g.c_ca_ha, g.n_c_ca_ha),
        );
        if residue.has_beta_carbon() {
            residue.set_atom(
                BackboneAtom::CB,
                place_atom(&n, &c, &ca, g.ca_cb, g.c_ca_cb, g.n_c_ca_cb),
            );
        }

        trace!(index, name = %residue.name, phi, psi, "Appended residue");
        self.residues.push(residue);
        Ok(())
    }

    /// Appends the terminal cap so the last residue's C-N(i+1) and C-H(i+1)
    /// vectors exist. The chain cannot be extended afterwards.
    pub fn close(&mut self) -> Result<(), BuildError> {
        if self.closed {
            return Err(BuildError::Closed);
        }
        let Some(prev) = self.residues.last() else {
            return Err(BuildError::EmptyChain);
        };
        let g = self.geometry;
        let (pn, pca, pc) = backbone_frame(prev)?;
        let n = place_atom(&pn, &pca, &pc, g.c_n, g.ca_c_n, prev.psi);
        let ca = place_atom(&pca, &pc, &n, g.n_ca, g.c_n_ca, g.omega);

        let mut cap = Residue::new(self.residues.len(), CAP_RESIDUE_NAME, 0.0, 0.0);
        cap.set_atom(BackboneAtom::N, n);
        cap.set_atom(BackboneAtom::H, calculate_hn_position(&n, &ca, &pc, g.n_h));
        cap.set_atom(BackboneAtom::CA, ca);

        self.residues.push(cap);
        self.closed = true;
        Ok(())
    }

    /// Rigidly rotates every atom (cap included) about the origin.
    pub fn rotate(&mut self, rotation: &Rotation) {
        for residue in &mut self.residues {
            for position in residue.atoms_mut() {
                *position = rotation.apply(position);
            }
        }
    }

    /// Position of `atom` in residue `index`; the cap is addressable at
    /// `residue_count()`.
    pub fn atom_position(&self, index: usize, atom: BackboneAtom) -> Option<Point3<f64>> {
        self.residues.get(index)?.atom(atom)
    }

    /// Unit internuclear vector of `kind` for residue `index`, or `None` when
    /// either atom does not exist.
    pub fn bond_vector(&self, index: usize, kind: BondVectorKind) -> Option<Vector3<f64>> {
        let (from, to) = kind.endpoints();
        let a = self.atom_position(index + from.residue_offset, from.atom)?;
        let b = self.atom_position(index + to.residue_offset, to.atom)?;
        unit_vector(&a, &b)
    }

    fn require_closed(&self) -> Result<(), BuildError> {
        if self.closed {
            Ok(())
        } else {
            Err(BuildError::NotClosed)
        }
    }

    fn ca(&self, index: usize) -> Option<Point3<f64>> {
        self.atom_position(index, BackboneAtom::CA)
    }

    /// Lennard-Jones energy of all Cα pairs far enough apart in sequence.
    pub fn vdw_ca(&self, params: &CaEnergyParams) -> Result<f64, BuildError> {
        self.require_closed()?;
        let count = self.residue_count();
        let mut energy = 0.0;
        for i in 0..count {
            for j in (i + 1)..count {
                if params.contributes(i, j) {
                    energy += self.pair_energy(i, j, params);
                }
            }
        }
        Ok(energy)
    }

    /// Cα Lennard-Jones energy of all pairs involving residue `index`.
    pub fn lj_distance(&self, index: usize, params: &CaEnergyParams) -> Result<f64, BuildError> {
        self.require_closed()?;
        let count = self.residue_count();
        if index >= count {
            return Err(BuildError::ResidueOutOfRange { index, count });
        }
        Ok((0..count)
            .filter(|&j| params.contributes(index, j))
            .map(|j| self.pair_energy(index, j, params))
            .sum())
    }

    /// Largest per-residue [`Polypeptide::lj_distance`] over the chain.
    pub fn max_lj_distance(&self, params: &CaEnergyParams) -> Result<f64, BuildError> {
        self.require_closed()?;
        let mut max: Option<f64> = None;
        for i in 0..self.residue_count() {
            let energy = self.lj_distance(i, params)?;
            max = Some(max.map_or(energy, |m| m.max(energy)));
        }
        max.ok_or(BuildError::EmptyChain)
    }

    fn pair_energy(&self, i: usize, j: usize, params: &CaEnergyParams) -> f64 {
        match (self.ca(i), self.ca(j)) {
            (Some(a), Some(b)) => params.pair_energy(nalgebra::distance(&a, &b)),
            _ => 0.0,
        }
    }

    /// Writes the chain (cap included) as PDB, numbering residues from
    /// `first_residue_number`.
    pub fn write_pdb<P: AsRef<Path>>(
        &self,
        path: P,
        first_residue_number: usize,
    ) -> Result<(), std::io::Error> {
        let metadata = PdbMetadata {
            first_residue_number,
            ..PdbMetadata::default()
        };
        PdbFile::write_to_path(self, &metadata, path)
    }
}

fn backbone_frame(residue: &Residue) -> Result<(Point3<f64>, Point3<f64>, Point3<f64>), BuildError> {
    match (
        residue.atom(BackboneAtom::N),
        residue.atom(BackboneAtom::CA),
        residue.atom(BackboneAtom::C),
    ) {
        (Some(n), Some(ca), Some(c)) => Ok((n, ca, c)),
        _ => Err(BuildError::IncompleteBackbone {
            index: residue.index,
        }),
    }
}
