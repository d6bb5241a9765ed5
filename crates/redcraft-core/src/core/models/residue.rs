use nalgebra::Point3;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AminoAcidType {
    // --- Aliphatic, Nonpolar ---
    Alanine,
    Glycine,
    Isoleucine,
    Leucine,
    Proline,
    Valine,

    // --- Aromatic ---
    Phenylalanine,
    Tryptophan,
    Tyrosine,

    // --- Polar, Uncharged ---
    Asparagine,
    Cysteine,
    Glutamine,
    Serine,
    Threonine,
    Methionine,

    // --- Positively Charged (Basic) ---
    Arginine,
    Lysine,

    // --- Negatively Charged (Acidic) ---
    AsparticAcid,
    GlutamicAcid,

    // --- Histidine and its protonation variants ---
    Histidine,
    HistidineDelta,
    HistidineEpsilon,
    HistidineProtonated,
}

static THREE_LETTER_CODES: Map<&'static str, AminoAcidType> = phf_map! {
    "ALA" => AminoAcidType::Alanine,
    "GLY" => AminoAcidType::Glycine,
    "ILE" => AminoAcidType::Isoleucine,
    "LEU" => AminoAcidType::Leucine,
    "PRO" => AminoAcidType::Proline,
    "VAL" => AminoAcidType::Valine,
    "PHE" => AminoAcidType::Phenylalanine,
    "TRP" => AminoAcidType::Tryptophan,
    "TYR" => AminoAcidType::Tyrosine,
    "ASN" => AminoAcidType::Asparagine,
    "CYS" => AminoAcidType::Cysteine,
    "CYX" => AminoAcidType::Cysteine,
    "GLN" => AminoAcidType::Glutamine,
    "SER" => AminoAcidType::Serine,
    "THR" => AminoAcidType::Threonine,
    "MET" => AminoAcidType::Methionine,
    "MSE" => AminoAcidType::Methionine,
    "ARG" => AminoAcidType::Arginine,
    "LYS" => AminoAcidType::Lysine,
    "ASP" => AminoAcidType::AsparticAcid,
    "GLU" => AminoAcidType::GlutamicAcid,
    "HIS" => AminoAcidType::Histidine,
    "HSD" => AminoAcidType::HistidineDelta,
    "HID" => AminoAcidType::HistidineDelta,
    "HSE" => AminoAcidType::HistidineEpsilon,
    "HIE" => AminoAcidType::HistidineEpsilon,
    "HSP" => AminoAcidType::HistidineProtonated,
    "HIP" => AminoAcidType::HistidineProtonated,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown residue name: '{0}'")]
pub struct ParseAminoAcidError(pub String);

impl FromStr for AminoAcidType {
    type Err = ParseAminoAcidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        THREE_LETTER_CODES
            .get(code.as_str())
            .copied()
            .ok_or_else(|| ParseAminoAcidError(s.trim().to_string()))
    }
}

impl AminoAcidType {
    pub fn three_letter_code(&self) -> &'static str {
        match self {
            Self::Alanine => "ALA",
            Self::Glycine => "GLY",
            Self::Isoleucine => "ILE",
            Self::Leucine => "LEU",
            Self::Proline => "PRO",
            Self::Valine => "VAL",
            Self::Phenylalanine => "PHE",
            Self::Tryptophan => "TRP",
            Self::Tyrosine => "TYR",
            Self::Asparagine => "ASN",
            Self::Cysteine => "CYS",
            Self::Glutamine => "GLN",
            Self::Serine => "SER",
            Self::Threonine => "THR",
            Self::Methionine => "MET",
            Self::Arginine => "ARG",
            Self::Lysine => "LYS",
            Self::AsparticAcid => "ASP",
            Self::GlutamicAcid => "GLU",
            Self::Histidine => "HIS",
            Self::HistidineDelta => "HSD",
            Self::HistidineEpsilon => "HSE",
            Self::HistidineProtonated => "HSP",
        }
    }

    pub fn has_beta_carbon(&self) -> bool {
        !matches!(self, Self::Glycine)
    }

    pub fn has_amide_hydrogen(&self) -> bool {
        !matches!(self, Self::Proline)
    }
}

impl fmt::Display for AminoAcidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.three_letter_code())
    }
}

/// The backbone (and Cβ) atoms tracked for every residue, in PDB output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneAtom {
    N,
    H,
    CA,
    HA,
    CB,
    C,
    O,
}

impl BackboneAtom {
    pub const ALL: [BackboneAtom; 7] = [
        Self::N,
        Self::H,
        Self::CA,
        Self::HA,
        Self::CB,
        Self::C,
        Self::O,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::H => "H",
            Self::CA => "CA",
            Self::HA => "HA",
            Self::CB => "CB",
            Self::C => "C",
            Self::O => "O",
        }
    }

    pub fn element(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::H | Self::HA => "H",
            Self::CA | Self::CB | Self::C => "C",
            Self::O => "O",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// One residue of a built backbone.
///
/// `name` is kept verbatim from the input; `amino_acid` is `None` for names the
/// residue table does not recognize (they are built like alanine).
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub index: usize,
    pub name: String,
    pub amino_acid: Option<AminoAcidType>,
    pub phi: f64,
    pub psi: f64,
    atoms: [Option<Point3<f64>>; 7],
}

impl Residue {
    pub(crate) fn new(index: usize, name: &str, phi: f64, psi: f64) -> Self {
        let name = name.trim().to_ascii_uppercase();
        Self {
            index,
            amino_acid: name.parse().ok(),
            name,
            phi,
            psi,
            atoms: [None; 7],
        }
    }

    pub fn atom(&self, atom: BackboneAtom) -> Option<Point3<f64>> {
        self.atoms[atom.slot()]
    }

    pub(crate) fn set_atom(&mut self, atom: BackboneAtom, position: Point3<f64>) {
        self.atoms[atom.slot()] = Some(position);
    }

    /// Present atoms in PDB output order.
    pub fn atoms(&self) -> impl Iterator<Item = (BackboneAtom, Point3<f64>)> + '_ {
        BackboneAtom::ALL
            .iter()
            .filter_map(|&atom| self.atom(atom).map(|position| (atom, position)))
    }

    pub(crate) fn atoms_mut(&mut self) -> impl Iterator<Item = &mut Point3<f64>> {
        self.atoms.iter_mut().flatten()
    }

    pub fn has_beta_carbon(&self) -> bool {
        self.amino_acid.is_none_or(|aa| aa.has_beta_carbon())
    }

    pub fn has_amide_hydrogen(&self) -> bool {
        self.amino_acid.is_none_or(|aa| aa.has_amide_hydrogen())
    }
}
