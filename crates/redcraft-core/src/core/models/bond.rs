use super::residue::BackboneAtom;
use std::fmt;

/// The six internuclear vectors an RDC table reports per residue, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondVectorKind {
    /// N(i) - H(i)
    NH,
    /// CA(i) - HA(i)
    CaHa,
    /// CA(i) - C(i)
    CaC,
    /// C(i) - N(i+1)
    CN,
    /// C(i) - H(i+1)
    CH,
    /// N(i) - CA(i)
    NCa,
}

/// One end of a bond vector: an atom of residue `i + residue_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondEnd {
    pub residue_offset: usize,
    pub atom: BackboneAtom,
}

const fn end(residue_offset: usize, atom: BackboneAtom) -> BondEnd {
    BondEnd {
        residue_offset,
        atom,
    }
}

impl BondVectorKind {
    pub const ALL: [BondVectorKind; 6] = [
        Self::NH,
        Self::CaHa,
        Self::CaC,
        Self::CN,
        Self::CH,
        Self::NCa,
    ];

    pub fn column(&self) -> usize {
        *self as usize
    }

    pub fn endpoints(&self) -> (BondEnd, BondEnd) {
        use BackboneAtom::*;
        match self {
            Self::NH => (end(0, N), end(0, H)),
            Self::CaHa => (end(0, CA), end(0, HA)),
            Self::CaC => (end(0, CA), end(0, C)),
            Self::CN => (end(0, C), end(1, N)),
            Self::CH => (end(0, C), end(1, H)),
            Self::NCa => (end(0, N), end(0, CA)),
        }
    }

    /// Reference internuclear distance in Å used for the static coupling.
    pub fn reference_length(&self) -> f64 {
        match self {
            Self::NH => 1.02,
            Self::CaHa => 1.09,
            Self::CaC => 1.525,
            Self::CN => 1.329,
            Self::CH => 2.03,
            Self::NCa => 1.458,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NH => "N-H",
            Self::CaHa => "CA-HA",
            Self::CaC => "CA-C",
            Self::CN => "C-N",
            Self::CH => "C-H",
            Self::NCa => "N-CA",
        }
    }
}

impl fmt::Display for BondVectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_follow_file_order() {
        for (i, kind) in BondVectorKind::ALL.iter().enumerate() {
            assert_eq!(kind.column(), i);
        }
    }

    #[test]
    fn only_peptide_bond_kinds_reach_next_residue() {
        for kind in BondVectorKind::ALL {
            let (from, to) = kind.endpoints();
            assert_eq!(from.residue_offset, 0);
            let reaches_next = matches!(kind, BondVectorKind::CN | BondVectorKind::CH);
            assert_eq!(to.residue_offset == 1, reaches_next, "{kind}");
        }
    }
}
