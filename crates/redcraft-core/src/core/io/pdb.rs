use crate::core::io::traits::StructureFile;
use crate::core::models::polypeptide::Polypeptide;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq)]
pub struct PdbMetadata {
    /// Residue sequence number given to the first residue of the chain.
    pub first_residue_number: usize,
    pub chain_id: char,
}

impl Default for PdbMetadata {
    fn default() -> Self {
        Self {
            first_residue_number: 1,
            chain_id: 'A',
        }
    }
}

pub struct PdbFile;

/// PDB atom names are left-justified from column 14 unless they fill all four columns.
fn pdb_atom_name(name: &str) -> String {
    if name.len() >= 4 {
        name.to_string()
    } else {
        format!(" {name:<3}")
    }
}

impl StructureFile for PdbFile {
    type Value = Polypeptide;
    type Metadata = PdbMetadata;
    type Error = io::Error;

    fn write_to(
        chain: &Polypeptide,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let mut serial = 0;
        let mut last = None;
        for (offset, residue) in chain.all_residues().iter().enumerate() {
            let res_seq = metadata.first_residue_number + offset;
            for (atom, position) in residue.atoms() {
                serial += 1;
                writeln!(
                    writer,
                    "ATOM  {:>5} {} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                    serial,
                    pdb_atom_name(atom.name()),
                    residue.name,
                    metadata.chain_id,
                    res_seq,
                    position.x,
                    position.y,
                    position.z,
                    1.0,
                    0.0,
                    atom.element(),
                )?;
            }
            last = Some((residue.name.as_str(), res_seq));
        }

        if let Some((res_name, res_seq)) = last {
            writeln!(
                writer,
                "TER   {:>5}      {:>3} {}{:>4}",
                serial + 1,
                res_name,
                metadata.chain_id,
                res_seq
            )?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::polypeptide::BackboneGeometry;
    use tempfile::tempdir;

    fn two_residue_chain() -> Polypeptide {
        Polypeptide::from_torsions(
            BackboneGeometry::default(),
            &[(-60.0, -45.0), (-65.0, -40.0)],
            &["ALA", "GLY"],
        )
        .unwrap()
    }

    fn render(chain: &Polypeptide, metadata: &PdbMetadata) -> String {
        let mut buffer = Vec::new();
        PdbFile::write_to(chain, metadata, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn writes_fixed_column_atom_records() {
        let text = render(&two_residue_chain(), &PdbMetadata::default());
        let first = text.lines().next().unwrap();
        assert_eq!(
            first,
            "ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N"
        );
        let second = text.lines().nth(2).unwrap();
        assert_eq!(&second[12..16], " CA ");
        assert_eq!(&second[30..38], "   1.458");
        assert!(text.lines().all(|l| !l.starts_with("ATOM") || l.len() == 78));
    }

    #[test]
    fn numbers_residues_from_metadata_and_ends_with_ter() {
        let metadata = PdbMetadata {
            first_residue_number: 3,
            ..PdbMetadata::default()
        };
        let text = render(&two_residue_chain(), &metadata);
        let lines: Vec<_> = text.lines().collect();
        // ALA: 7 atoms, GLY: 6 atoms, cap: 3 atoms.
        assert_eq!(lines.len(), 7 + 6 + 3 + 2);
        assert_eq!(&lines[0][22..26], "   3");
        assert_eq!(&lines[7][17..20], "GLY");
        assert_eq!(&lines[7][22..26], "   4");
        assert_eq!(lines[16], "TER      17      NME A   5");
        assert_eq!(lines[17], "END");
    }

    #[test]
    fn write_to_path_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.pdb");
        std::fs::write(&path, "stale contents\n").unwrap();
        two_residue_chain().write_pdb(&path, 1).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("ATOM"));
        assert!(!text.contains("stale"));
    }
}
