use super::constants::CouplingConstants;
use crate::core::io::rdc_table::{Coupling, DataError, RdcTable};
use crate::core::io::redcat::{RedcatEntry, RedcatFile};
use crate::core::io::traits::StructureFile;
use crate::core::linalg::{Matrix, MatrixError};
use crate::core::models::bond::BondVectorKind;
use crate::core::models::polypeptide::{BuildError, Polypeptide};
use crate::core::tensor::{OrderTensor, TensorError};
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Number of independent order-tensor components solved for.
const TENSOR_PARAMETERS: usize = 5;

#[derive(Debug, Error)]
pub enum FitError {
    #[error("Medium {medium} has only {usable} usable couplings; at least 5 independent ones are required")]
    InsufficientData { medium: usize, usable: usize },
    #[error("Medium {medium} does not exist ({count} media loaded)")]
    MediumOutOfRange { medium: usize, count: usize },
    #[error("Matrix operation failed: {0}")]
    Matrix(#[from] MatrixError),
    #[error("Order tensor error: {0}")]
    Tensor(#[from] TensorError),
    #[error("Structure error: {0}")]
    Build(#[from] BuildError),
    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Options for the per-medium least-squares fit.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct FitSettings {
    /// Scale each equation by `1/error` when the table gives a positive error.
    pub weighted: bool,
    /// Error written to REDCAT files for couplings without one.
    pub default_error: f64,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            weighted: false,
            default_error: 1.0,
        }
    }
}

/// Result of fitting one medium.
#[derive(Debug, Clone, PartialEq)]
pub struct Fit {
    pub tensor: OrderTensor,
    /// Unweighted root-mean-square deviation in Hz.
    pub rmsd: f64,
    /// Number of couplings that entered the fit.
    pub used: usize,
    /// `predicted - observed` for each used coupling, in fit order.
    pub residuals: Vec<f64>,
}

impl Fit {
    pub fn sum_of_squares(&self) -> f64 {
        self.residuals.iter().map(|r| r * r).sum()
    }
}

/// A coupling that can enter a fit: measured, mapped to an existing data row,
/// and backed by an existing bond vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub residue: usize,
    pub kind: BondVectorKind,
    pub vector: Vector3<f64>,
    pub dmax: f64,
    pub coupling: Coupling,
}

/// Predicted coupling next to the measured one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackCalculated {
    pub residue: usize,
    pub kind: BondVectorKind,
    pub observed: f64,
    pub predicted: f64,
}

/// Experimental RDC tables for every alignment medium and the fitting logic
/// that confronts a built backbone with them.
///
/// Residue `i` of a chain is matched with row `i + offset` of every table.
#[derive(Debug, Clone, PartialEq)]
pub struct Redcat {
    media: Vec<RdcTable>,
    offset: usize,
    constants: CouplingConstants,
    settings: FitSettings,
}

impl Redcat {
    /// Loads `<data_path>/<prefix>.1` through `<data_path>/<prefix>.<media_count>`.
    pub fn load(
        data_path: &Path,
        prefix: &str,
        media_count: usize,
        constants: CouplingConstants,
        settings: FitSettings,
    ) -> Result<Self, DataError> {
        let media = (1..=media_count)
            .map(|m| {
                let path = data_path.join(format!("{prefix}.{m}"));
                let table = RdcTable::read_from_path(&path)?;
                debug!(path = %path.display(), rows = table.len(), "Loaded RDC table");
                Ok(table)
            })
            .collect::<Result<Vec<_>, DataError>>()?;
        Ok(Self::from_tables(media, constants, settings))
    }

    pub fn from_tables(
        media: Vec<RdcTable>,
        constants: CouplingConstants,
        settings: FitSettings,
    ) -> Self {
        Self {
            media,
            offset: 0,
            constants,
            settings,
        }
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.set_offset(offset);
        self
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    pub fn constants(&self) -> &CouplingConstants {
        &self.constants
    }

    pub fn table(&self, medium: usize) -> Result<&RdcTable, FitError> {
        self.media.get(medium).ok_or(FitError::MediumOutOfRange {
            medium,
            count: self.media.len(),
        })
    }

    /// Residue name for chain position `index`, taken from the first medium at
    /// row `index + offset`. Positions past the table default to alanine.
    pub fn residue_name(&self, index: usize) -> &str {
        self.media
            .first()
            .and_then(|table| table.row(index + self.offset))
            .map_or("ALA", |row| row.name.as_str())
    }

    pub fn residue_names(&self, count: usize) -> Vec<String> {
        (0..count).map(|i| self.residue_name(i).to_string()).collect()
    }

    /// Residues in `0..residue_count` whose mapped row exists and carries at
    /// least one measured coupling.
    pub fn reduced_rdc_count(&self, medium: usize, residue_count: usize) -> Result<usize, FitError> {
        let table = self.table(medium)?;
        Ok((0..residue_count)
            .filter(|&i| table.row(i + self.offset).is_some_and(|row| row.has_usable()))
            .count())
    }

    /// Every coupling of `medium` that can be confronted with the chain.
    pub fn observations(&self, chain: &Polypeptide, medium: usize) -> Result<Vec<Observation>, FitError> {
        let table = self.table(medium)?;
        let mut observations = Vec::new();
        for residue in 0..chain.residue_count() {
            let Some(row) = table.row(residue + self.offset) else {
                continue;
            };
            for kind in BondVectorKind::ALL {
                let Some(coupling) = row.couplings[kind.column()] else {
                    continue;
                };
                let Some(vector) = chain.bond_vector(residue, kind) else {
                    continue;
                };
                observations.push(Observation {
                    residue,
                    kind,
                    vector,
                    dmax: self.constants.dmax(kind),
                    coupling,
                });
            }
        }
        Ok(observations)
    }

    fn weight(&self, coupling: &Coupling) -> f64 {
        match coupling.error {
            Some(error) if self.settings.weighted && error > 0.0 => 1.0 / error,
            _ => 1.0,
        }
    }

    /// Least-squares order tensor for `medium` and the RMSD it leaves.
    pub fn calculate_rmsd(&self, chain: &Polypeptide, medium: usize) -> Result<Fit, FitError> {
        if !chain.is_closed() {
            return Err(BuildError::NotClosed.into());
        }
        let observations = self.observations(chain, medium)?;
        let usable = observations.len();
        if usable < TENSOR_PARAMETERS {
            return Err(FitError::InsufficientData { medium, usable });
        }

        let mut design = Matrix::new(usable, TENSOR_PARAMETERS);
        let mut rhs = Matrix::new(usable, 1);
        for (row, obs) in observations.iter().enumerate() {
            let w = self.weight(&obs.coupling);
            let v = obs.vector;
            let coefficients = [
                v.x * v.x - v.z * v.z,
                v.y * v.y - v.z * v.z,
                2.0 * v.x * v.y,
                2.0 * v.x * v.z,
                2.0 * v.y * v.z,
            ];
            for (col, c) in coefficients.iter().enumerate() {
                design.set(row, col, w * obs.dmax * c);
            }
            rhs.set(row, 0, w * obs.coupling.value);
        }

        let solved = design.solve_least_squares(&rhs)?;
        if solved.rank < TENSOR_PARAMETERS {
            return Err(FitError::InsufficientData { medium, usable });
        }
        let tensor = OrderTensor::from_matrix(&solved.solution)?;

        let residuals: Vec<f64> = observations
            .iter()
            .map(|obs| obs.dmax * tensor.project(&obs.vector) - obs.coupling.value)
            .collect();
        let rmsd = (residuals.iter().map(|r| r * r).sum::<f64>() / usable as f64).sqrt();
        debug!(medium, used = usable, rmsd, "Fitted order tensor");

        Ok(Fit {
            tensor,
            rmsd,
            used: usable,
            residuals,
        })
    }

    /// Fits every medium; `None` marks a medium without enough data.
    pub fn fit_all(&self, chain: &Polypeptide) -> Result<Vec<Option<Fit>>, FitError> {
        (0..self.media.len())
            .map(|medium| match self.calculate_rmsd(chain, medium) {
                Ok(fit) => Ok(Some(fit)),
                Err(FitError::InsufficientData { medium, usable }) => {
                    warn!(medium, usable, "Skipping medium with insufficient data");
                    Ok(None)
                }
                Err(e) => Err(e),
            })
            .collect()
    }

    /// RMSD pooled over every medium that can be fitted:
    /// `sqrt(Σ residual² / Σ used)`.
    pub fn calculate_total_rmsd(&self, chain: &Polypeptide) -> Result<f64, FitError> {
        let fits = self.fit_all(chain)?;
        Self::pooled_rmsd(&fits).ok_or(FitError::InsufficientData {
            medium: 0,
            usable: fits.iter().flatten().map(|f| f.used).sum(),
        })
    }

    /// Pooled RMSD of already computed fits, or `None` if none succeeded.
    pub fn pooled_rmsd(fits: &[Option<Fit>]) -> Option<f64> {
        let (sum, count) = fits
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, count), fit| {
                (sum + fit.sum_of_squares(), count + fit.used)
            });
        (count > 0).then(|| (sum / count as f64).sqrt())
    }

    /// Couplings predicted by `tensor` for every usable coupling of `medium`.
    pub fn back_calculate(
        &self,
        chain: &Polypeptide,
        tensor: &OrderTensor,
        medium: usize,
    ) -> Result<Vec<BackCalculated>, FitError> {
        Ok(self
            .observations(chain, medium)?
            .into_iter()
            .map(|obs| BackCalculated {
                residue: obs.residue,
                kind: obs.kind,
                observed: obs.coupling.value,
                predicted: obs.dmax * tensor.project(&obs.vector),
            })
            .collect())
    }

    /// REDCAT input rows (atom coordinates, Dmax, coupling, error) for `medium`.
    pub fn redcat_entries(&self, chain: &Polypeptide, medium: usize) -> Result<Vec<RedcatEntry>, FitError> {
        let mut entries = Vec::new();
        for obs in self.observations(chain, medium)? {
            let (from, to) = obs.kind.endpoints();
            let (Some(a), Some(b)) = (
                chain.atom_position(obs.residue + from.residue_offset, from.atom),
                chain.atom_position(obs.residue + to.residue_offset, to.atom),
            ) else {
                continue;
            };
            entries.push(RedcatEntry {
                from: a,
                to: b,
                dmax: obs.dmax,
                value: obs.coupling.value,
                error: obs.coupling.error.unwrap_or(self.settings.default_error),
            });
        }
        Ok(entries)
    }

    pub fn write_redcat_file(
        &self,
        chain: &Polypeptide,
        medium: usize,
        path: &Path,
    ) -> Result<(), FitError> {
        let entries = self.redcat_entries(chain, medium)?;
        RedcatFile::write_to_path(&entries, &(), path).map_err(|source| FitError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::rdc_table::RdcRow;
    use crate::core::models::polypeptide::BackboneGeometry;
    use tempfile::tempdir;

    const TORSIONS: [(f64, f64); 10] = [
        (-60.0, -45.0),
        (-65.0, -40.0),
        (-120.0, 130.0),
        (-140.0, 150.0),
        (-70.0, 145.0),
        (60.0, 40.0),
        (-90.0, 0.0),
        (-57.0, -47.0),
        (-100.0, 120.0),
        (-75.0, 160.0),
    ];

    fn chain(n: usize) -> Polypeptide {
        let names = vec!["ALA"; n];
        Polypeptide::from_torsions(BackboneGeometry::default(), &TORSIONS[..n], &names).unwrap()
    }

    fn reference_tensor() -> OrderTensor {
        OrderTensor::new(3.2e-4, -5.1e-4, 1.4e-4, -2.3e-4, 0.8e-4)
    }

    /// Table of exact couplings for `chain` under `tensor`, shifted down by `offset` rows.
    fn synthetic_table(chain: &Polypeptide, tensor: &OrderTensor, offset: usize) -> RdcTable {
        let constants = CouplingConstants::default();
        let mut rows: Vec<RdcRow> = (0..offset)
            .map(|_| RdcRow {
                name: "SER".to_string(),
                couplings: [None; 6],
            })
            .collect();
        for (i, residue) in chain.residues().iter().enumerate() {
            let mut couplings = [None; 6];
            for kind in BondVectorKind::ALL {
                if let Some(v) = chain.bond_vector(i, kind) {
                    couplings[kind.column()] = Some(Coupling {
                        value: constants.dmax(kind) * tensor.project(&v),
                        error: Some(0.5),
                    });
                }
            }
            rows.push(RdcRow {
                name: residue.name.clone(),
                couplings,
            });
        }
        RdcTable { rows }
    }

    fn redcat(tables: Vec<RdcTable>) -> Redcat {
        Redcat::from_tables(tables, CouplingConstants::default(), FitSettings::default())
    }

    fn assert_tensor_close(a: &OrderTensor, b: &OrderTensor, tol: f64) {
        for (x, y) in a.components().iter().zip(b.components()) {
            assert!((x - y).abs() < tol, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn recovers_synthetic_tensor_exactly() {
        let pp = chain(10);
        let tensor = reference_tensor();
        let fitter = redcat(vec![synthetic_table(&pp, &tensor, 0)]);
        let fit = fitter.calculate_rmsd(&pp, 0).unwrap();
        assert_tensor_close(&fit.tensor, &tensor, 1e-10);
        assert!(fit.rmsd < 1e-6, "rmsd {}", fit.rmsd);
        assert_eq!(fit.used, 60);
        assert_eq!(fit.residuals.len(), 60);
    }

    #[test]
    fn weighted_fit_of_exact_data_is_unchanged() {
        let pp = chain(10);
        let tensor = reference_tensor();
        let settings = FitSettings {
            weighted: true,
            ..FitSettings::default()
        };
        let fitter = Redcat::from_tables(
            vec![synthetic_table(&pp, &tensor, 0)],
            CouplingConstants::default(),
            settings,
        );
        let fit = fitter.calculate_rmsd(&pp, 0).unwrap();
        assert_tensor_close(&fit.tensor, &tensor, 1e-10);
    }

    #[test]
    fn rmsd_reflects_perturbed_couplings() {
        let pp = chain(10);
        let mut table = synthetic_table(&pp, &reference_tensor(), 0);
        for (i, row) in table.rows.iter_mut().enumerate() {
            if let Some(c) = row.couplings[0].as_mut() {
                c.value += if i % 2 == 0 { 2.0 } else { -2.0 };
            }
        }
        let fit = redcat(vec![table]).calculate_rmsd(&pp, 0).unwrap();
        assert!(fit.rmsd > 0.1);
        let manual = (fit.sum_of_squares() / fit.used as f64).sqrt();
        assert!((fit.rmsd - manual).abs() < 1e-12);
    }

    #[test]
    fn offset_maps_residues_to_later_rows() {
        let pp = chain(10);
        let tensor = reference_tensor();
        let mut fitter = redcat(vec![synthetic_table(&pp, &tensor, 2)]);

        // Without the offset the SER padding rows are consumed and nothing lines up.
        let misaligned = fitter.calculate_rmsd(&pp, 0).unwrap();
        assert!(misaligned.rmsd > 0.1);
        assert_eq!(fitter.reduced_rdc_count(0, 10).unwrap(), 8);

        fitter.set_offset(2);
        let fit = fitter.calculate_rmsd(&pp, 0).unwrap();
        assert_tensor_close(&fit.tensor, &tensor, 1e-10);
        assert_eq!(fitter.reduced_rdc_count(0, 10).unwrap(), 10);
        assert_eq!(fitter.residue_name(0), "ALA");
    }

    #[test]
    fn offset_two_over_ten_rows_consumes_rows_two_through_nine() {
        let pp = chain(8);
        let full = chain(10);
        let tensor = reference_tensor();
        // Ten rows generated from a longer chain; only rows 2..=9 match positions 0..8.
        let table = synthetic_table(&full, &tensor, 0);
        let fitter = redcat(vec![table]).with_offset(2);
        assert_eq!(fitter.reduced_rdc_count(0, 8).unwrap(), 8);
        assert_eq!(fitter.reduced_rdc_count(0, 9).unwrap(), 8);
        let observations = fitter.observations(&pp, 0).unwrap();
        assert_eq!(observations.first().unwrap().residue, 0);
        assert_eq!(observations.last().unwrap().residue, 7);
    }

    #[test]
    fn reduced_count_never_exceeds_residue_count() {
        let pp = chain(6);
        let fitter = redcat(vec![synthetic_table(&chain(10), &reference_tensor(), 0)]);
        for count in 0..=12 {
            assert!(fitter.reduced_rdc_count(0, count).unwrap() <= count);
        }
        assert_eq!(fitter.reduced_rdc_count(0, pp.residue_count()).unwrap(), 6);
    }

    #[test]
    fn rows_without_couplings_are_not_counted() {
        let pp = chain(4);
        let mut table = synthetic_table(&pp, &reference_tensor(), 0);
        table.rows[1].couplings = [None; 6];
        let fitter = redcat(vec![table]);
        assert_eq!(fitter.reduced_rdc_count(0, 4).unwrap(), 3);
    }

    #[test]
    fn too_few_couplings_is_insufficient_data() {
        let pp = chain(3);
        let mut table = synthetic_table(&pp, &reference_tensor(), 0);
        for row in &mut table.rows {
            row.couplings = [None; 6];
        }
        for i in 0..3 {
            table.rows[i].couplings[0] = Some(Coupling { value: 1.0, error: None });
        }
        let fitter = redcat(vec![table]);
        assert!(matches!(
            fitter.calculate_rmsd(&pp, 0),
            Err(FitError::InsufficientData { medium: 0, usable: 3 })
        ));
    }

    #[test]
    fn degenerate_vectors_are_insufficient_data() {
        // A fully extended chain keeps every N-H vector in one plane.
        let names = vec!["ALA"; 10];
        let pp = Polypeptide::from_torsions(BackboneGeometry::default(), &[(180.0, 180.0); 10], &names)
            .unwrap();
        let mut table = synthetic_table(&pp, &reference_tensor(), 0);
        for row in &mut table.rows {
            for column in 1..6 {
                row.couplings[column] = None;
            }
        }
        assert!(matches!(
            redcat(vec![table]).calculate_rmsd(&pp, 0),
            Err(FitError::InsufficientData { usable: 10, .. })
        ));
    }

    #[test]
    fn non_finite_geometry_fails_instead_of_fitting() {
        let table = synthetic_table(&chain(8), &reference_tensor(), 0);
        let mut torsions = TORSIONS[..8].to_vec();
        torsions[3].0 = f64::NAN;
        let names = vec!["ALA"; 8];
        let pp = Polypeptide::from_torsions(BackboneGeometry::default(), &torsions, &names).unwrap();
        assert!(matches!(
            redcat(vec![table]).calculate_rmsd(&pp, 0),
            Err(FitError::Matrix(MatrixError::NonFinite { .. }))
        ));
    }

    #[test]
    fn unknown_medium_is_rejected() {
        let pp = chain(3);
        let fitter = redcat(vec![]);
        assert!(matches!(
            fitter.calculate_rmsd(&pp, 1),
            Err(FitError::MediumOutOfRange { medium: 1, count: 0 })
        ));
    }

    #[test]
    fn unclosed_chain_cannot_be_fitted() {
        let mut pp = Polypeptide::new(BackboneGeometry::default());
        pp.append_amino_acid(-60.0, -45.0, "ALA").unwrap();
        let fitter = redcat(vec![RdcTable::default()]);
        assert!(matches!(
            fitter.calculate_rmsd(&pp, 0),
            Err(FitError::Build(BuildError::NotClosed))
        ));
    }

    #[test]
    fn total_rmsd_pools_fittable_media_and_skips_the_rest() {
        let pp = chain(10);
        let mut noisy = synthetic_table(&pp, &reference_tensor(), 0);
        for row in &mut noisy.rows {
            if let Some(c) = row.couplings[2].as_mut() {
                c.value += 1.5;
            }
        }
        let exact = synthetic_table(&pp, &reference_tensor(), 0);
        let fitter = redcat(vec![exact, noisy, RdcTable::default()]);

        let fits = fitter.fit_all(&pp).unwrap();
        assert!(fits[2].is_none());
        let expected = ((fits[0].as_ref().unwrap().sum_of_squares()
            + fits[1].as_ref().unwrap().sum_of_squares())
            / 120.0)
            .sqrt();
        let total = fitter.calculate_total_rmsd(&pp).unwrap();
        assert!((total - expected).abs() < 1e-12);
    }

    #[test]
    fn total_rmsd_without_fittable_media_fails() {
        let pp = chain(3);
        let fitter = redcat(vec![RdcTable::default(), RdcTable::default()]);
        assert!(matches!(
            fitter.calculate_total_rmsd(&pp),
            Err(FitError::InsufficientData { .. })
        ));
    }

    #[test]
    fn back_calculation_reproduces_exact_data() {
        let pp = chain(10);
        let tensor = reference_tensor();
        let fitter = redcat(vec![synthetic_table(&pp, &tensor, 0)]);
        for bc in fitter.back_calculate(&pp, &tensor, 0).unwrap() {
            assert!((bc.observed - bc.predicted).abs() < 1e-9);
        }
    }

    #[test]
    fn residue_names_default_to_alanine_past_table_end() {
        let pp = chain(3);
        let mut table = synthetic_table(&pp, &reference_tensor(), 0);
        table.rows[0].name = "MET".to_string();
        let fitter = redcat(vec![table]).with_offset(1);
        assert_eq!(fitter.residue_names(4), ["ALA", "ALA", "ALA", "ALA"]);
        let fitter = fitter.with_offset(0);
        assert_eq!(fitter.residue_names(2), ["MET", "ALA"]);
    }

    #[test]
    fn redcat_file_lists_usable_couplings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.redcat.m1");
        let pp = chain(4);
        let fitter = redcat(vec![synthetic_table(&pp, &reference_tensor(), 0)]);
        fitter.write_redcat_file(&pp, 0, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 24);
        let first: Vec<f64> = text
            .lines()
            .next()
            .unwrap()
            .split_whitespace()
            .map(|t| t.parse().unwrap())
            .collect();
        assert_eq!(first.len(), 9);
        assert_eq!(first[8], 0.5);
        let h = pp.atom_position(0, crate::core::models::residue::BackboneAtom::H).unwrap();
        assert!((first[3] - h.x).abs() < 1e-4);
    }

    #[test]
    fn load_reads_numbered_media_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("sample.1"), "ALA 1 2 3 4 5 6\n").unwrap();
        std::fs::write(dir.path().join("sample.2"), "GLY 1 2 3 4 5 6\nALA\n1\n2\n3\n4\n5\n6\n").unwrap();
        let fitter = Redcat::load(
            dir.path(),
            "sample",
            2,
            CouplingConstants::default(),
            FitSettings::default(),
        )
        .unwrap();
        assert_eq!(fitter.media_count(), 2);
        assert_eq!(fitter.table(1).unwrap().len(), 2);

        let missing = Redcat::load(
            dir.path(),
            "sample",
            3,
            CouplingConstants::default(),
            FitSettings::default(),
        );
        assert!(matches!(missing, Err(DataError::MissingFile { .. })));
    }
}
