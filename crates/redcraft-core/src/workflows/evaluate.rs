use crate::core::models::polypeptide::Polypeptide;
use crate::core::rdc::redcat::{Fit, Redcat};
use crate::core::rotation::Rotation;
use crate::core::tensor::{OrderTensor, TensorDistances, canonical_distance};
use crate::engine::context::EvaluationContext;
use crate::engine::error::EngineError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Fit outcome of one alignment medium.
#[derive(Debug, Clone, PartialEq)]
pub struct MediumReport {
    /// `None` when the medium had too few usable couplings.
    pub fit: Option<Fit>,
    /// Residues of the chain with at least one usable coupling in this medium.
    pub reduced_count: usize,
}

/// Everything computed for one torsion-angle line.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub residue_count: usize,
    pub residue_names: Vec<String>,
    pub ca_energy: Option<f64>,
    pub max_ca_energy: Option<f64>,
    /// Rotation applied to bring the chain into the first medium's PAF.
    pub paf_rotation: Option<Rotation>,
    pub media: Vec<MediumReport>,
    /// Pooled RMSD over every medium that could be fitted.
    pub total_rmsd: Option<f64>,
    pub distances: Option<TensorDistances>,
    pub pdb_path: Option<PathBuf>,
    pub redcat_paths: Vec<PathBuf>,
}

impl Evaluation {
    pub fn tensors(&self) -> impl Iterator<Item = Option<&OrderTensor>> {
        self.media.iter().map(|m| m.fit.as_ref().map(|f| &f.tensor))
    }
}

/// Parses whitespace-separated `phi psi` pairs in degrees.
///
/// A trailing unpaired value is ignored.
pub fn parse_torsions(line: &str) -> Result<Vec<(f64, f64)>, EngineError> {
    let values = line
        .split_whitespace()
        .map(|token| match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(EngineError::InvalidAngles {
                reason: format!("'{token}' is not a finite number"),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() % 2 == 1 {
        debug!(count = values.len(), "Ignoring trailing unpaired torsion value");
    }
    let pairs: Vec<(f64, f64)> = values.chunks_exact(2).map(|p| (p[0], p[1])).collect();
    if pairs.is_empty() {
        return Err(EngineError::InvalidAngles {
            reason: "no phi/psi pair on the line".to_string(),
        });
    }
    Ok(pairs)
}

#[instrument(skip_all, name = "evaluate_workflow")]
pub fn run(line: &str, context: &EvaluationContext) -> Result<Evaluation, EngineError> {
    let request = context.request;
    let torsions = parse_torsions(line)?;

    let mut chain = Polypeptide::new(context.config.geometry);
    for (i, &(phi, psi)) in torsions.iter().enumerate() {
        chain.append_amino_acid(phi, psi, context.residue_name(i))?;
    }
    chain.close()?;
    let residue_count = chain.residue_count();
    info!(residues = residue_count, "Built backbone.");

    let energy = &context.config.energy;
    let ca_energy = request.ca_energy.then(|| chain.vdw_ca(energy)).transpose()?;
    let max_ca_energy = request
        .max_ca_energy
        .then(|| chain.max_lj_distance(energy))
        .transpose()?;

    let redcat = request.needs_data().then(|| context.redcat()).transpose()?;

    let paf_rotation = match redcat {
        Some(redcat) if request.into_paf => {
            let rotation = rotate_into_paf(&mut chain, redcat)?;
            info!("Rotated chain into the principal alignment frame of medium 1.");
            Some(rotation)
        }
        _ => None,
    };

    let output = request.output.as_ref();
    let pdb_path = match output {
        Some(output) if output.write_pdb => {
            let path = with_suffix(&output.prefix, ".pdb");
            chain
                .write_pdb(&path, request.offset + 1)
                .map_err(|source| EngineError::Io {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "Wrote PDB file");
            Some(path)
        }
        _ => None,
    };

    let mut redcat_paths = Vec::new();
    let mut media = Vec::new();
    if let Some(redcat) = redcat {
        for medium in 0..redcat.media_count() {
            if let Some(output) = output.filter(|o| o.write_redcat) {
                let path = with_suffix(&output.prefix, &format!(".redcat.m{}", medium + 1));
                redcat.write_redcat_file(&chain, medium, &path)?;
                debug!(path = %path.display(), medium, "Wrote REDCAT file");
                redcat_paths.push(path);
            }
        }
        media = redcat
            .fit_all(&chain)?
            .into_iter()
            .enumerate()
            .map(|(medium, fit)| -> Result<MediumReport, EngineError> {
                Ok(MediumReport {
                    fit,
                    reduced_count: redcat.reduced_rdc_count(medium, residue_count)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
    }

    let fits: Vec<Option<Fit>> = media.iter().map(|m| m.fit.clone()).collect();
    let total_rmsd = Redcat::pooled_rmsd(&fits);

    let distances = match &request.reference {
        Some(reference) => reference_distances(&fits, reference)?,
        None => None,
    };

    Ok(Evaluation {
        residue_count,
        residue_names: chain.residues().iter().map(|r| r.name.clone()).collect(),
        ca_energy,
        max_ca_energy,
        paf_rotation,
        media,
        total_rmsd,
        distances,
        pdb_path,
        redcat_paths,
    })
}

/// Rotates `chain` by the transpose of the first medium's principal axes so
/// that its tensor becomes diagonal.
fn rotate_into_paf(chain: &mut Polypeptide, redcat: &Redcat) -> Result<Rotation, EngineError> {
    let fit = redcat.calculate_rmsd(chain, 0)?;
    let rotation = fit.tensor.decompose()?.rotation.transpose();
    chain.rotate(&rotation);
    Ok(rotation)
}

fn reference_distances(
    fits: &[Option<Fit>],
    reference: &[OrderTensor],
) -> Result<Option<TensorDistances>, EngineError> {
    let Some(computed) = fits
        .iter()
        .map(|fit| fit.as_ref().map(|f| f.tensor))
        .collect::<Option<Vec<_>>>()
    else {
        warn!("Skipping tensor distances: not every medium could be fitted");
        return Ok(None);
    };
    Ok(Some(canonical_distance(reference, &computed)?))
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
