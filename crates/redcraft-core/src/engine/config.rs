use crate::core::forcefield::params::CaEnergyParams;
use crate::core::models::polypeptide::BackboneGeometry;
use crate::core::rdc::constants::CouplingConstants;
use crate::core::rdc::redcat::FitSettings;
use crate::core::tensor::OrderTensor;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Physical constants and model parameters shared by every evaluated line.
///
/// Every section is optional in the TOML file; missing sections and keys fall
/// back to the built-in defaults.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct MolanConfig {
    pub geometry: BackboneGeometry,
    pub energy: CaEnergyParams,
    pub couplings: CouplingConstants,
    pub fit: FitSettings,
}

impl MolanConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigLoadError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Where and what to write for each evaluated line.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub prefix: PathBuf,
    pub write_pdb: bool,
    pub write_redcat: bool,
}

/// Which reports to produce for every conformation line.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateRequest {
    pub media_count: usize,
    pub offset: usize,
    pub evaluate: bool,
    pub order_tensors: bool,
    pub reference: Option<Vec<OrderTensor>>,
    pub into_paf: bool,
    pub ca_energy: bool,
    pub max_ca_energy: bool,
    pub output: Option<OutputConfig>,
}

impl EvaluateRequest {
    /// Whether any requested report needs the RDC tables.
    pub fn needs_data(&self) -> bool {
        self.evaluate
            || self.order_tensors
            || self.reference.is_some()
            || self.into_paf
            || self.output.as_ref().is_some_and(|o| o.write_redcat)
    }
}

#[derive(Default)]
pub struct EvaluateRequestBuilder {
    media_count: Option<usize>,
    offset: usize,
    evaluate: bool,
    order_tensors: bool,
    reference: Option<Vec<OrderTensor>>,
    into_paf: bool,
    ca_energy: bool,
    max_ca_energy: bool,
    output_prefix: Option<PathBuf>,
    write_pdb: bool,
    write_redcat: bool,
}

impl EvaluateRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn media_count(mut self, count: usize) -> Self {
        self.media_count = Some(count);
        self
    }
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
    pub fn evaluate(mut self, enabled: bool) -> Self {
        self.evaluate = enabled;
        self
    }
    pub fn order_tensors(mut self, enabled: bool) -> Self {
        self.order_tensors = enabled;
        self
    }
    pub fn reference(mut self, tensors: Vec<OrderTensor>) -> Self {
        self.reference = Some(tensors);
        self
    }
    pub fn into_paf(mut self, enabled: bool) -> Self {
        self.into_paf = enabled;
        self
    }
    pub fn ca_energy(mut self, enabled: bool) -> Self {
        self.ca_energy = enabled;
        self
    }
    pub fn max_ca_energy(mut self, enabled: bool) -> Self {
        self.max_ca_energy = enabled;
        self
    }
    pub fn output_prefix(mut self, prefix: PathBuf) -> Self {
        self.output_prefix = Some(prefix);
        self
    }
    pub fn write_pdb(mut self, enabled: bool) -> Self {
        self.write_pdb = enabled;
        self
    }
    pub fn write_redcat(mut self, enabled: bool) -> Self {
        self.write_redcat = enabled;
        self
    }

    pub fn build(self) -> Result<EvaluateRequest, ConfigError> {
        let output = match self.output_prefix {
            Some(prefix) => Some(OutputConfig {
                prefix,
                write_pdb: self.write_pdb,
                write_redcat: self.write_redcat,
            }),
            None if self.write_pdb || self.write_redcat => {
                return Err(ConfigError::MissingParameter("output_prefix"));
            }
            None => None,
        };

        let mut request = EvaluateRequest {
            media_count: self.media_count.unwrap_or(0),
            offset: self.offset,
            evaluate: self.evaluate,
            order_tensors: self.order_tensors,
            reference: self.reference,
            into_paf: self.into_paf,
            ca_energy: self.ca_energy,
            max_ca_energy: self.max_ca_energy,
            output,
        };

        if request.needs_data() {
            let media_count = self
                .media_count
                .filter(|&m| m > 0)
                .ok_or(ConfigError::MissingParameter("media_count"))?;
            request.media_count = media_count;
        }

        if let Some(reference) = &request.reference {
            if reference.len() != request.media_count {
                return Err(ConfigError::InvalidParameter {
                    name: "reference",
                    reason: format!(
                        "expected {} tensors (one per medium), got {}",
                        request.media_count,
                        reference.len()
                    ),
                });
            }
        }

        Ok(request)
    }
}
