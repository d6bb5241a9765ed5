use crate::core::models::polypeptide::BuildError;
use crate::core::rdc::redcat::FitError;
use crate::core::tensor::TensorError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid torsion angle line: {reason}")]
    InvalidAngles { reason: String },

    #[error("RDC data is required but was not loaded")]
    MissingData,

    #[error("Structure construction failed: {source}")]
    Build {
        #[from]
        source: BuildError,
    },

    #[error("RDC fit failed: {source}")]
    Fit {
        #[from]
        source: FitError,
    },

    #[error("Order tensor error: {source}")]
    Tensor {
        #[from]
        source: TensorError,
    },

    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
