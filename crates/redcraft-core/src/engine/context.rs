use super::config::{EvaluateRequest, MolanConfig};
use super::error::EngineError;
use crate::core::rdc::redcat::Redcat;

/// Read-only state shared by every line of a run.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub config: &'a MolanConfig,
    pub request: &'a EvaluateRequest,
    pub redcat: Option<&'a Redcat>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        config: &'a MolanConfig,
        request: &'a EvaluateRequest,
        redcat: Option<&'a Redcat>,
    ) -> Self {
        Self {
            config,
            request,
            redcat,
        }
    }

    pub fn redcat(&self) -> Result<&'a Redcat, EngineError> {
        self.redcat.ok_or(EngineError::MissingData)
    }

    /// Residue name for chain index `index`, taken from the first medium.
    ///
    /// Without data every residue is built as alanine.
    pub fn residue_name(&self, index: usize) -> &'a str {
        match self.redcat {
            Some(redcat) => redcat.residue_name(index),
            None => "ALA",
        }
    }
}
