use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::utils::parser;
use redcraft::engine::config::{ConfigError, EvaluateRequest, EvaluateRequestBuilder, MolanConfig};
use std::path::PathBuf;
use tracing::{debug, info};

/// Location of the per-medium RDC tables.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub path: PathBuf,
    pub prefix: String,
    pub media_count: usize,
}

/// Everything resolved from the command line before the first line is read.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config: MolanConfig,
    pub request: EvaluateRequest,
    pub data: Option<DataSource>,
}

pub fn load_config(cli: &Cli) -> Result<MolanConfig> {
    match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            MolanConfig::load(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })
        }
        None => {
            debug!("No config file given, using built-in defaults.");
            Ok(MolanConfig::default())
        }
    }
}

/// Tables are read whenever a path and prefix are given. Without a media count
/// only the first medium is loaded, for its residue names.
fn data_source(cli: &Cli, media_count: Option<usize>) -> Option<DataSource> {
    let (Some(path), Some(prefix)) = (&cli.data_path, &cli.data_prefix) else {
        return None;
    };
    if media_count.is_none() {
        debug!("No media count given; reading residue names from the first medium only.");
    }
    Some(DataSource {
        path: path.clone(),
        prefix: prefix.clone(),
        media_count: media_count.unwrap_or(1),
    })
}

/// Checks flag combinations and assembles the evaluation request.
pub fn build_request(cli: &Cli) -> Result<(EvaluateRequest, Option<DataSource>)> {
    let media_count = cli.media_count.filter(|&m| m > 0);
    let data = data_source(cli, media_count);

    let needs_data = cli.evaluate
        || cli.order_tensors
        || cli.write_redcat
        || cli.distance_reference.is_some()
        || cli.paf;
    if needs_data && (data.is_none() || media_count.is_none()) {
        return Err(CliError::Argument(
            "This operation requires data path (-p), RDC file prefix (-d) and media count (-m)"
                .to_string(),
        ));
    }
    if (cli.write_pdb || cli.write_redcat) && cli.output_prefix.is_none() {
        return Err(CliError::Argument(
            "Writing PDB (-g) or REDCAT (-r) files requires an output prefix (-f)".to_string(),
        ));
    }

    let mut builder = EvaluateRequestBuilder::new()
        .offset(cli.offset)
        .evaluate(cli.evaluate)
        .order_tensors(cli.order_tensors)
        .into_paf(cli.paf)
        .ca_energy(cli.ca_energy)
        .max_ca_energy(cli.max_ca_energy)
        .write_pdb(cli.write_pdb)
        .write_redcat(cli.write_redcat);

    if let Some(count) = media_count {
        builder = builder.media_count(count);
    }
    if let Some(prefix) = &cli.output_prefix {
        builder = builder.output_prefix(prefix.clone());
    }
    if let Some(text) = &cli.distance_reference {
        let reference = parser::parse_reference_tensors(text, media_count.unwrap_or(0))
            .map_err(|e| CliError::Argument(e.to_string()))?;
        builder = builder.reference(reference);
    }

    let request = builder.build().map_err(|e| match e {
        ConfigError::MissingParameter(name) => {
            CliError::Config(format!("missing required parameter '{name}'"))
        }
        other => CliError::Config(other.to_string()),
    })?;
    Ok((request, data))
}

pub fn resolve(cli: &Cli) -> Result<RunSettings> {
    let (request, data) = build_request(cli)?;
    let config = load_config(cli)?;
    debug!("Resolved request: {:?}", &request);
    Ok(RunSettings {
        config,
        request,
        data,
    })
}
