use crate::cli::Cli;
use crate::config::{self, RunSettings};
use crate::data;
use crate::error::{CliError, Result};
use crate::report;
use redcraft::engine::context::EvaluationContext;
use redcraft::workflows;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use tracing::{debug, error, info, warn};

/// Outcome counts of a run over an angles file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineStats {
    pub evaluated: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub fn run(cli: &Cli) -> Result<LineStats> {
    let RunSettings {
        config,
        request,
        data: data_source,
    } = config::resolve(cli)?;

    let redcat = match &data_source {
        Some(source) => Some(data::load_redcat(source, &config, request.offset)?),
        None => {
            debug!("No RDC data requested; building structures only.");
            None
        }
    };

    info!("Reading torsion angles from {:?}", &cli.angles_file);
    let file = File::open(&cli.angles_file).map_err(|e| CliError::FileParsing {
        path: cli.angles_file.clone(),
        source: e.into(),
    })?;

    let context = EvaluationContext::new(&config, &request, redcat.as_ref());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let stats = evaluate_lines(BufReader::new(file), &mut out, &context)?;

    info!(
        "Processed {} line(s): {} evaluated, {} failed.",
        stats.evaluated + stats.failed,
        stats.evaluated,
        stats.failed
    );
    Ok(stats)
}

/// Evaluates every non-blank line of `reader`, writing reports to `out`.
///
/// A line that fails is logged and skipped; the remaining lines still run.
pub fn evaluate_lines(
    mut reader: impl BufRead,
    out: &mut impl Write,
    context: &EvaluationContext,
) -> Result<LineStats> {
    let mut stats = LineStats::default();
    let mut buffer = Vec::new();
    let mut line_number: usize = 0;
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }
        line_number += 1;
        let line = match std::str::from_utf8(&buffer) {
            Ok(line) => line,
            Err(e) => {
                error!(line = line_number, "Skipping line: not valid UTF-8 ({})", e);
                stats.failed += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            debug!(line = line_number, "Skipping blank line");
            stats.skipped += 1;
            continue;
        }

        match workflows::evaluate::run(line, context) {
            Ok(evaluation) => {
                if let Some(path) = &evaluation.pdb_path {
                    info!(line = line_number, "Wrote structure to {:?}", path);
                }
                for path in &evaluation.redcat_paths {
                    info!(line = line_number, "Wrote REDCAT file {:?}", path);
                }
                if evaluation.media.iter().any(|m| m.fit.is_none()) {
                    warn!(line = line_number, "Some media could not be fitted; reported as NA.");
                }
                report::write_report(out, &evaluation, context.request)?;
                out.flush()?;
                stats.evaluated += 1;
            }
            Err(e) => {
                error!(line = line_number, "Skipping line: {}", e);
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}
