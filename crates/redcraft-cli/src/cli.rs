use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    name = "molan",
    author = "Homayoun Valafar, Mikhail Simin",
    version,
    about = "molan - build protein backbones from torsion angles and fit them against residual dipolar coupling data.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// File with one conformation per line, given as whitespace-separated phi/psi pairs in degrees.
    #[arg(value_name = "ANGLES_FILE")]
    pub angles_file: PathBuf,

    // --- RDC Data ---
    /// Directory holding the RDC data files (e.g., data/1brf).
    #[arg(short = 'p', long = "data-path", value_name = "PATH")]
    pub data_path: Option<PathBuf>,

    /// RDC data file prefix; medium N is read from '<PATH>/<PREFIX>.N'.
    #[arg(short = 'd', long = "data-prefix", value_name = "PREFIX")]
    pub data_prefix: Option<String>,

    /// Number of alignment media.
    #[arg(short = 'm', long = "media", value_name = "INT")]
    pub media_count: Option<usize>,

    /// Map residue i of the chain to RDC row i + OFFSET. Also shifts PDB numbering.
    #[arg(short = 'o', long, value_name = "INT", default_value_t = 0)]
    pub offset: usize,

    // --- Reports ---
    /// Print the per-medium RMSD and usable residue count, followed by the pooled RMSD.
    #[arg(short = 'e', long)]
    pub evaluate: bool,

    /// Print the back-calculated order tensor of every medium.
    #[arg(short = 'O', long = "order-tensors")]
    pub order_tensors: bool,

    /// Print the distance to reference tensors given as 'Sxx Syy Sxy Sxz Syz' per medium.
    #[arg(short = 'D', long = "distance", value_name = "TENSORS", allow_hyphen_values = true)]
    pub distance_reference: Option<String>,

    /// Print the cumulative Lennard-Jones Cα energy.
    #[arg(short = 'l', long = "ca-energy")]
    pub ca_energy: bool,

    /// Print the largest per-residue Lennard-Jones Cα energy.
    #[arg(short = 'L', long = "max-ca-energy")]
    pub max_ca_energy: bool,

    /// Rotate the chain into the principal alignment frame of the first medium before reporting.
    #[arg(long = "paf", alias = "PAF")]
    pub paf: bool,

    // --- Output Files ---
    /// Prefix for generated files ('<PREFIX>.pdb', '<PREFIX>.redcat.mN').
    #[arg(short = 'f', long = "output-prefix", value_name = "PREFIX")]
    pub output_prefix: Option<PathBuf>,

    /// Write the built structure as '<PREFIX>.pdb' (requires -f).
    #[arg(short = 'g', long = "pdb")]
    pub write_pdb: bool,

    /// Write one REDCAT input file per medium (requires -f).
    #[arg(short = 'r', long = "redcat")]
    pub write_redcat: bool,

    // --- Configuration & Logging ---
    /// TOML file overriding backbone geometry, energy and coupling constants.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
