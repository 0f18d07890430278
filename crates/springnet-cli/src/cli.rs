use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Miles Yucht",
    version,
    about = "springnet - Simulate disordered triangular spring networks under oscillatory or static shear.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Integrate the overdamped dynamics of a network under sinusoidal shear.
    Oscillate(OscillateArgs),
    /// Relax a network held at a fixed shear strain and report its shear modulus.
    Minimize(MinimizeArgs),
}

/// Lattice and randomness options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Number of nodes along each side of the lattice.
    #[arg(short = 'z', long, value_name = "INT")]
    pub size: Option<usize>,

    /// Probability that any given bond is present.
    #[arg(short = 'p', long = "probability", value_name = "FLOAT")]
    pub bond_probability: Option<f64>,

    /// Stiffness of an intact bond.
    #[arg(short = 'E', long, value_name = "FLOAT")]
    pub youngs_modulus: Option<f64>,

    /// Seed for the random number generator; drawn from the OS when omitted.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

/// Where and what to write.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Directory that receives every output file. Must already exist.
    #[arg(short, long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File stem for position snapshots; one `<stem>_<frame>.csv` per frame.
    #[arg(long, value_name = "STEM")]
    pub positions: Option<String>,

    /// File stem for the stress series.
    #[arg(long, value_name = "STEM")]
    pub stress: Option<String>,

    /// File stem for the energy log, appended to across runs.
    #[arg(long, value_name = "STEM")]
    pub energy: Option<String>,

    /// File stem for the non-affinity series.
    #[arg(long, value_name = "STEM")]
    pub nonaffinity: Option<String>,
}

/// Arguments for the `oscillate` subcommand.
#[derive(Args, Debug)]
pub struct OscillateArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Amplitude of the imposed shear strain.
    #[arg(short = 'e', long = "strain", value_name = "FLOAT")]
    pub strain_amplitude: Option<f64>,

    /// Angular frequency of the drive.
    #[arg(short = 'r', long = "rate", value_name = "FLOAT")]
    pub frequency: Option<f64>,

    /// Number of full oscillations to simulate.
    #[arg(long = "num-osc", value_name = "INT")]
    pub num_oscillations: Option<usize>,

    /// Number of frames to record per oscillation.
    #[arg(long = "out-per-osc", value_name = "INT")]
    pub outputs_per_oscillation: Option<usize>,

    /// Temperature of the thermal bath.
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Override `motors.enabled` from the config file.
    #[command(flatten)]
    pub motors: MotorToggle,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S dynamics.temperature=0.01
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive flags for switching motors on or off.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct MotorToggle {
    /// Enable force-dipole motors on intact bonds.
    #[arg(short = 'm', long = "motors")]
    pub with_motors: bool,
    /// Disable motors even if the config file enables them.
    #[arg(long)]
    pub no_motors: bool,
}

/// Arguments for the `minimize` subcommand.
#[derive(Args, Debug)]
pub struct MinimizeArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Shear strain held fixed during the minimization.
    #[arg(short = 'e', long, value_name = "FLOAT")]
    pub strain: Option<f64>,

    /// Relative energy tolerance of the conjugate-gradient loop.
    #[arg(long, value_name = "FLOAT")]
    pub ftol: Option<f64>,

    /// Maximum number of conjugate-gradient iterations.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S minimizer.gtol=1e-10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
