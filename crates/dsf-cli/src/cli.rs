use clap::{Args, Parser, Subcommand};
use nanodsf::core::models::simulation::SimulationRequest;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "nanoDSF Analysis Contributors",
    version,
    about = "nanodsf - Analyze nanoDSF thermal unfolding curves and simulate them from experimental conditions.",
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

    /// Set the number of threads used for batch analysis and simulation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one or more measurement tables (temperature, F330, F350) and report Tm,
    /// quality and anomalies as JSON.
    Analyze(AnalyzeArgs),
    /// Simulate unfolding curves from experimental conditions.
    Simulate(SimulateArgs),
    /// Simulate a curve and run it through the analyzer, reporting how well Tm is recovered.
    RoundTrip(RoundTripArgs),
    /// Show the accepted simulation parameter domains and the default analysis thresholds.
    Info,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path(s) to the input CSV tables.
    #[arg(short, long, required = true, num_args = 1.., value_name = "PATH")]
    pub input: Vec<PathBuf>,

    /// Output JSON file, or an existing directory to write one JSON file per input.
    /// Defaults to standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to an analysis configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override `transitions.min-confidence` from the config file.
    #[arg(long, value_name = "FLOAT")]
    pub min_confidence: Option<f64>,

    /// Override `smoothing.window-fraction` from the config file.
    #[arg(long, value_name = "FLOAT")]
    pub window_fraction: Option<f64>,

    /// Override `validation.min-points` from the config file.
    #[arg(long, value_name = "INT")]
    pub min_points: Option<usize>,

    /// Omit the plot arrays from the JSON output.
    #[arg(long)]
    pub no_plot_data: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S quality.min-snr=20
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Experimental conditions of a single simulated curve; unset fields take the
/// reference values (Tm 60 °C, amplitude 0.3, pH 7.4, 1 mg/mL, no ligand, 20-95 °C).
#[derive(Args, Debug, Clone, Default)]
pub struct ConditionArgs {
    /// Intrinsic melting temperature in °C.
    #[arg(long, value_name = "FLOAT")]
    pub base_tm: Option<f64>,

    /// Ratio change across the transition.
    #[arg(long, value_name = "FLOAT")]
    pub base_amplitude: Option<f64>,

    /// Buffer pH.
    #[arg(long, value_name = "FLOAT")]
    pub ph: Option<f64>,

    /// Protein concentration in mg/mL.
    #[arg(long, value_name = "FLOAT")]
    pub protein_concentration: Option<f64>,

    /// Ligand-induced Tm shift in °C.
    #[arg(long, value_name = "FLOAT")]
    pub ligand_affinity: Option<f64>,

    /// First simulated temperature in °C.
    #[arg(long = "t-start", value_name = "FLOAT")]
    pub temperature_range_start: Option<f64>,

    /// Last simulated temperature in °C.
    #[arg(long = "t-end", value_name = "FLOAT")]
    pub temperature_range_end: Option<f64>,
}

impl ConditionArgs {
    pub fn to_request(&self) -> SimulationRequest {
        let d = SimulationRequest::default();
        SimulationRequest {
            base_tm: self.base_tm.unwrap_or(d.base_tm),
            base_amplitude: self.base_amplitude.unwrap_or(d.base_amplitude),
            ph: self.ph.unwrap_or(d.ph),
            protein_concentration: self
                .protein_concentration
                .unwrap_or(d.protein_concentration),
            ligand_affinity: self.ligand_affinity.unwrap_or(d.ligand_affinity),
            temperature_range_start: self
                .temperature_range_start
                .unwrap_or(d.temperature_range_start),
            temperature_range_end: self
                .temperature_range_end
                .unwrap_or(d.temperature_range_end),
        }
    }
}

/// Overrides of the forward model shared by `simulate` and `round-trip`.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Seed for the noise generator; omit for a fresh random seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override `simulation.num-points` from the config file.
    #[arg(long, value_name = "INT")]
    pub num_points: Option<usize>,

    /// Override `simulation.noise-fraction` from the config file.
    #[arg(long, value_name = "FLOAT")]
    pub noise_fraction: Option<f64>,
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub conditions: ConditionArgs,

    /// JSON file holding an array of requests to simulate as one batch.
    /// Replaces the single-curve condition flags.
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = [
            "base_tm", "base_amplitude", "ph", "protein_concentration",
            "ligand_affinity", "temperature_range_start", "temperature_range_end",
        ]
    )]
    pub requests: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Output JSON file. Defaults to standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a configuration file in TOML format; only its `[simulation]` table is used.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S simulation.transition-width=3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `round-trip` subcommand.
#[derive(Args, Debug)]
pub struct RoundTripArgs {
    #[command(flatten)]
    pub conditions: ConditionArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Output JSON file. Defaults to standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_accepts_multiple_inputs_and_set_values() {
        let cli = Cli::parse_from([
            "nanodsf", "-vv", "analyze", "-i", "a.csv", "b.csv", "-S", "quality.min-snr=20",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.input.len(), 2);
                assert_eq!(args.set_values, vec!["quality.min-snr=20".to_string()]);
            }
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn unset_conditions_fall_back_to_the_reference_request() {
        let cli = Cli::parse_from(["nanodsf", "simulate", "--ph", "8.4", "--seed", "3"]);
        match cli.command {
            Commands::Simulate(args) => {
                let request = args.conditions.to_request();
                assert_eq!(request.ph, 8.4);
                assert_eq!(request.base_tm, 60.0);
                assert_eq!(args.model.seed, Some(3));
            }
            other => panic!("expected simulate, got {other:?}"),
        }
    }

    #[test]
    fn request_file_conflicts_with_condition_flags() {
        let result = Cli::try_parse_from([
            "nanodsf", "simulate", "--requests", "batch.json", "--base-tm", "50",
        ]);
        assert!(result.is_err());
    }
}
