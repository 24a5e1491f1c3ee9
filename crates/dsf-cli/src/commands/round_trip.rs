use crate::cli::RoundTripArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::output::write_json;
use crate::utils::progress::CliProgressHandler;
use nanodsf::engine::progress::ProgressReporter;
use nanodsf::workflows;
use tracing::warn;

pub fn run(args: RoundTripArgs, show_progress: bool) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref(), &args.set_values)?;
    let simulation_config = partial_config.simulation_config(&args.model)?;
    let analysis_config = partial_config.analysis_config()?;

    let progress_handler = CliProgressHandler::new(show_progress);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let request = args.conditions.to_request();
    let report =
        workflows::simulate::round_trip(&request, &simulation_config, &analysis_config, &reporter)?;

    match (report.recovered_tm, report.tm_error) {
        (Some(recovered), Some(error)) => println!(
            "✓ Predicted Tm {:.2} °C, recovered {:.2} °C (error {:+.2} °C, confidence {:.2})",
            report.predicted_tm, recovered, error, report.tm_confidence
        ),
        _ => {
            warn!(
                predicted_tm = report.predicted_tm,
                "Analyzer found no transition in the simulated curve."
            );
            println!(
                "Predicted Tm {:.2} °C, but no transition was recovered.",
                report.predicted_tm
            );
        }
    }

    write_json(&report, args.output.as_deref())
}
