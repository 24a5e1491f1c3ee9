use crate::cli::SimulateArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::output::write_json;
use crate::utils::progress::CliProgressHandler;
use nanodsf::core::models::simulation::SimulationRequest;
use nanodsf::engine::progress::ProgressReporter;
use nanodsf::workflows;
use std::path::Path;
use tracing::info;

pub fn run(args: SimulateArgs, show_progress: bool) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref(), &args.set_values)?;
    let config = partial_config.simulation_config(&args.model)?;

    let Some(requests_path) = args.requests.as_deref() else {
        let request = args.conditions.to_request();
        info!(?request, "Simulating a single curve.");
        let result = workflows::simulate::simulate(&request, &config)?;
        println!(
            "✓ Simulated {} points, predicted Tm {:.2} °C",
            result.temperatures.len(),
            result.predicted_tm
        );
        return write_json(&result, args.output.as_deref());
    };

    let requests = read_requests(requests_path)?;
    let progress_handler = CliProgressHandler::new(show_progress);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Simulating {} curves...", requests.len());
    let results = workflows::simulate::simulate_batch(&requests, &config, &reporter);
    let entries = workflows::into_entries(results);

    let failed = entries.iter().filter(|e| !e.success).count();
    println!(
        "Simulated {} curve(s), {} rejected.",
        entries.len() - failed,
        failed
    );
    write_json(&entries, args.output.as_deref())
}

fn read_requests(path: &Path) -> Result<Vec<SimulationRequest>> {
    info!("Loading simulation requests from {:?}", path);
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}
