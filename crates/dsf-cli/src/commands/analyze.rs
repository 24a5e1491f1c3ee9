use crate::cli::AnalyzeArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::output::write_json;
use crate::utils::progress::CliProgressHandler;
use nanodsf::core::io::table::CsvTable;
use nanodsf::core::io::traits::MeasurementFile;
use nanodsf::core::models::curve::Measurement;
use nanodsf::core::models::output::AnalysisOutput;
use nanodsf::engine::config::AnalysisConfig;
use nanodsf::engine::error::EngineError;
use nanodsf::engine::progress::ProgressReporter;
use nanodsf::workflows::{self, BatchEntry};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One analyzed input table of a multi-file run.
#[derive(Debug, Serialize)]
struct FileResult {
    source: String,
    #[serde(flatten)]
    entry: BatchEntry<AnalysisOutput>,
}

pub fn run(args: AnalyzeArgs, show_progress: bool) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref(), &args.set_values)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.into_analysis_config(&args)?;
    let output_files = match args.output.as_deref() {
        Some(dir) if dir.is_dir() && args.input.len() > 1 => {
            Some(per_file_outputs(dir, &args.input)?)
        }
        _ => None,
    };

    let curves = args
        .input
        .iter()
        .map(|path| read_table(path))
        .collect::<Result<Vec<_>>>()?;

    let progress_handler = CliProgressHandler::new(show_progress);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    if let [curve] = curves.as_slice() {
        let output = workflows::analyze::analyze(curve, &config, &reporter)?;
        report_summary(&args.input[0], &output);
        let output = strip_plot_data(output, args.no_plot_data);
        return write_json(&output, args.output.as_deref());
    }

    let results = analyze_all(&curves, &config, &reporter);
    let failed = results.iter().filter(|r| r.is_err()).count();
    println!(
        "Analyzed {} curve(s), {} failed.",
        results.len() - failed,
        failed
    );

    let file_results: Vec<FileResult> = args
        .input
        .iter()
        .zip(workflows::into_entries(results))
        .map(|(path, mut entry)| {
            entry.data = entry.data.map(|o| strip_plot_data(o, args.no_plot_data));
            FileResult {
                source: path.display().to_string(),
                entry,
            }
        })
        .collect();

    match (output_files, args.output.as_deref()) {
        (Some(paths), Some(dir)) => {
            for (result, path) in file_results.iter().zip(&paths) {
                write_json(result, Some(path))?;
            }
            println!(
                "Wrote {} result file(s) to {}",
                file_results.len(),
                dir.display()
            );
            Ok(())
        }
        (_, other) => write_json(&file_results, other),
    }
}

fn analyze_all(
    curves: &[Vec<Measurement>],
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Vec<std::result::Result<AnalysisOutput, EngineError>> {
    println!("Analyzing {} curves...", curves.len());
    workflows::analyze::analyze_batch(curves, config, reporter)
}

fn read_table(path: &Path) -> Result<Vec<Measurement>> {
    info!("Loading measurement table from {:?}", path);
    let (rows, metadata) =
        CsvTable::read_from_path(path).map_err(|e| CliError::table(path, e))?;
    if metadata.unparsable_rows > 0 {
        warn!(
            path = %path.display(),
            rows = metadata.unparsable_rows,
            "Table contains rows with non-numeric cells."
        );
    }
    info!(
        temperature = %metadata.temperature_column,
        f330 = %metadata.f330_column,
        f350 = %metadata.f350_column,
        rows = rows.len(),
        "Matched table columns."
    );
    Ok(rows)
}

fn report_summary(path: &Path, output: &AnalysisOutput) {
    let metrics = &output.metrics;
    match metrics.tm {
        Some(tm) => println!(
            "✓ {}: Tm {:.2} °C (confidence {:.2}), {} transition(s), quality {} ({:.0})",
            path.display(),
            tm,
            metrics.tm_confidence,
            metrics.num_transitions,
            output.quality.label,
            output.quality.score
        ),
        None => println!(
            "✓ {}: no unfolding transition detected, quality {} ({:.0})",
            path.display(),
            output.quality.label,
            output.quality.score
        ),
    }
    if let Some(description) = &output.anomalies.description {
        println!("  Anomaly: {}", description);
    }
}

fn strip_plot_data(mut output: AnalysisOutput, strip: bool) -> AnalysisOutput {
    if strip {
        output.plot_data.raw_temperature.clear();
        output.plot_data.raw_ratio.clear();
        output.plot_data.smoothed_ratio.clear();
        output.plot_data.derivative_values.clear();
    }
    output
}

/// One `<stem>.json` per input; inputs sharing a stem would overwrite each other.
fn per_file_outputs(dir: &Path, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .map(|source| {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "curve".to_string());
            let path = dir.join(format!("{}.json", stem));
            if seen.insert(path.clone()) {
                Ok(path)
            } else {
                Err(CliError::Argument(format!(
                    "input '{}' would overwrite {}; rename it or write one combined file",
                    source.display(),
                    path.display()
                )))
            }
        })
        .collect()
}
