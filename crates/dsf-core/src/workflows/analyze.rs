use crate::core::models::curve::{Measurement, RawCurve};
use crate::core::models::output::{AnalysisOutput, CurveMetrics, PlotData};
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::anomalies::AnomalyDetector;
use crate::engine::tasks::quality::QualityAssessor;
use crate::engine::tasks::smoothing::{Smoother, differentiate};
use crate::engine::tasks::transitions::DerivativeAnalyzer;
use crate::engine::validation::CurveValidator;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Validates measurement rows and runs the full analysis on the resulting curve.
///
/// # Errors
///
/// Returns [`EngineError::MalformedCurve`] when the rows do not form a valid curve; no
/// partial output is produced in that case. A curve without any detectable transition
/// is not an error.
#[instrument(skip_all, name = "analysis_workflow", fields(rows = measurements.len()))]
pub fn analyze(
    measurements: &[Measurement],
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<AnalysisOutput, EngineError> {
    let raw = reporter.phase("Validation", || {
        CurveValidator::new(&config.validation).validate(measurements)
    })?;
    Ok(analyze_curve(&raw, config, reporter))
}

/// Same as [`analyze`] for callers that already formed the F350/F330 ratio.
pub fn analyze_ratios(
    temperatures: &[f64],
    ratios: &[f64],
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<AnalysisOutput, EngineError> {
    let raw = reporter.phase("Validation", || {
        CurveValidator::new(&config.validation).validate_ratios(temperatures, ratios)
    })?;
    Ok(analyze_curve(&raw, config, reporter))
}

/// Runs smoothing, transition detection, quality and anomaly assessment on a valid curve.
pub fn analyze_curve(
    raw: &RawCurve,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> AnalysisOutput {
    let (smoothed, derivative) = reporter.phase("Smoothing", || {
        let smoothed = Smoother::new(&config.smoothing).smooth(raw);
        let derivative = differentiate(&smoothed);
        (smoothed, derivative)
    });

    let transitions = reporter.phase("Transition Detection", || {
        DerivativeAnalyzer::new(&config.transitions).detect(&derivative)
    });

    let quality = reporter.phase("Quality Assessment", || {
        QualityAssessor::new(&config.quality).assess(raw, &smoothed, &transitions)
    });

    let anomalies = reporter.phase("Anomaly Detection", || {
        AnomalyDetector::new(&config.anomalies).detect(&smoothed, &derivative, &transitions)
    });

    let metrics = CurveMetrics::from_analysis(&smoothed, &derivative, &transitions);
    info!(
        tm = metrics.tm,
        num_transitions = metrics.num_transitions,
        score = quality.score,
        has_anomalies = anomalies.has_anomalies,
        "Analysis complete."
    );

    AnalysisOutput {
        metrics,
        quality,
        anomalies,
        plot_data: PlotData::new(raw, &smoothed, &derivative),
    }
}

/// Analyzes independent curves, one result per input in input order.
///
/// A failing curve does not affect the others. Runs on the rayon pool when the
/// `parallel` feature is enabled.
#[instrument(skip_all, name = "analysis_batch_workflow", fields(curves = curves.len()))]
pub fn analyze_batch<C>(
    curves: &[C],
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Vec<Result<AnalysisOutput, EngineError>>
where
    C: AsRef<[Measurement]> + Sync,
{
    reporter.report(Progress::TaskStart {
        total_steps: curves.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = curves.iter();

    #[cfg(feature = "parallel")]
    let iterator = curves.par_iter();

    let results: Vec<_> = iterator
        .map(|curve| {
            let result = analyze(curve.as_ref(), config, &ProgressReporter::new());
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(total = results.len(), failed, "Batch analysis complete.");
    results
}
