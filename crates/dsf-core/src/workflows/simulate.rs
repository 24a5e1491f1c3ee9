use crate::core::models::simulation::{RoundTripReport, SimulationRequest, SimulationResult};
use crate::engine::config::{AnalysisConfig, SimulationConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::SimulationEngine;
use crate::workflows::analyze::analyze_ratios;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Simulates one curve.
///
/// # Errors
///
/// Returns [`EngineError::InvalidSimulationParameter`] for a request outside the
/// documented parameter domains, before any computation.
pub fn simulate(
    request: &SimulationRequest,
    config: &SimulationConfig,
) -> Result<SimulationResult, EngineError> {
    SimulationEngine::new(config).simulate(request)
}

/// Simulates independent requests, one result per request in request order.
///
/// With a configured seed, request `i` draws its noise from `seed + i`, so a batch
/// is reproducible regardless of how the work is scheduled.
#[instrument(skip_all, name = "simulation_batch_workflow", fields(requests = requests.len()))]
pub fn simulate_batch(
    requests: &[SimulationRequest],
    config: &SimulationConfig,
    reporter: &ProgressReporter,
) -> Vec<Result<SimulationResult, EngineError>> {
    let engine = SimulationEngine::new(config);
    reporter.report(Progress::TaskStart {
        total_steps: requests.len() as u64,
    });

    let run = |(index, request): (usize, &SimulationRequest)| {
        let result = match config.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
                engine.simulate_with_rng(request, &mut rng)
            }
            None => engine.simulate_with_rng(request, &mut rand::rng()),
        };
        reporter.report(Progress::TaskIncrement);
        result
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = requests.iter().enumerate().map(run).collect();

    #[cfg(feature = "parallel")]
    let results: Vec<_> = requests.par_iter().enumerate().map(run).collect();

    reporter.report(Progress::TaskFinish);
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(total = results.len(), failed, "Batch simulation complete.");
    results
}

/// Simulates a curve and feeds it straight back through the analyzer.
///
/// This is the only place the two pipelines meet; [`simulate`] never analyzes.
#[instrument(skip_all, name = "round_trip_workflow", fields(base_tm = request.base_tm))]
pub fn round_trip(
    request: &SimulationRequest,
    simulation_config: &SimulationConfig,
    analysis_config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<RoundTripReport, EngineError> {
    let simulated = reporter.phase("Simulation", || simulate(request, simulation_config))?;
    let output = analyze_ratios(
        &simulated.temperatures,
        &simulated.ratios,
        analysis_config,
        reporter,
    )?;

    let recovered_tm = output.metrics.tm;
    let tm_error = recovered_tm.map(|tm| tm - simulated.predicted_tm);
    info!(
        predicted_tm = simulated.predicted_tm,
        recovered_tm,
        tm_error,
        "Round trip complete."
    );

    Ok(RoundTripReport {
        predicted_tm: simulated.predicted_tm,
        recovered_tm,
        tm_error,
        num_transitions: output.metrics.num_transitions,
        tm_confidence: output.metrics.tm_confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ErrorKind;

    fn seeded() -> SimulationConfig {
        SimulationConfig::default().with_seed(7)
    }

    #[test]
    fn batch_returns_one_result_per_request_in_order() {
        let requests: Vec<SimulationRequest> = [50.0, 60.0, 70.0, 80.0]
            .iter()
            .map(|&base_tm| SimulationRequest {
                base_tm,
                ..SimulationRequest::default()
            })
            .collect();
        let results = simulate_batch(&requests, &seeded(), &ProgressReporter::new());

        assert_eq!(results.len(), 4);
        for (result, expected) in results.iter().zip([50.0, 60.0, 70.0, 80.0]) {
            assert_eq!(result.as_ref().unwrap().predicted_tm, expected);
        }
    }

    #[test]
    fn invalid_request_does_not_block_the_rest() {
        let requests = vec![
            SimulationRequest::default(),
            SimulationRequest {
                ph: 20.0,
                ..SimulationRequest::default()
            },
            SimulationRequest::default(),
        ];
        let results = simulate_batch(&requests, &seeded(), &ProgressReporter::new());

        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().unwrap_err().kind(),
            ErrorKind::InvalidSimulationParameter
        );
        assert!(results[2].is_ok());
    }

    #[test]
    fn seeded_batch_is_reproducible_and_items_differ() {
        let requests = vec![SimulationRequest::default(); 2];
        let a = simulate_batch(&requests, &seeded(), &ProgressReporter::new());
        let b = simulate_batch(&requests, &seeded(), &ProgressReporter::new());

        assert_eq!(a, b);
        assert_ne!(
            a[0].as_ref().unwrap().ratios,
            a[1].as_ref().unwrap().ratios
        );
    }

    #[test]
    fn round_trip_recovers_the_predicted_tm() {
        let request = SimulationRequest {
            base_tm: 55.0,
            ligand_affinity: 4.0,
            ..SimulationRequest::default()
        };
        let report = round_trip(
            &request,
            &seeded(),
            &AnalysisConfig::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.predicted_tm, 59.0);
        assert_eq!(report.num_transitions, 1);
        let error = report.tm_error.unwrap();
        assert!(error.abs() < 1.0, "tm error {error}");
        assert!(report.tm_confidence > 0.3);
    }

    #[test]
    fn default_noise_curves_yield_exactly_one_transition() {
        let analysis = AnalysisConfig::default();
        for base_tm in [40.0, 55.0, 60.0, 75.0] {
            let request = SimulationRequest {
                base_tm,
                ..SimulationRequest::default()
            };
            for seed in 0..50 {
                let config = SimulationConfig::default().with_seed(seed);
                let curve = simulate(&request, &config).unwrap();
                let output = analyze_ratios(
                    &curve.temperatures,
                    &curve.ratios,
                    &analysis,
                    &ProgressReporter::new(),
                )
                .unwrap();

                let metrics = &output.metrics;
                assert_eq!(
                    metrics.num_transitions, 1,
                    "tm {base_tm} seed {seed}: {:?}",
                    metrics.transitions
                );
                let tm = metrics.tm.unwrap();
                assert!((tm - base_tm).abs() < 1.5, "tm {base_tm} seed {seed}: found {tm}");
                assert!(
                    !output.anomalies.has_anomalies,
                    "tm {base_tm} seed {seed}: {:?}",
                    output.anomalies
                );
            }
        }
    }

    #[test]
    fn round_trip_rejects_invalid_requests() {
        let request = SimulationRequest {
            temperature_range_start: 90.0,
            temperature_range_end: 30.0,
            ..SimulationRequest::default()
        };
        let error = round_trip(
            &request,
            &seeded(),
            &AnalysisConfig::default(),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidSimulationParameter);
    }
}
