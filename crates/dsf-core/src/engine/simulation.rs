use crate::core::models::simulation::{SimulationRequest, SimulationResult};
use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, instrument};

/// Accepted numeric domain of one request field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDomain {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    /// `false` when `min` itself is excluded.
    pub min_inclusive: bool,
    pub unit: &'static str,
    pub description: &'static str,
}

impl ParameterDomain {
    pub fn contains(&self, value: f64) -> bool {
        let above = if self.min_inclusive {
            value >= self.min
        } else {
            value > self.min
        };
        value.is_finite() && above && value <= self.max
    }

    fn expected(&self) -> String {
        let open = if self.min_inclusive { '[' } else { '(' };
        if self.max.is_infinite() {
            format!("a finite value in {open}{}, ∞)", self.min)
        } else {
            format!("a finite value in {open}{}, {}]", self.min, self.max)
        }
    }
}

const PARAMETER_DOMAINS: [ParameterDomain; 7] = [
    ParameterDomain {
        name: "base_tm",
        min: 0.0,
        max: 150.0,
        min_inclusive: true,
        unit: "°C",
        description: "Intrinsic melting temperature",
    },
    ParameterDomain {
        name: "base_amplitude",
        min: 0.0,
        max: 10.0,
        min_inclusive: false,
        unit: "ratio",
        description: "Ratio change across the transition",
    },
    ParameterDomain {
        name: "ph",
        min: 0.0,
        max: 14.0,
        min_inclusive: true,
        unit: "",
        description: "Buffer pH; shifts Tm linearly around the reference pH",
    },
    ParameterDomain {
        name: "protein_concentration",
        min: 0.0,
        max: f64::INFINITY,
        min_inclusive: true,
        unit: "mg/mL",
        description: "Protein concentration; logarithmic stabilization",
    },
    ParameterDomain {
        name: "ligand_affinity",
        min: -50.0,
        max: 50.0,
        min_inclusive: true,
        unit: "°C",
        description: "Ligand-induced Tm shift",
    },
    ParameterDomain {
        name: "temperature_range_start",
        min: -50.0,
        max: 200.0,
        min_inclusive: true,
        unit: "°C",
        description: "First simulated temperature",
    },
    ParameterDomain {
        name: "temperature_range_end",
        min: -50.0,
        max: 200.0,
        min_inclusive: true,
        unit: "°C",
        description: "Last simulated temperature; must exceed the start",
    },
];

/// The documented domain of every request field, in request field order.
pub fn parameter_domains() -> &'static [ParameterDomain] {
    &PARAMETER_DOMAINS
}

/// Logistic forward model of a two-state unfolding curve.
pub struct SimulationEngine<'a> {
    config: &'a SimulationConfig,
}

impl<'a> SimulationEngine<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, request: &SimulationRequest) -> Result<(), EngineError> {
        let values = [
            request.base_tm,
            request.base_amplitude,
            request.ph,
            request.protein_concentration,
            request.ligand_affinity,
            request.temperature_range_start,
            request.temperature_range_end,
        ];
        for (domain, value) in PARAMETER_DOMAINS.iter().zip(values) {
            if !domain.contains(value) {
                return Err(EngineError::InvalidSimulationParameter {
                    parameter: domain.name,
                    value,
                    reason: format!("expected {}", domain.expected()),
                });
            }
        }
        if request.temperature_range_end <= request.temperature_range_start {
            return Err(EngineError::InvalidSimulationParameter {
                parameter: "temperature_range_end",
                value: request.temperature_range_end,
                reason: format!(
                    "must be greater than temperature_range_start ({})",
                    request.temperature_range_start
                ),
            });
        }
        Ok(())
    }

    /// Tm of the noiseless model under the requested conditions.
    pub fn effective_tm(&self, request: &SimulationRequest) -> f64 {
        let cfg = self.config;
        let ph_shift = cfg.ph_coefficient * (request.ph - cfg.reference_ph);
        let concentration_shift = cfg.concentration_coefficient
            * request.protein_concentration.max(cfg.concentration_floor).ln();
        request.base_tm + ph_shift + request.ligand_affinity + concentration_shift
    }

    /// Simulates with the configured seed, or with fresh entropy when none is set.
    pub fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResult, EngineError> {
        match self.config.seed {
            Some(seed) => self.simulate_with_rng(request, &mut StdRng::seed_from_u64(seed)),
            None => self.simulate_with_rng(request, &mut rand::rng()),
        }
    }

    #[instrument(skip_all, name = "simulation_task", fields(base_tm = request.base_tm))]
    pub fn simulate_with_rng<R: Rng + ?Sized>(
        &self,
        request: &SimulationRequest,
        rng: &mut R,
    ) -> Result<SimulationResult, EngineError> {
        self.validate(request)?;
        let cfg = self.config;
        let predicted_tm = self.effective_tm(request);

        let n = cfg.num_points.max(2);
        let (start, end) = (request.temperature_range_start, request.temperature_range_end);
        let step = (end - start) / (n - 1) as f64;
        let temperatures: Vec<f64> = (0..n)
            .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
            .collect();

        let sigma = cfg.noise_fraction * request.base_amplitude;
        let noise = Normal::new(0.0, sigma).map_err(|e| EngineError::NumericInstability {
            context: "simulation noise",
            reason: e.to_string(),
        })?;

        let ratios: Vec<f64> = temperatures
            .iter()
            .map(|&t| {
                let unfolded = logistic((t - predicted_tm) / cfg.transition_width);
                let clean = request.base_amplitude * unfolded + cfg.ratio_floor;
                (clean + noise.sample(rng)).max(cfg.min_ratio)
            })
            .collect();

        if let Some(i) = ratios.iter().position(|r| !r.is_finite()) {
            return Err(EngineError::NumericInstability {
                context: "simulation output",
                reason: format!("ratio at {} °C is not finite", temperatures[i]),
            });
        }

        debug!(predicted_tm, points = n, "Simulated curve.");
        Ok(SimulationResult {
            temperatures,
            ratios,
            predicted_tm,
        })
    }
}

#[inline]
fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ErrorKind;

    const TOLERANCE: f64 = 1e-9;

    fn engine_config() -> SimulationConfig {
        SimulationConfig::default().with_seed(42)
    }

    #[test]
    fn reference_request_predicts_exactly_sixty() {
        let config = engine_config();
        let result = SimulationEngine::new(&config)
            .simulate(&SimulationRequest::default())
            .unwrap();
        assert_eq!(result.predicted_tm, 60.0);
        assert_eq!(result.temperatures.len(), 200);
        assert_eq!(result.ratios.len(), 200);
        assert_eq!(result.temperatures[0], 20.0);
        assert_eq!(result.temperatures[199], 95.0);
    }

    #[test]
    fn one_ph_unit_above_reference_shifts_tm_by_half_a_degree() {
        let config = engine_config();
        let engine = SimulationEngine::new(&config);
        let base = engine.simulate(&SimulationRequest::default()).unwrap();
        let shifted = engine
            .simulate(&SimulationRequest {
                ph: 8.4,
                ..SimulationRequest::default()
            })
            .unwrap();
        assert!((shifted.predicted_tm - base.predicted_tm - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn ligand_and_concentration_shift_tm() {
        let config = engine_config();
        let engine = SimulationEngine::new(&config);
        let request = SimulationRequest {
            ligand_affinity: 3.0,
            protein_concentration: 0.0,
            ..SimulationRequest::default()
        };
        let expected = 60.0 + 3.0 + 0.2 * 0.1_f64.ln();
        assert!((engine.effective_tm(&request) - expected).abs() < TOLERANCE);
    }

    #[test]
    fn predicted_tm_ignores_noise_while_ratios_do_not() {
        let config = SimulationConfig::default();
        let engine = SimulationEngine::new(&config);
        let request = SimulationRequest::default();
        let a = engine.simulate_with_rng(&request, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = engine.simulate_with_rng(&request, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(a.predicted_tm, b.predicted_tm);
        assert_ne!(a.ratios, b.ratios);
    }

    #[test]
    fn fixed_seed_reproduces_ratios() {
        let config = engine_config();
        let engine = SimulationEngine::new(&config);
        let a = engine.simulate(&SimulationRequest::default()).unwrap();
        let b = engine.simulate(&SimulationRequest::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn noiseless_curve_follows_the_logistic_model() {
        let config = SimulationConfig {
            noise_fraction: 0.0,
            ..SimulationConfig::default()
        };
        let result = SimulationEngine::new(&config)
            .simulate(&SimulationRequest::default())
            .unwrap();
        assert!((result.ratios[0] - 0.4).abs() < 1e-6);
        assert!((result.ratios[199] - 0.7).abs() < 1e-6);
        let mid = result.temperatures.iter().position(|&t| t >= 60.0).unwrap();
        assert!(result.ratios[mid] > 0.5 && result.ratios[mid] < 0.62);
    }

    #[test]
    fn out_of_domain_fields_are_rejected_before_simulation() {
        let config = engine_config();
        let engine = SimulationEngine::new(&config);
        let cases = [
            SimulationRequest { ph: 14.5, ..Default::default() },
            SimulationRequest { ph: f64::NAN, ..Default::default() },
            SimulationRequest { protein_concentration: -1.0, ..Default::default() },
            SimulationRequest { base_amplitude: 0.0, ..Default::default() },
            SimulationRequest { base_tm: 200.0, ..Default::default() },
            SimulationRequest { temperature_range_end: 20.0, ..Default::default() },
        ];
        for request in cases {
            let error = engine.simulate(&request).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidSimulationParameter, "{request:?}");
        }
    }

    #[test]
    fn domain_table_covers_every_request_field() {
        let names: Vec<&str> = parameter_domains().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "base_tm",
                "base_amplitude",
                "ph",
                "protein_concentration",
                "ligand_affinity",
                "temperature_range_start",
                "temperature_range_end",
            ]
        );
        assert!(!parameter_domains()[1].contains(0.0));
        assert!(parameter_domains()[3].contains(0.0));
    }
}
