use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Parameter '{parameter}' = {value} is out of range: expected {expected}")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    pub min_points: usize,
    /// Largest tolerated share of rows with a non-finite temperature or intensity.
    pub max_non_finite_fraction: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_points: 20,
            max_non_finite_fraction: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingConfig {
    /// Target window as a fraction of the point count.
    pub window_fraction: f64,
    pub min_window: usize,
    pub polynomial_order: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_fraction: 0.07,
            min_window: 5,
            polynomial_order: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionConfig {
    /// Length of the sliding window used to find the flattest derivative region.
    pub noise_window_fraction: f64,
    pub min_noise_window: usize,
    /// Lower clamp for the derivative noise estimate, in ratio/°C.
    pub noise_floor: f64,
    /// Detection threshold in noise standard deviations above the baseline level.
    pub threshold_sigma: f64,
    /// Candidates smaller than this fraction of the global maximum are ignored.
    pub min_relative_height: f64,
    /// Two peaks merge when the valley between them stays above this fraction of the smaller.
    pub merge_valley_fraction: f64,
    /// Onset/offset are where |d| falls to this fraction of the peak height.
    pub boundary_fraction: f64,
    /// Peaks spanning fewer samples than this from onset to offset are filter ringing.
    pub min_span_points: usize,
    pub sharpness_scale: f64,
    pub min_confidence: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            noise_window_fraction: 0.1,
            min_noise_window: 10,
            noise_floor: 1e-6,
            threshold_sigma: 4.0,
            min_relative_height: 0.1,
            merge_valley_fraction: 0.5,
            boundary_fraction: 0.1,
            min_span_points: 5,
            sharpness_scale: 10.0,
            min_confidence: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityConfig {
    /// Each transition span is widened by this fraction of its width on both sides
    /// before the remaining points are used as baseline.
    pub baseline_margin_fraction: f64,
    pub min_baseline_points: usize,
    pub noise_floor: f64,
    pub reference_snr: f64,
    pub reference_points: usize,
    /// Fit residual, as a fraction of the amplitude, that zeroes the fit term.
    pub fit_tolerance_fraction: f64,
    pub snr_weight: f64,
    pub points_weight: f64,
    pub fit_weight: f64,

    pub max_baseline_noise: f64,
    pub min_transition_points: usize,
    pub min_snr: f64,
    pub min_temperature_range: f64,
    pub recommended_points: usize,

    pub noise_penalty: f64,
    pub sparse_transition_penalty: f64,
    pub low_snr_penalty: f64,
    pub no_transition_penalty: f64,
    pub narrow_range_penalty: f64,
    pub few_points_penalty: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            baseline_margin_fraction: 0.5,
            min_baseline_points: 8,
            noise_floor: 1e-6,
            reference_snr: 100.0,
            reference_points: 100,
            fit_tolerance_fraction: 0.05,
            snr_weight: 50.0,
            points_weight: 15.0,
            fit_weight: 35.0,
            max_baseline_noise: 0.01,
            min_transition_points: 10,
            min_snr: 10.0,
            min_temperature_range: 30.0,
            recommended_points: 50,
            noise_penalty: 10.0,
            sparse_transition_penalty: 10.0,
            low_snr_penalty: 15.0,
            no_transition_penalty: 25.0,
            narrow_range_penalty: 10.0,
            few_points_penalty: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyConfig {
    /// Adjacent peaks closer than this (°C) are flagged as a likely artifact.
    pub min_peak_separation: f64,
    /// Share of the temperature range, counted from the hot end, searched for spikes.
    pub late_region_fraction: f64,
    pub spike_median_multiple: f64,
    pub spike_max_fraction: f64,
    /// Slope changes below this are treated as rounding noise.
    pub spike_floor: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_peak_separation: 10.0,
            late_region_fraction: 0.35,
            spike_median_multiple: 8.0,
            spike_max_fraction: 0.25,
            spike_floor: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisConfig {
    pub validation: ValidationConfig,
    pub smoothing: SmoothingConfig,
    pub transitions: TransitionConfig,
    pub quality: QualityConfig,
    pub anomalies: AnomalyConfig,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    validation: Option<ValidationConfig>,
    smoothing: Option<SmoothingConfig>,
    transitions: Option<TransitionConfig>,
    quality: Option<QualityConfig>,
    anomalies: Option<AnomalyConfig>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validation(mut self, config: ValidationConfig) -> Self {
        self.validation = Some(config);
        self
    }
    pub fn smoothing(mut self, config: SmoothingConfig) -> Self {
        self.smoothing = Some(config);
        self
    }
    pub fn transitions(mut self, config: TransitionConfig) -> Self {
        self.transitions = Some(config);
        self
    }
    pub fn quality(mut self, config: QualityConfig) -> Self {
        self.quality = Some(config);
        self
    }
    pub fn anomalies(mut self, config: AnomalyConfig) -> Self {
        self.anomalies = Some(config);
        self
    }

    pub fn min_points(mut self, n: usize) -> Self {
        self.validation.get_or_insert_with(Default::default).min_points = n;
        self
    }
    pub fn window_fraction(mut self, fraction: f64) -> Self {
        self.smoothing.get_or_insert_with(Default::default).window_fraction = fraction;
        self
    }
    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.transitions.get_or_insert_with(Default::default).min_confidence = confidence;
        self
    }
    pub fn boundary_fraction(mut self, fraction: f64) -> Self {
        self.transitions.get_or_insert_with(Default::default).boundary_fraction = fraction;
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let config = AnalysisConfig {
            validation: self.validation.unwrap_or_default(),
            smoothing: self.smoothing.unwrap_or_default(),
            transitions: self.transitions.unwrap_or_default(),
            quality: self.quality.unwrap_or_default(),
            anomalies: self.anomalies.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn check(
    parameter: &'static str,
    value: f64,
    expected: &'static str,
    ok: impl FnOnce(f64) -> bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            parameter,
            value,
            expected,
        })
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        check("validation.min-points", v.min_points as f64, ">= 3", |x| x >= 3.0)?;
        check(
            "validation.max-non-finite-fraction",
            v.max_non_finite_fraction,
            "[0, 1)",
            |x| (0.0..1.0).contains(&x),
        )?;

        let s = &self.smoothing;
        check("smoothing.window-fraction", s.window_fraction, "[0, 1]", |x| {
            (0.0..=1.0).contains(&x)
        })?;
        check("smoothing.min-window", s.min_window as f64, ">= 1", |x| x >= 1.0)?;
        check("smoothing.polynomial-order", s.polynomial_order as f64, "[0, 5]", |x| {
            x <= 5.0
        })?;
        if s.polynomial_order >= s.min_window.max(1) {
            return Err(ConfigError::Inconsistent(format!(
                "polynomial order {} needs a minimum window larger than {}",
                s.polynomial_order, s.min_window
            )));
        }

        let t = &self.transitions;
        let unit = |x: f64| x > 0.0 && x < 1.0;
        check("transitions.noise-window-fraction", t.noise_window_fraction, "(0, 1)", unit)?;
        check("transitions.min-noise-window", t.min_noise_window as f64, ">= 3", |x| x >= 3.0)?;
        check("transitions.noise-floor", t.noise_floor, "> 0", |x| x > 0.0)?;
        check("transitions.threshold-sigma", t.threshold_sigma, ">= 0", |x| x >= 0.0)?;
        check("transitions.min-relative-height", t.min_relative_height, "[0, 1)", |x| {
            (0.0..1.0).contains(&x)
        })?;
        check("transitions.merge-valley-fraction", t.merge_valley_fraction, "(0, 1)", unit)?;
        check("transitions.boundary-fraction", t.boundary_fraction, "(0, 1)", unit)?;
        check("transitions.min-span-points", t.min_span_points as f64, ">= 1", |x| x >= 1.0)?;
        check("transitions.sharpness-scale", t.sharpness_scale, "> 0", |x| x > 0.0)?;
        check("transitions.min-confidence", t.min_confidence, "[0, 1]", |x| {
            (0.0..=1.0).contains(&x)
        })?;

        let q = &self.quality;
        check("quality.baseline-margin-fraction", q.baseline_margin_fraction, ">= 0", |x| {
            x >= 0.0
        })?;
        check("quality.noise-floor", q.noise_floor, "> 0", |x| x > 0.0)?;
        check("quality.reference-snr", q.reference_snr, "> 1", |x| x > 1.0)?;
        check("quality.reference-points", q.reference_points as f64, ">= 1", |x| x >= 1.0)?;
        check("quality.fit-tolerance-fraction", q.fit_tolerance_fraction, "> 0", |x| {
            x > 0.0
        })?;
        for (name, weight) in [
            ("quality.snr-weight", q.snr_weight),
            ("quality.points-weight", q.points_weight),
            ("quality.fit-weight", q.fit_weight),
        ] {
            check(name, weight, ">= 0", |x| x >= 0.0)?;
        }
        let total = q.snr_weight + q.points_weight + q.fit_weight;
        if (total - 100.0).abs() > 1e-6 {
            return Err(ConfigError::Inconsistent(format!(
                "quality weights must sum to 100, got {total}"
            )));
        }

        let a = &self.anomalies;
        check("anomalies.min-peak-separation", a.min_peak_separation, ">= 0", |x| x >= 0.0)?;
        check("anomalies.late-region-fraction", a.late_region_fraction, "(0, 1)", unit)?;
        check("anomalies.spike-median-multiple", a.spike_median_multiple, "> 0", |x| x > 0.0)?;
        check("anomalies.spike-max-fraction", a.spike_max_fraction, "[0, 1]", |x| {
            (0.0..=1.0).contains(&x)
        })?;
        check("anomalies.spike-floor", a.spike_floor, ">= 0", |x| x >= 0.0)?;
        Ok(())
    }
}

/// Constants of the forward model and its noise generator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Logistic width of the unfolding transition in °C.
    pub transition_width: f64,
    /// Ratio of the folded state.
    pub ratio_floor: f64,
    pub reference_ph: f64,
    /// Tm shift per pH unit away from the reference.
    pub ph_coefficient: f64,
    pub concentration_coefficient: f64,
    pub concentration_floor: f64,
    pub num_points: usize,
    /// Noise standard deviation as a fraction of the base amplitude.
    pub noise_fraction: f64,
    pub min_ratio: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            transition_width: 2.0,
            ratio_floor: 0.4,
            reference_ph: 7.4,
            ph_coefficient: 0.5,
            concentration_coefficient: 0.2,
            concentration_floor: 0.1,
            num_points: 200,
            noise_fraction: 0.01,
            min_ratio: 0.01,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("simulation.transition-width", self.transition_width, "> 0", |x| x > 0.0)?;
        check("simulation.ratio-floor", self.ratio_floor, "finite", |_| true)?;
        check("simulation.reference-ph", self.reference_ph, "[0, 14]", |x| {
            (0.0..=14.0).contains(&x)
        })?;
        check("simulation.ph-coefficient", self.ph_coefficient, "finite", |_| true)?;
        check(
            "simulation.concentration-coefficient",
            self.concentration_coefficient,
            "finite",
            |_| true,
        )?;
        check("simulation.concentration-floor", self.concentration_floor, "> 0", |x| {
            x > 0.0
        })?;
        check("simulation.num-points", self.num_points as f64, ">= 2", |x| x >= 2.0)?;
        check("simulation.noise-fraction", self.noise_fraction, ">= 0", |x| x >= 0.0)?;
        check("simulation.min-ratio", self.min_ratio, ">= 0", |x| x >= 0.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_without_overrides_yields_defaults() {
        let config = AnalysisConfigBuilder::new().build().unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.validation.min_points, 20);
        assert_eq!(config.transitions.boundary_fraction, 0.1);
    }

    #[test]
    fn scalar_setters_override_single_fields() {
        let config = AnalysisConfigBuilder::new()
            .min_points(30)
            .min_confidence(0.5)
            .window_fraction(0.05)
            .build()
            .unwrap();
        assert_eq!(config.validation.min_points, 30);
        assert_eq!(config.transitions.min_confidence, 0.5);
        assert_eq!(config.smoothing.window_fraction, 0.05);
        assert_eq!(config.quality, QualityConfig::default());
    }

    #[test]
    fn build_fails_for_out_of_range_boundary_fraction() {
        let result = AnalysisConfigBuilder::new().boundary_fraction(1.5).build();
        assert!(matches!(
            result,
            Err(ConfigError::OutOfRange {
                parameter: "transitions.boundary-fraction",
                ..
            })
        ));
    }

    #[test]
    fn build_fails_for_non_finite_values() {
        let result = AnalysisConfigBuilder::new().min_confidence(f64::NAN).build();
        assert!(result.is_err());
    }

    #[test]
    fn build_fails_when_quality_weights_do_not_sum_to_hundred() {
        let quality = QualityConfig {
            snr_weight: 80.0,
            ..QualityConfig::default()
        };
        let result = AnalysisConfigBuilder::new().quality(quality).build();
        assert!(matches!(result, Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn build_fails_when_polynomial_order_exceeds_window() {
        let smoothing = SmoothingConfig {
            min_window: 3,
            polynomial_order: 3,
            ..SmoothingConfig::default()
        };
        let result = AnalysisConfigBuilder::new().smoothing(smoothing).build();
        assert!(matches!(result, Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn simulation_defaults_are_valid_and_seed_is_optional() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, None);
        assert_eq!(config.with_seed(7).seed, Some(7));
    }

    #[test]
    fn simulation_config_rejects_zero_width() {
        let config = SimulationConfig {
            transition_width: 0.0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
