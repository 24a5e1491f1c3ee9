use crate::cli::{AnalyzeArgs, ModelArgs};
use crate::error::{CliError, Result};
use nanodsf::engine::config as core_config;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialValidationConfig {
    min_points: Option<usize>,
    max_non_finite_fraction: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSmoothingConfig {
    window_fraction: Option<f64>,
    min_window: Option<usize>,
    polynomial_order: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialTransitionConfig {
    noise_window_fraction: Option<f64>,
    min_noise_window: Option<usize>,
    noise_floor: Option<f64>,
    threshold_sigma: Option<f64>,
    min_relative_height: Option<f64>,
    merge_valley_fraction: Option<f64>,
    boundary_fraction: Option<f64>,
    min_span_points: Option<usize>,
    sharpness_scale: Option<f64>,
    min_confidence: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialQualityConfig {
    baseline_margin_fraction: Option<f64>,
    min_baseline_points: Option<usize>,
    noise_floor: Option<f64>,
    reference_snr: Option<f64>,
    reference_points: Option<usize>,
    fit_tolerance_fraction: Option<f64>,
    snr_weight: Option<f64>,
    points_weight: Option<f64>,
    fit_weight: Option<f64>,
    max_baseline_noise: Option<f64>,
    min_transition_points: Option<usize>,
    min_snr: Option<f64>,
    min_temperature_range: Option<f64>,
    recommended_points: Option<usize>,
    noise_penalty: Option<f64>,
    sparse_transition_penalty: Option<f64>,
    low_snr_penalty: Option<f64>,
    no_transition_penalty: Option<f64>,
    narrow_range_penalty: Option<f64>,
    few_points_penalty: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialAnomalyConfig {
    min_peak_separation: Option<f64>,
    late_region_fraction: Option<f64>,
    spike_median_multiple: Option<f64>,
    spike_max_fraction: Option<f64>,
    spike_floor: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSimulationConfig {
    transition_width: Option<f64>,
    ratio_floor: Option<f64>,
    reference_ph: Option<f64>,
    ph_coefficient: Option<f64>,
    concentration_coefficient: Option<f64>,
    concentration_floor: Option<f64>,
    num_points: Option<usize>,
    noise_fraction: Option<f64>,
    min_ratio: Option<f64>,
    seed: Option<u64>,
}

/// The TOML configuration file. Every table and key is optional; unset values keep
/// the library defaults.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    validation: Option<PartialValidationConfig>,
    smoothing: Option<PartialSmoothingConfig>,
    transitions: Option<PartialTransitionConfig>,
    quality: Option<PartialQualityConfig>,
    anomalies: Option<PartialAnomalyConfig>,
    simulation: Option<PartialSimulationConfig>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl PartialAppConfig {
    /// Reads the optional config file and applies `-S key=value` overrides on top.
    pub fn load(path: Option<&Path>, set_values: &[String]) -> Result<Self> {
        let mut table = match path {
            Some(path) => {
                debug!("Loading configuration from file: {:?}", path);
                let content = std::fs::read_to_string(path)?;
                toml::from_str::<toml::Table>(&content).map_err(|e| CliError::FileParsing {
                    path: path.to_path_buf(),
                    source: e.into(),
                })?
            }
            None => toml::Table::new(),
        };

        apply_set_values(&mut table, set_values)?;

        toml::Value::Table(table).try_into().map_err(|e: toml::de::Error| {
            CliError::Config(format!("Invalid configuration: {}", e.message()))
        })
    }

    pub fn into_analysis_config(self, args: &AnalyzeArgs) -> Result<core_config::AnalysisConfig> {
        let mut builder = core_config::AnalysisConfigBuilder::new()
            .validation(merge_validation(self.validation.unwrap_or_default()))
            .smoothing(merge_smoothing(self.smoothing.unwrap_or_default()))
            .transitions(merge_transitions(self.transitions.unwrap_or_default()))
            .quality(merge_quality(self.quality.unwrap_or_default()))
            .anomalies(merge_anomalies(self.anomalies.unwrap_or_default()));

        if let Some(n) = args.min_points {
            builder = builder.min_points(n);
        }
        if let Some(fraction) = args.window_fraction {
            builder = builder.window_fraction(fraction);
        }
        if let Some(confidence) = args.min_confidence {
            builder = builder.min_confidence(confidence);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// Analysis settings with only the file and `-S` values applied.
    pub fn analysis_config(&self) -> Result<core_config::AnalysisConfig> {
        core_config::AnalysisConfigBuilder::new()
            .validation(merge_validation(self.validation.clone().unwrap_or_default()))
            .smoothing(merge_smoothing(self.smoothing.clone().unwrap_or_default()))
            .transitions(merge_transitions(self.transitions.clone().unwrap_or_default()))
            .quality(merge_quality(self.quality.clone().unwrap_or_default()))
            .anomalies(merge_anomalies(self.anomalies.clone().unwrap_or_default()))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn simulation_config(&self, model: &ModelArgs) -> Result<core_config::SimulationConfig> {
        let p = self.simulation.clone().unwrap_or_default();
        let mut config = core_config::SimulationConfig::default();
        set(&mut config.transition_width, p.transition_width);
        set(&mut config.ratio_floor, p.ratio_floor);
        set(&mut config.reference_ph, p.reference_ph);
        set(&mut config.ph_coefficient, p.ph_coefficient);
        set(&mut config.concentration_coefficient, p.concentration_coefficient);
        set(&mut config.concentration_floor, p.concentration_floor);
        set(&mut config.num_points, model.num_points.or(p.num_points));
        set(&mut config.noise_fraction, model.noise_fraction.or(p.noise_fraction));
        set(&mut config.min_ratio, p.min_ratio);
        config.seed = model.seed.or(p.seed);

        config
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config)
    }
}

fn merge_validation(p: PartialValidationConfig) -> core_config::ValidationConfig {
    let mut c = core_config::ValidationConfig::default();
    set(&mut c.min_points, p.min_points);
    set(&mut c.max_non_finite_fraction, p.max_non_finite_fraction);
    c
}

fn merge_smoothing(p: PartialSmoothingConfig) -> core_config::SmoothingConfig {
    let mut c = core_config::SmoothingConfig::default();
    set(&mut c.window_fraction, p.window_fraction);
    set(&mut c.min_window, p.min_window);
    set(&mut c.polynomial_order, p.polynomial_order);
    c
}

fn merge_transitions(p: PartialTransitionConfig) -> core_config::TransitionConfig {
    let mut c = core_config::TransitionConfig::default();
    set(&mut c.noise_window_fraction, p.noise_window_fraction);
    set(&mut c.min_noise_window, p.min_noise_window);
    set(&mut c.noise_floor, p.noise_floor);
    set(&mut c.threshold_sigma, p.threshold_sigma);
    set(&mut c.min_relative_height, p.min_relative_height);
    set(&mut c.merge_valley_fraction, p.merge_valley_fraction);
    set(&mut c.boundary_fraction, p.boundary_fraction);
    set(&mut c.min_span_points, p.min_span_points);
    set(&mut c.sharpness_scale, p.sharpness_scale);
    set(&mut c.min_confidence, p.min_confidence);
    c
}

fn merge_quality(p: PartialQualityConfig) -> core_config::QualityConfig {
    let mut c = core_config::QualityConfig::default();
    set(&mut c.baseline_margin_fraction, p.baseline_margin_fraction);
    set(&mut c.min_baseline_points, p.min_baseline_points);
    set(&mut c.noise_floor, p.noise_floor);
    set(&mut c.reference_snr, p.reference_snr);
    set(&mut c.reference_points, p.reference_points);
    set(&mut c.fit_tolerance_fraction, p.fit_tolerance_fraction);
    set(&mut c.snr_weight, p.snr_weight);
    set(&mut c.points_weight, p.points_weight);
    set(&mut c.fit_weight, p.fit_weight);
    set(&mut c.max_baseline_noise, p.max_baseline_noise);
    set(&mut c.min_transition_points, p.min_transition_points);
    set(&mut c.min_snr, p.min_snr);
    set(&mut c.min_temperature_range, p.min_temperature_range);
    set(&mut c.recommended_points, p.recommended_points);
    set(&mut c.noise_penalty, p.noise_penalty);
    set(&mut c.sparse_transition_penalty, p.sparse_transition_penalty);
    set(&mut c.low_snr_penalty, p.low_snr_penalty);
    set(&mut c.no_transition_penalty, p.no_transition_penalty);
    set(&mut c.narrow_range_penalty, p.narrow_range_penalty);
    set(&mut c.few_points_penalty, p.few_points_penalty);
    c
}

fn merge_anomalies(p: PartialAnomalyConfig) -> core_config::AnomalyConfig {
    let mut c = core_config::AnomalyConfig::default();
    set(&mut c.min_peak_separation, p.min_peak_separation);
    set(&mut c.late_region_fraction, p.late_region_fraction);
    set(&mut c.spike_median_multiple, p.spike_median_multiple);
    set(&mut c.spike_max_fraction, p.spike_max_fraction);
    set(&mut c.spike_floor, p.spike_floor);
    c
}

/// Writes each `section.key=value` into the raw table. Unknown keys are rejected
/// when the table is deserialized.
fn apply_set_values(table: &mut toml::Table, set_values: &[String]) -> Result<()> {
    for kv_pair in set_values {
        let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
            CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            ))
        })?;
        let (section, field) = key.trim().split_once('.').ok_or_else(|| {
            CliError::Config(format!(
                "Invalid --set key '{}'. Expected SECTION.KEY (e.g. quality.min-snr).",
                key
            ))
        })?;

        let entry = table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        let toml::Value::Table(section_table) = entry else {
            return Err(CliError::Config(format!(
                "Configuration key '{}' is not a table.",
                section
            )));
        };
        section_table.insert(field.to_string(), parse_scalar(value_str.trim()));
    }
    Ok(())
}

fn parse_scalar(raw: &str) -> toml::Value {
    if let Ok(i) = raw.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        toml::Value::Float(f)
    } else if let Ok(b) = raw.parse::<bool>() {
        toml::Value::Boolean(b)
    } else {
        toml::Value::String(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use once_cell::sync::Lazy;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn analyze_args(extra: &[&str]) -> AnalyzeArgs {
        let mut args = vec!["nanodsf", "analyze", "-i", "curve.csv"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Analyze(args) => args,
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_and_no_overrides_gives_library_defaults() {
        let partial = PartialAppConfig::load(None, &[]).unwrap();
        let config = partial.into_analysis_config(&analyze_args(&[])).unwrap();
        assert_eq!(config, core_config::AnalysisConfig::default());
    }

    #[test]
    fn file_values_merge_with_defaults() {
        let path = write_config_file(
            "file_values.toml",
            r#"
            [smoothing]
            window-fraction = 0.09

            [quality]
            min-snr = 25.0
            recommended-points = 80
            "#,
        );
        let partial = PartialAppConfig::load(Some(&path), &[]).unwrap();
        let config = partial.into_analysis_config(&analyze_args(&[])).unwrap();

        assert_eq!(config.smoothing.window_fraction, 0.09);
        assert_eq!(config.quality.min_snr, 25.0);
        assert_eq!(config.quality.recommended_points, 80);
        assert_eq!(config.quality.snr_weight, 50.0);
        assert_eq!(config.transitions, core_config::TransitionConfig::default());
    }

    #[test]
    fn cli_flags_override_set_values_which_override_the_file() {
        let path = write_config_file(
            "precedence.toml",
            r#"
            [transitions]
            min-confidence = 0.4
            threshold-sigma = 5
            "#,
        );
        let set_values = vec![
            "transitions.min-confidence=0.5".to_string(),
            "anomalies.min-peak-separation=12".to_string(),
        ];
        let args = analyze_args(&["--min-confidence", "0.6"]);
        let partial = PartialAppConfig::load(Some(&path), &set_values).unwrap();
        let config = partial.into_analysis_config(&args).unwrap();

        assert_eq!(config.transitions.min_confidence, 0.6);
        assert_eq!(config.transitions.threshold_sigma, 5.0);
        assert_eq!(config.anomalies.min_peak_separation, 12.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let path = write_config_file("unknown.toml", "[smoothing]\nwindow-size = 9\n");
        let result = PartialAppConfig::load(Some(&path), &[]);
        assert!(matches!(result, Err(CliError::Config(_))));

        let result = PartialAppConfig::load(None, &["quality.bogus=1".to_string()]);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["quality.min-snr", "min-snr=3"] {
            let result = PartialAppConfig::load(None, &[bad.to_string()]);
            assert!(matches!(result, Err(CliError::Config(_))), "{bad}");
        }
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let partial =
            PartialAppConfig::load(None, &["quality.snr-weight=80".to_string()]).unwrap();
        let result = partial.into_analysis_config(&analyze_args(&[]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn simulation_section_and_model_flags_merge() {
        let path = write_config_file(
            "simulation.toml",
            r#"
            [simulation]
            transition-width = 3.0
            num-points = 150
            seed = 11
            "#,
        );
        let partial = PartialAppConfig::load(Some(&path), &[]).unwrap();
        let model = ModelArgs {
            seed: None,
            num_points: Some(300),
            noise_fraction: Some(0.0),
        };
        let config = partial.simulation_config(&model).unwrap();

        assert_eq!(config.transition_width, 3.0);
        assert_eq!(config.num_points, 300);
        assert_eq!(config.noise_fraction, 0.0);
        assert_eq!(config.seed, Some(11));
    }

    #[test]
    fn invalid_toml_reports_the_file() {
        let path = write_config_file("broken.toml", "[quality\nmin-snr = ");
        let result = PartialAppConfig::load(Some(&path), &[]);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
