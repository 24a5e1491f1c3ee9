//! The stable, serialized shape of an analysis run.

use super::curve::{DerivativeCurve, RawCurve, SmoothedCurve};
use super::report::{AnomalyReport, QualityReport};
use super::transition::{Transition, TransitionSet, TransitionType};
use serde::{Deserialize, Serialize};

/// Number of points averaged for `baseline_start` / `baseline_end`.
pub const BASELINE_POINTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveMetrics {
    pub tm: Option<f64>,
    pub tm_confidence: f64,
    pub max_slope: f64,
    pub onset_temperature: Option<f64>,
    pub offset_temperature: Option<f64>,
    pub transition_type: TransitionType,
    pub num_transitions: usize,
    pub baseline_start: f64,
    pub baseline_end: f64,
    pub transitions: Vec<Transition>,
}

impl CurveMetrics {
    pub fn from_analysis(
        smoothed: &SmoothedCurve,
        derivative: &DerivativeCurve,
        transitions: &TransitionSet,
    ) -> Self {
        let dominant = transitions.dominant();
        Self {
            tm: dominant.map(|t| t.peak_temp),
            tm_confidence: dominant.map_or(0.0, |t| t.confidence),
            max_slope: derivative.max_slope(),
            onset_temperature: dominant.map(|t| t.onset_temp),
            offset_temperature: dominant.map(|t| t.offset_temp),
            transition_type: transitions.transition_type(),
            num_transitions: transitions.len(),
            baseline_start: smoothed.baseline_start(BASELINE_POINTS),
            baseline_end: smoothed.baseline_end(BASELINE_POINTS),
            transitions: transitions.as_slice().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    pub raw_temperature: Vec<f64>,
    pub raw_ratio: Vec<f64>,
    pub smoothed_ratio: Vec<f64>,
    pub derivative_values: Vec<f64>,
}

impl PlotData {
    pub fn new(raw: &RawCurve, smoothed: &SmoothedCurve, derivative: &DerivativeCurve) -> Self {
        Self {
            raw_temperature: raw.temperatures().to_vec(),
            raw_ratio: raw.ratios().to_vec(),
            smoothed_ratio: smoothed.ratios().to_vec(),
            derivative_values: derivative.values().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub metrics: CurveMetrics,
    pub quality: QualityReport,
    pub anomalies: AnomalyReport,
    pub plot_data: PlotData,
}
