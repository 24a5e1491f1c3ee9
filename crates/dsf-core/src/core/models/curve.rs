use crate::core::signal::stats::mean;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single row of a nanoDSF measurement table, before the ratio is formed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub temperature: f64,
    pub f330: f64,
    pub f350: f64,
}

impl Measurement {
    pub fn new(temperature: f64, f330: f64, f350: f64) -> Self {
        Self {
            temperature,
            f330,
            f350,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.temperature.is_finite() && self.f330.is_finite() && self.f350.is_finite()
    }

    /// The F350/F330 fluorescence ratio.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.f350 / self.f330
    }
}

/// A validated ratio curve: strictly increasing temperatures, finite ratios.
///
/// Instances are only produced by [`CurveValidator`](crate::engine::validation::CurveValidator)
/// and cannot be modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCurve {
    temperatures: Arc<[f64]>,
    ratios: Vec<f64>,
}

impl RawCurve {
    pub(crate) fn new_unchecked(temperatures: Vec<f64>, ratios: Vec<f64>) -> Self {
        debug_assert_eq!(temperatures.len(), ratios.len());
        Self {
            temperatures: temperatures.into(),
            ratios,
        }
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    pub(crate) fn shared_axis(&self) -> Arc<[f64]> {
        Arc::clone(&self.temperatures)
    }

    /// Width of the sampled temperature range in °C.
    pub fn temperature_span(&self) -> f64 {
        match (self.temperatures.first(), self.temperatures.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Denoised ratio curve sharing the temperature axis of the raw curve it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedCurve {
    temperatures: Arc<[f64]>,
    ratios: Vec<f64>,
    window: usize,
}

impl SmoothedCurve {
    pub(crate) fn new(temperatures: Arc<[f64]>, ratios: Vec<f64>, window: usize) -> Self {
        debug_assert_eq!(temperatures.len(), ratios.len());
        Self {
            temperatures,
            ratios,
            window,
        }
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    /// The full (interior) smoothing window in points.
    pub fn window(&self) -> usize {
        self.window
    }

    pub(crate) fn shared_axis(&self) -> Arc<[f64]> {
        Arc::clone(&self.temperatures)
    }

    /// Mean smoothed ratio over the first `count` points.
    pub fn baseline_start(&self, count: usize) -> f64 {
        let count = count.clamp(1, self.ratios.len().max(1));
        mean(&self.ratios[..count.min(self.ratios.len())]).unwrap_or(0.0)
    }

    /// Mean smoothed ratio over the last `count` points.
    pub fn baseline_end(&self, count: usize) -> f64 {
        let len = self.ratios.len();
        let count = count.clamp(1, len.max(1)).min(len);
        mean(&self.ratios[len - count..]).unwrap_or(0.0)
    }
}

/// First derivative d(ratio)/dT, one value per temperature of the source curve.
///
/// Interior points use centered differences; the first and last points use forward
/// and backward differences, so the length always equals the source length.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeCurve {
    temperatures: Arc<[f64]>,
    values: Vec<f64>,
    edge_points: usize,
}

impl DerivativeCurve {
    pub(crate) fn new(temperatures: Arc<[f64]>, values: Vec<f64>, edge_points: usize) -> Self {
        debug_assert_eq!(temperatures.len(), values.len());
        Self {
            temperatures,
            values,
            edge_points,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Samples at each end whose smoothing window was cut short by the curve edge.
    pub fn edge_points(&self) -> usize {
        self.edge_points
    }

    /// Signed derivative value with the largest magnitude, or 0 for an empty curve.
    pub fn max_slope(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0)
    }
}
