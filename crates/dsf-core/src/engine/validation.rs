use crate::core::models::curve::{Measurement, RawCurve};
use crate::engine::config::ValidationConfig;
use crate::engine::error::EngineError;
use tracing::{debug, instrument, warn};

/// Turns measurement rows (or pre-computed ratios) into a [`RawCurve`].
///
/// Rows with a non-finite value are dropped as long as they stay within the configured
/// tolerance; everything else that is structurally wrong is a `MalformedCurve`.
pub struct CurveValidator<'a> {
    config: &'a ValidationConfig,
}

impl<'a> CurveValidator<'a> {
    pub fn new(config: &'a ValidationConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, name = "curve_validation", fields(rows = measurements.len()))]
    pub fn validate(&self, measurements: &[Measurement]) -> Result<RawCurve, EngineError> {
        if let Some((index, m)) = measurements
            .iter()
            .enumerate()
            .find(|(_, m)| m.f330.is_finite() && m.f330 <= 0.0)
        {
            return Err(EngineError::malformed(format!(
                "F330 must be positive, found {} at row {} (T = {})",
                m.f330, index, m.temperature
            )));
        }

        let finite: Vec<&Measurement> = measurements.iter().filter(|m| m.is_finite()).collect();
        self.check_non_finite(measurements.len(), measurements.len() - finite.len())?;

        let (temperatures, ratios): (Vec<f64>, Vec<f64>) =
            finite.iter().map(|m| (m.temperature, m.ratio())).unzip();
        self.finish(temperatures, ratios)
    }

    /// Validates a curve whose ratio has already been formed by the caller.
    #[instrument(skip_all, name = "curve_validation", fields(rows = temperatures.len()))]
    pub fn validate_ratios(
        &self,
        temperatures: &[f64],
        ratios: &[f64],
    ) -> Result<RawCurve, EngineError> {
        if temperatures.len() != ratios.len() {
            return Err(EngineError::malformed(format!(
                "temperature and ratio columns differ in length ({} vs {})",
                temperatures.len(),
                ratios.len()
            )));
        }

        let (kept_t, kept_r): (Vec<f64>, Vec<f64>) = temperatures
            .iter()
            .zip(ratios)
            .filter(|(t, r)| t.is_finite() && r.is_finite())
            .map(|(t, r)| (*t, *r))
            .unzip();
        self.check_non_finite(temperatures.len(), temperatures.len() - kept_t.len())?;
        self.finish(kept_t, kept_r)
    }

    fn check_non_finite(&self, total: usize, dropped: usize) -> Result<(), EngineError> {
        if dropped == 0 {
            return Ok(());
        }
        let fraction = dropped as f64 / total as f64;
        if fraction > self.config.max_non_finite_fraction {
            return Err(EngineError::malformed(format!(
                "{dropped} of {total} rows are non-finite ({:.1}% > {:.1}% allowed)",
                fraction * 100.0,
                self.config.max_non_finite_fraction * 100.0
            )));
        }
        warn!(dropped, total, "Dropping non-finite rows.");
        Ok(())
    }

    fn finish(&self, temperatures: Vec<f64>, ratios: Vec<f64>) -> Result<RawCurve, EngineError> {
        if temperatures.len() < self.config.min_points {
            return Err(EngineError::malformed(format!(
                "curve has {} valid points; at least {} are required",
                temperatures.len(),
                self.config.min_points
            )));
        }

        if let Some(i) = temperatures.windows(2).position(|w| w[1] <= w[0]) {
            let kind = if temperatures[i + 1] == temperatures[i] {
                "duplicate"
            } else {
                "non-increasing"
            };
            return Err(EngineError::malformed(format!(
                "{kind} temperature at row {}: {} follows {}",
                i + 1,
                temperatures[i + 1],
                temperatures[i]
            )));
        }

        if let Some(i) = ratios.iter().position(|r| !r.is_finite()) {
            return Err(EngineError::malformed(format!(
                "ratio at row {i} is not finite"
            )));
        }

        debug!(points = temperatures.len(), "Curve validated.");
        Ok(RawCurve::new_unchecked(temperatures, ratios))
    }
}
