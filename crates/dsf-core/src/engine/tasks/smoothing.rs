use crate::core::models::curve::{DerivativeCurve, RawCurve, SmoothedCurve};
use crate::core::signal::derivative::finite_difference;
use crate::core::signal::smoothing::{savitzky_golay, window_for};
use crate::engine::config::SmoothingConfig;
use tracing::{debug, instrument};

pub struct Smoother<'a> {
    config: &'a SmoothingConfig,
}

impl<'a> Smoother<'a> {
    pub fn new(config: &'a SmoothingConfig) -> Self {
        Self { config }
    }

    pub fn window_for(&self, len: usize) -> usize {
        window_for(len, self.config.window_fraction, self.config.min_window)
    }

    #[instrument(skip_all, name = "smoothing_task", fields(points = raw.len()))]
    pub fn smooth(&self, raw: &RawCurve) -> SmoothedCurve {
        let window = self.window_for(raw.len());
        debug!(window, order = self.config.polynomial_order, "Smoothing ratio curve.");
        let ratios = savitzky_golay(
            raw.temperatures(),
            raw.ratios(),
            window,
            self.config.polynomial_order,
        );
        SmoothedCurve::new(raw.shared_axis(), ratios, window)
    }

    /// Applies the same filter again to an already smoothed curve.
    pub fn resmooth(&self, curve: &SmoothedCurve) -> SmoothedCurve {
        let ratios = savitzky_golay(
            curve.temperatures(),
            curve.ratios(),
            curve.window(),
            self.config.polynomial_order,
        );
        SmoothedCurve::new(curve.shared_axis(), ratios, curve.window())
    }
}

/// First derivative of the smoothed curve on its own temperature axis.
pub fn differentiate(smoothed: &SmoothedCurve) -> DerivativeCurve {
    let values = finite_difference(smoothed.temperatures(), smoothed.ratios());
    DerivativeCurve::new(smoothed.shared_axis(), values, smoothed.window() / 2)
}
