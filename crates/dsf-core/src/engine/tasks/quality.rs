use crate::core::models::curve::{RawCurve, SmoothedCurve};
use crate::core::models::report::{QualityLabel, QualityReport};
use crate::core::models::transition::TransitionSet;
use crate::core::signal::stats::{linear_residuals, rms_difference, std_dev};
use crate::engine::config::QualityConfig;
use itertools::{Itertools, MinMaxResult};
use tracing::{debug, info, instrument, warn};

/// Shortest contiguous baseline stretch worth detrending on its own.
const MIN_REGION_POINTS: usize = 3;

pub struct QualityAssessor<'a> {
    config: &'a QualityConfig,
}

impl<'a> QualityAssessor<'a> {
    pub fn new(config: &'a QualityConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, name = "quality_assessment_task", fields(points = raw.len()))]
    pub fn assess(
        &self,
        raw: &RawCurve,
        smoothed: &SmoothedCurve,
        transitions: &TransitionSet,
    ) -> QualityReport {
        let cfg = self.config;
        let n = raw.len();

        let baseline_noise = self.baseline_noise(raw, transitions);
        let amplitude = self.amplitude(smoothed, transitions);
        let snr_estimate = amplitude / self.clamped_noise(baseline_noise);

        let snr_term = if snr_estimate > 1.0 {
            (snr_estimate.log10() / cfg.reference_snr.log10()).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let points_term = (n as f64 / cfg.reference_points as f64).clamp(0.0, 1.0);
        let fit_term = match rms_difference(raw.ratios(), smoothed.ratios()) {
            Some(rms) if amplitude > cfg.noise_floor => {
                (1.0 - rms / (amplitude * cfg.fit_tolerance_fraction)).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };

        let mut issues = Vec::new();
        let mut penalty = 0.0;

        if baseline_noise > cfg.max_baseline_noise {
            issues.push(format!(
                "baseline noise {:.4} exceeds {:.4}",
                baseline_noise, cfg.max_baseline_noise
            ));
            penalty += cfg.noise_penalty * ramp(baseline_noise / cfg.max_baseline_noise);
        }
        match transitions.dominant() {
            Some(dominant) => {
                let (onset, _, offset) = dominant.indices();
                let region_points = offset - onset + 1;
                if region_points < cfg.min_transition_points {
                    issues.push(format!(
                        "fewer than {} points in transition region ({})",
                        cfg.min_transition_points, region_points
                    ));
                    penalty += cfg.sparse_transition_penalty
                        * ramp(cfg.min_transition_points as f64 / region_points as f64);
                }
            }
            None => {
                issues.push("no unfolding transition detected".to_string());
                penalty += cfg.no_transition_penalty;
            }
        }
        if snr_estimate < cfg.min_snr {
            issues.push(format!(
                "SNR {:.1} below threshold for reliable Tm ({:.1})",
                snr_estimate, cfg.min_snr
            ));
            penalty += cfg.low_snr_penalty * ramp(cfg.min_snr / snr_estimate);
        }
        let span = raw.temperature_span();
        if span < cfg.min_temperature_range {
            issues.push(format!(
                "temperature range {:.1} °C narrower than {:.1} °C",
                span, cfg.min_temperature_range
            ));
            penalty += cfg.narrow_range_penalty;
        }
        if n < cfg.recommended_points {
            issues.push(format!(
                "only {} data points; at least {} recommended",
                n, cfg.recommended_points
            ));
            penalty += cfg.few_points_penalty;
        }

        let weighted =
            cfg.snr_weight * snr_term + cfg.points_weight * points_term + cfg.fit_weight * fit_term;
        let score = (weighted - penalty).clamp(0.0, 100.0);
        debug!(snr_term, points_term, fit_term, penalty, "Quality terms.");

        let label = QualityLabel::from_score(score);
        info!(score, %label, snr = snr_estimate, issues = issues.len(), "Quality assessed.");

        QualityReport {
            label,
            score,
            snr_estimate,
            baseline_noise,
            issues,
        }
    }

    /// Standard deviation of the detrended raw ratio outside every transition span.
    pub fn baseline_noise(&self, raw: &RawCurve, transitions: &TransitionSet) -> f64 {
        if transitions.is_empty() {
            return whole_curve_noise(raw);
        }

        for margin in [self.config.baseline_margin_fraction, 0.0] {
            let residuals = self.pooled_residuals(raw, transitions, margin);
            if residuals.len() >= self.config.min_baseline_points {
                return std_dev(&residuals).unwrap_or(0.0);
            }
            debug!(
                margin,
                points = residuals.len(),
                "Too few baseline points outside transitions."
            );
        }
        whole_curve_noise(raw)
    }

    fn pooled_residuals(&self, raw: &RawCurve, transitions: &TransitionSet, margin: f64) -> Vec<f64> {
        let temps = raw.temperatures();
        let ratios = raw.ratios();
        let excluded = |t: f64| {
            transitions.iter().any(|tr| {
                let pad = margin * tr.width();
                t >= tr.onset_temp - pad && t <= tr.offset_temp + pad
            })
        };

        let mut pooled = Vec::new();
        let mut start = None;
        for i in 0..=temps.len() {
            let inside = i < temps.len() && !excluded(temps[i]);
            match (inside, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= MIN_REGION_POINTS {
                        pooled.extend(linear_residuals(&temps[s..i], &ratios[s..i]));
                    }
                    start = None;
                }
                _ => {}
            }
        }
        pooled
    }

    fn amplitude(&self, smoothed: &SmoothedCurve, transitions: &TransitionSet) -> f64 {
        let ratios = smoothed.ratios();
        let region = match transitions.dominant() {
            Some(dominant) => {
                let (onset, _, offset) = dominant.indices();
                &ratios[onset..=offset.min(ratios.len().saturating_sub(1))]
            }
            None => ratios,
        };
        match region.iter().minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::MinMax(lo, hi) => hi - lo,
            _ => 0.0,
        }
    }

    fn clamped_noise(&self, noise: f64) -> f64 {
        if noise < self.config.noise_floor {
            if noise > 0.0 {
                debug!(noise, floor = self.config.noise_floor, "Clamping baseline noise to floor.");
            } else {
                warn!(floor = self.config.noise_floor, "Baseline noise is zero; clamping to floor.");
            }
            self.config.noise_floor
        } else {
            noise
        }
    }
}

/// Share of a penalty owed once a metric is `ratio` times past its limit: nothing at
/// the limit, growing linearly to the full penalty at twice the limit. The score
/// stays continuous as a metric crosses its limit.
fn ramp(ratio: f64) -> f64 {
    (ratio - 1.0).clamp(0.0, 1.0)
}

fn whole_curve_noise(raw: &RawCurve) -> f64 {
    std_dev(&linear_residuals(raw.temperatures(), raw.ratios())).unwrap_or(0.0)
}
