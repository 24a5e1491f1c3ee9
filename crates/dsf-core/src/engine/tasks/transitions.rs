use crate::core::models::curve::DerivativeCurve;
use crate::core::models::transition::{Transition, TransitionSet};
use crate::core::signal::stats::{interpolate_crossing, mean, parabolic_vertex, std_dev};
use crate::engine::config::TransitionConfig;
use crate::engine::error::EngineError;
use tracing::{debug, info, instrument};

/// Noise statistics of the flattest stretch of the derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFloor {
    /// Standard deviation of that stretch, clamped to the configured floor.
    pub sigma: f64,
    /// Absolute mean of that stretch; drift shows up here rather than in `sigma`.
    pub baseline_level: f64,
    /// Half-open index range of the stretch.
    pub window: (usize, usize),
}

pub struct DerivativeAnalyzer<'a> {
    config: &'a TransitionConfig,
}

impl<'a> DerivativeAnalyzer<'a> {
    pub fn new(config: &'a TransitionConfig) -> Self {
        Self { config }
    }

    pub fn noise_floor(&self, values: &[f64]) -> NoiseFloor {
        let n = values.len();
        let width = ((n as f64 * self.config.noise_window_fraction).round() as usize)
            .max(self.config.min_noise_window)
            .min(n);
        if width == 0 {
            return NoiseFloor {
                sigma: self.config.noise_floor,
                baseline_level: 0.0,
                window: (0, 0),
            };
        }

        let mut best = (f64::INFINITY, 0.0, 0);
        for start in 0..=(n - width) {
            let slice = &values[start..start + width];
            let sd = std_dev(slice).unwrap_or(0.0);
            if sd < best.0 {
                best = (sd, mean(slice).unwrap_or(0.0), start);
            }
        }

        NoiseFloor {
            sigma: best.0.max(self.config.noise_floor),
            baseline_level: best.1.abs(),
            window: (best.2, best.2 + width),
        }
    }

    #[instrument(skip_all, name = "transition_detection_task", fields(points = derivative.len()))]
    pub fn detect(&self, derivative: &DerivativeCurve) -> TransitionSet {
        let temps = derivative.temperatures();
        let mags: Vec<f64> = derivative.values().iter().map(|v| v.abs()).collect();
        let n = mags.len();
        if n < 3 {
            return TransitionSet::default();
        }

        let floor = self.noise_floor(derivative.values());
        let threshold = floor.baseline_level + self.config.threshold_sigma * floor.sigma;
        let global_max = mags.iter().copied().fold(0.0, f64::max);
        debug!(
            sigma = floor.sigma,
            baseline_level = floor.baseline_level,
            threshold,
            global_max,
            "Estimated derivative noise floor."
        );
        if global_max <= threshold {
            info!(num_transitions = 0, "No derivative peak above the noise floor.");
            return TransitionSet::default();
        }

        let peaks = self.select_peaks(&mags, threshold, global_max, derivative.edge_points());

        let transitions: Vec<Transition> = peaks
            .iter()
            .enumerate()
            .filter_map(|(k, &peak)| {
                let lower = match k {
                    0 => 0,
                    _ => valley_index(&mags, peaks[k - 1], peak),
                };
                let upper = match peaks.get(k + 1) {
                    Some(&next) => valley_index(&mags, peak, next),
                    None => n - 1,
                };
                let transition =
                    self.measure(temps, derivative.values(), &mags, peak, (lower, upper), &floor);
                let (onset, _, offset) = transition.indices();
                if offset - onset < self.config.min_span_points {
                    debug!(
                        peak_temp = transition.peak_temp,
                        span = offset - onset,
                        "Discarding peak narrower than the minimum span."
                    );
                    return None;
                }
                if transition.confidence < self.config.min_confidence {
                    debug!(
                        peak_temp = transition.peak_temp,
                        confidence = transition.confidence,
                        "Discarding low-confidence transition."
                    );
                    None
                } else {
                    Some(transition)
                }
            })
            .collect();

        let set = TransitionSet::new(transitions);
        info!(
            num_transitions = set.len(),
            tm = set.dominant().map(|t| t.peak_temp),
            "Transition detection complete."
        );
        set
    }

    /// The transition defining "the" Tm; fails when none survives thresholding.
    pub fn require_dominant(&self, derivative: &DerivativeCurve) -> Result<Transition, EngineError> {
        self.detect(derivative)
            .dominant()
            .cloned()
            .ok_or(EngineError::NoTransitionFound)
    }

    /// Indices of accepted peaks in ascending order.
    ///
    /// A maximum within `edge_points` of either end sits on a partially smoothed
    /// stretch; it only counts when the excursion is still above the minimum height
    /// where full smoothing starts.
    fn select_peaks(
        &self,
        mags: &[f64],
        threshold: f64,
        global_max: f64,
        edge_points: usize,
    ) -> Vec<usize> {
        let n = mags.len();
        let min_height = threshold.max(self.config.min_relative_height * global_max);
        let guard = if 2 * edge_points < n { edge_points } else { 0 };
        let (first_full, last_full) = (guard, n - 1 - guard);
        let reaches_interior = |i: usize| {
            if i < first_full {
                mags[first_full] > min_height
            } else if i > last_full {
                mags[last_full] > min_height
            } else {
                true
            }
        };

        let mut candidates: Vec<usize> = (0..n)
            .filter(|&i| {
                let left_ok = i == 0 || mags[i] >= mags[i - 1];
                let right_ok = i == n - 1 || mags[i] > mags[i + 1];
                left_ok && right_ok && mags[i] > min_height
            })
            .filter(|&i| {
                let keep = reaches_interior(i);
                if !keep {
                    debug!(index = i, height = mags[i], "Ignoring edge-only derivative excursion.");
                }
                keep
            })
            .collect();
        candidates.sort_by(|&a, &b| mags[b].total_cmp(&mags[a]).then(a.cmp(&b)));

        let mut accepted: Vec<usize> = Vec::new();
        for candidate in candidates {
            let merged = accepted.iter().any(|&peak| {
                let (lo, hi) = (candidate.min(peak), candidate.max(peak));
                let valley = mags[lo..=hi].iter().copied().fold(f64::INFINITY, f64::min);
                valley > self.config.merge_valley_fraction * mags[candidate]
            });
            if !merged {
                accepted.push(candidate);
            }
        }
        accepted.sort_unstable();
        accepted
    }

    /// Measures one accepted peak; `bounds` are the valleys to its accepted neighbours
    /// (or the curve ends).
    fn measure(
        &self,
        temps: &[f64],
        values: &[f64],
        mags: &[f64],
        peak: usize,
        bounds: (usize, usize),
        floor: &NoiseFloor,
    ) -> Transition {
        let (lower, upper) = bounds;
        let n = mags.len();
        let height = mags[peak];
        let level = self.config.boundary_fraction * height;

        let peak_temp = if peak > 0 && peak + 1 < n {
            parabolic_vertex(
                [temps[peak - 1], temps[peak], temps[peak + 1]],
                [mags[peak - 1], mags[peak], mags[peak + 1]],
            )
        } else {
            temps[peak]
        };

        let (onset_temp, onset_index, onset_resolved) = {
            let mut j = peak;
            loop {
                if j == lower {
                    break (temps[j], j, lower != 0 || mags[j] < level);
                }
                if mags[j - 1] < level {
                    let t = interpolate_crossing(temps[j - 1], mags[j - 1], temps[j], mags[j], level);
                    break (t, j - 1, true);
                }
                j -= 1;
            }
        };

        let (offset_temp, offset_index, offset_resolved) = {
            let mut j = peak;
            loop {
                if j == upper {
                    break (temps[j], j, upper != n - 1 || mags[j] < level);
                }
                if mags[j + 1] < level {
                    let t = interpolate_crossing(temps[j], mags[j], temps[j + 1], mags[j + 1], level);
                    break (t, j + 1, true);
                }
                j += 1;
            }
        };

        let excess = (height - floor.baseline_level) / floor.sigma - self.config.threshold_sigma;
        let sharpness = 1.0 - (-excess.max(0.0) / self.config.sharpness_scale).exp();
        let return_to_baseline = if offset_resolved {
            let span = (offset_index - peak).max(1);
            let start = offset_index + 1;
            let end = (offset_index + span).min(n - 1);
            if start <= end {
                let tail = mean(&mags[start..=end]).unwrap_or(0.0);
                (1.0 - tail / level).clamp(0.0, 1.0)
            } else {
                0.5
            }
        } else {
            0.5
        };
        let confidence = (sharpness * (0.5 + 0.5 * return_to_baseline)).clamp(0.0, 1.0);

        Transition {
            onset_temp,
            peak_temp,
            offset_temp,
            peak_slope: values[peak],
            confidence,
            height,
            onset_resolved,
            offset_resolved,
            onset_index,
            peak_index: peak,
            offset_index,
        }
    }
}

/// Index of the smallest magnitude between two peaks.
fn valley_index(mags: &[f64], left: usize, right: usize) -> usize {
    (left..=right)
        .min_by(|&a, &b| mags[a].total_cmp(&mags[b]))
        .unwrap_or(left)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::curve::RawCurve;
    use crate::core::models::transition::TransitionType;
    use crate::engine::config::SmoothingConfig;
    use crate::engine::tasks::smoothing::{Smoother, differentiate};

    pub(crate) fn logistic(t: f64, tm: f64, width: f64) -> f64 {
        1.0 / (1.0 + (-(t - tm) / width).exp())
    }

    pub(crate) fn axis(n: usize, start: f64, end: f64) -> Vec<f64> {
        (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect()
    }

    pub(crate) fn sigmoid_curve(tm: f64, width: f64, start: f64, end: f64) -> RawCurve {
        let t = axis(200, start, end);
        let r = t.iter().map(|v| 0.8 + 0.3 * logistic(*v, tm, width)).collect();
        RawCurve::new_unchecked(t, r)
    }

    fn derivative_of(raw: &RawCurve) -> DerivativeCurve {
        let smoothed = Smoother::new(&SmoothingConfig::default()).smooth(raw);
        differentiate(&smoothed)
    }

    fn detect(raw: &RawCurve) -> TransitionSet {
        DerivativeAnalyzer::new(&TransitionConfig::default()).detect(&derivative_of(raw))
    }

    #[test]
    fn noiseless_sigmoid_yields_single_transition_near_tm() {
        let set = detect(&sigmoid_curve(62.3, 2.0, 20.0, 95.0));
        assert_eq!(set.len(), 1);
        assert_eq!(set.transition_type(), TransitionType::Monophasic);
        let t = &set.as_slice()[0];
        assert!((t.peak_temp - 62.3).abs() < 0.5, "peak at {}", t.peak_temp);
        assert!(t.confidence >= TransitionConfig::default().min_confidence);
        assert!(t.onset_temp < t.peak_temp && t.peak_temp < t.offset_temp);
        assert!(t.onset_resolved && t.offset_resolved);
        assert!(t.peak_slope > 0.0);
    }

    #[test]
    fn decreasing_sigmoid_is_detected_with_negative_slope() {
        let t = axis(200, 20.0, 95.0);
        let r = t.iter().map(|v| 1.1 - 0.3 * logistic(*v, 55.0, 2.0)).collect();
        let set = detect(&RawCurve::new_unchecked(t, r));
        assert_eq!(set.len(), 1);
        assert!(set.as_slice()[0].peak_slope < 0.0);
        assert!((set.as_slice()[0].peak_temp - 55.0).abs() < 0.5);
    }

    #[test]
    fn flat_curve_has_no_transition() {
        let t = axis(150, 20.0, 95.0);
        let set = detect(&RawCurve::new_unchecked(t, vec![0.85; 150]));
        assert_eq!(set.len(), 0);
        assert_eq!(set.transition_type(), TransitionType::NoTransition);
    }

    #[test]
    fn two_separated_transitions_are_both_reported() {
        let t = axis(200, 20.0, 95.0);
        let r = t
            .iter()
            .map(|v| 0.8 + 0.15 * logistic(*v, 45.0, 1.5) + 0.2 * logistic(*v, 72.0, 1.5))
            .collect();
        let set = detect(&RawCurve::new_unchecked(t, r));
        assert_eq!(set.len(), 2);
        assert_eq!(set.transition_type(), TransitionType::Multiphasic);
        let peaks: Vec<f64> = set.iter().map(|t| t.peak_temp).collect();
        assert!((peaks[0] - 45.0).abs() < 0.5);
        assert!((peaks[1] - 72.0).abs() < 0.5);
        assert!(set.as_slice()[1].height > set.as_slice()[0].height);
    }

    #[test]
    fn transition_running_off_the_hot_end_is_unresolved() {
        let set = detect(&sigmoid_curve(90.0, 3.0, 20.0, 92.0));
        assert_eq!(set.len(), 1);
        let t = &set.as_slice()[0];
        assert!(t.onset_resolved);
        assert!(!t.offset_resolved);
        assert_eq!(t.offset_temp, 92.0);
    }

    #[test]
    fn step_in_the_last_samples_is_not_a_transition() {
        let clean = sigmoid_curve(55.0, 2.0, 20.0, 95.0);
        let t = clean.temperatures().to_vec();
        let mut r = clean.ratios().to_vec();
        for v in r.iter_mut().rev().take(3) {
            *v += 0.015;
        }

        let set = detect(&RawCurve::new_unchecked(t, r));
        assert_eq!(set.len(), 1, "{:?}", set.as_slice());
        assert!((set.as_slice()[0].peak_temp - 55.0).abs() < 0.5);
    }

    #[test]
    fn transition_beyond_the_hot_end_still_counts() {
        let set = detect(&sigmoid_curve(96.0, 2.0, 20.0, 92.0));
        assert_eq!(set.len(), 1);
        let t = &set.as_slice()[0];
        assert!(!t.offset_resolved);
        assert_eq!(t.peak_temp, 92.0);
    }

    #[test]
    fn require_dominant_fails_without_transition() {
        let t = axis(100, 20.0, 95.0);
        let derivative = derivative_of(&RawCurve::new_unchecked(t, vec![1.0; 100]));
        let config = TransitionConfig::default();
        let analyzer = DerivativeAnalyzer::new(&config);
        assert_eq!(
            analyzer.require_dominant(&derivative),
            Err(EngineError::NoTransitionFound)
        );
    }

    #[test]
    fn noise_floor_comes_from_the_flattest_window() {
        let mut values = vec![0.0; 100];
        for (i, v) in values.iter_mut().enumerate().take(60) {
            *v = if i % 2 == 0 { 0.01 } else { -0.01 };
        }
        let floor = DerivativeAnalyzer::new(&TransitionConfig::default()).noise_floor(&values);
        assert!(floor.window.0 >= 60);
        assert_eq!(floor.sigma, 1e-6);
        assert_eq!(floor.baseline_level, 0.0);
    }

    #[test]
    fn raising_min_confidence_discards_transitions() {
        let derivative = derivative_of(&sigmoid_curve(90.0, 3.0, 20.0, 92.0));
        let config = TransitionConfig {
            min_confidence: 0.9,
            ..TransitionConfig::default()
        };
        assert!(DerivativeAnalyzer::new(&config).detect(&derivative).is_empty());
    }
}
