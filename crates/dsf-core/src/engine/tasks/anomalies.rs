use crate::core::models::curve::{DerivativeCurve, SmoothedCurve};
use crate::core::models::report::{Anomaly, AnomalyKind, AnomalyReport, Severity};
use crate::core::models::transition::{Transition, TransitionSet};
use crate::core::signal::stats::median;
use crate::engine::config::AnomalyConfig;
use itertools::Itertools;
use std::cmp::Ordering;
use tracing::{debug, info, instrument};

pub struct AnomalyDetector<'a> {
    config: &'a AnomalyConfig,
}

impl<'a> AnomalyDetector<'a> {
    pub fn new(config: &'a AnomalyConfig) -> Self {
        Self { config }
    }

    /// Runs every rule and folds the findings into a single report.
    #[instrument(skip_all, name = "anomaly_detection_task")]
    pub fn detect(
        &self,
        smoothed: &SmoothedCurve,
        derivative: &DerivativeCurve,
        transitions: &TransitionSet,
    ) -> AnomalyReport {
        let findings = self.findings(smoothed, derivative, transitions);
        debug!(candidates = findings.len(), "Anomaly rules evaluated.");

        match findings.into_iter().min_by(rank) {
            Some(anomaly) => {
                info!(kind = %anomaly.kind, severity = ?anomaly.severity, "Anomaly detected.");
                anomaly.into()
            }
            None => AnomalyReport::none(),
        }
    }

    /// All anomalies the rules found, before the single dominant one is chosen.
    pub fn findings(
        &self,
        smoothed: &SmoothedCurve,
        derivative: &DerivativeCurve,
        transitions: &TransitionSet,
    ) -> Vec<Anomaly> {
        [
            self.multi_transition(transitions),
            self.aggregation_spike(smoothed, derivative, transitions),
            self.truncated_transition(transitions),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn multi_transition(&self, transitions: &TransitionSet) -> Option<Anomaly> {
        let dominant = transitions.dominant()?;
        let (first, second) = transitions
            .iter()
            .tuple_windows()
            .min_by(|a, b| spacing(a).total_cmp(&spacing(b)))?;
        let gap = second.peak_temp - first.peak_temp;
        if gap >= self.config.min_peak_separation {
            return None;
        }

        let severity = if is_same(first, dominant) || is_same(second, dominant) {
            Severity::High
        } else {
            Severity::Medium
        };
        Some(Anomaly {
            kind: AnomalyKind::MultiTransition,
            severity,
            description: format!(
                "Transitions at {:.1} °C and {:.1} °C are only {:.1} °C apart; \
                 likely one event split by an artifact rather than two species",
                first.peak_temp, second.peak_temp, gap
            ),
            affected_range: (first.onset_temp, second.offset_temp),
        })
    }

    fn aggregation_spike(
        &self,
        smoothed: &SmoothedCurve,
        derivative: &DerivativeCurve,
        transitions: &TransitionSet,
    ) -> Option<Anomaly> {
        let temps = derivative.temperatures();
        let d = derivative.values();
        let n = d.len();
        let half = smoothed.window() / 2;
        if n < 4 || n < half + 4 {
            return None;
        }

        let jerk: Vec<f64> = (1..n - 1)
            .map(|i| ((d[i + 1] - d[i]) - (d[i] - d[i - 1])).abs())
            .collect();
        let typical = median(&jerk)?;
        let max_slope = d.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let limit = (self.config.spike_median_multiple * typical)
            .max(self.config.spike_max_fraction * max_slope)
            .max(self.config.spike_floor);

        let (first_t, last_t) = (temps[0], temps[n - 1]);
        let late_start = last_t - self.config.late_region_fraction * (last_t - first_t);
        let last_allowed = n - 2 - half;

        let flagged: Vec<usize> = (1..=last_allowed)
            .filter(|&i| temps[i] >= late_start && jerk[i - 1] > limit)
            .collect();
        let (&lo, &hi) = (flagged.first()?, flagged.last()?);
        let range = (temps[lo - 1], temps[hi + 1]);

        let severity = match transitions.dominant() {
            None => Severity::Low,
            Some(t) if t.peak_temp >= range.0 && t.peak_temp <= range.1 => Severity::High,
            Some(_) => Severity::Medium,
        };
        let peak_jerk = flagged.iter().map(|&i| jerk[i - 1]).fold(0.0, f64::max);
        Some(Anomaly {
            kind: AnomalyKind::AggregationSpike,
            severity,
            description: format!(
                "Abrupt derivative change of {:.2e} between {:.1} °C and {:.1} °C \
                 ({:.0}x the typical change); consistent with aggregation",
                peak_jerk,
                range.0,
                range.1,
                peak_jerk / typical.max(f64::MIN_POSITIVE)
            ),
            affected_range: range,
        })
    }

    fn truncated_transition(&self, transitions: &TransitionSet) -> Option<Anomaly> {
        let dominant = transitions.dominant()?;
        let truncated: Vec<&Transition> = transitions.iter().filter(|t| t.is_truncated()).collect();
        let worst = truncated
            .iter()
            .find(|t| is_same(t, dominant))
            .or_else(|| truncated.first())?;

        let severity = if is_same(worst, dominant) {
            Severity::High
        } else {
            Severity::Medium
        };
        let side = match (worst.onset_resolved, worst.offset_resolved) {
            (false, false) => "onset and offset lie",
            (false, true) => "onset lies",
            _ => "offset lies",
        };
        Some(Anomaly {
            kind: AnomalyKind::TruncatedTransition,
            severity,
            description: format!(
                "Transition at {:.1} °C is truncated: its {} outside the sampled temperature range",
                worst.peak_temp, side
            ),
            affected_range: (worst.onset_temp, worst.offset_temp),
        })
    }
}

/// Ordering used to pick the single reported anomaly; `Less` ranks first.
fn rank(a: &Anomaly, b: &Anomaly) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.range_width().total_cmp(&a.range_width()))
        .then_with(|| a.kind.precedence().cmp(&b.kind.precedence()))
}

fn spacing(pair: &(&Transition, &Transition)) -> f64 {
    pair.1.peak_temp - pair.0.peak_temp
}

fn is_same(a: &Transition, b: &Transition) -> bool {
    std::ptr::eq(a, b)
}
