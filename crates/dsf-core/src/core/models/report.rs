use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLabel {
    Invalid,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl QualityLabel {
    /// Maps a 0–100 score onto its band.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 85.0 => QualityLabel::Excellent,
            s if s >= 70.0 => QualityLabel::Good,
            s if s >= 50.0 => QualityLabel::Acceptable,
            s if s >= 30.0 => QualityLabel::Poor,
            _ => QualityLabel::Invalid,
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityLabel::Invalid => "invalid",
            QualityLabel::Poor => "poor",
            QualityLabel::Acceptable => "acceptable",
            QualityLabel::Good => "good",
            QualityLabel::Excellent => "excellent",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(rename = "quality")]
    pub label: QualityLabel,
    pub score: f64,
    pub snr_estimate: f64,
    pub baseline_noise: f64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    MultiTransition,
    AggregationSpike,
    TruncatedTransition,
}

impl AnomalyKind {
    /// Fixed precedence used as the last tie-break between competing anomalies.
    pub(crate) fn precedence(self) -> u8 {
        match self {
            AnomalyKind::TruncatedTransition => 0,
            AnomalyKind::MultiTransition => 1,
            AnomalyKind::AggregationSpike => 2,
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalyKind::MultiTransition => "multi_transition",
            AnomalyKind::AggregationSpike => "aggregation_spike",
            AnomalyKind::TruncatedTransition => "truncated_transition",
        };
        f.write_str(name)
    }
}

/// A single detected anomaly before it is folded into the per-run report.
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
    pub affected_range: (f64, f64),
}

impl Anomaly {
    pub fn range_width(&self) -> f64 {
        self.affected_range.1 - self.affected_range.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub has_anomalies: bool,
    pub anomaly_type: Option<AnomalyKind>,
    pub severity: Option<Severity>,
    pub description: Option<String>,
    pub affected_temperature_range: Option<(f64, f64)>,
}

impl AnomalyReport {
    pub fn none() -> Self {
        Self::default()
    }
}

impl From<Anomaly> for AnomalyReport {
    fn from(anomaly: Anomaly) -> Self {
        Self {
            has_anomalies: true,
            anomaly_type: Some(anomaly.kind),
            severity: Some(anomaly.severity),
            description: Some(anomaly.description),
            affected_temperature_range: Some(anomaly.affected_range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bands_match_thresholds() {
        assert_eq!(QualityLabel::from_score(100.0), QualityLabel::Excellent);
        assert_eq!(QualityLabel::from_score(85.0), QualityLabel::Excellent);
        assert_eq!(QualityLabel::from_score(84.9), QualityLabel::Good);
        assert_eq!(QualityLabel::from_score(70.0), QualityLabel::Good);
        assert_eq!(QualityLabel::from_score(50.0), QualityLabel::Acceptable);
        assert_eq!(QualityLabel::from_score(30.0), QualityLabel::Poor);
        assert_eq!(QualityLabel::from_score(29.99), QualityLabel::Invalid);
        assert_eq!(QualityLabel::from_score(0.0), QualityLabel::Invalid);
    }

    #[test]
    fn severity_orders_low_to_high() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn anomaly_converts_into_a_populated_report() {
        let report = AnomalyReport::from(Anomaly {
            kind: AnomalyKind::TruncatedTransition,
            severity: Severity::High,
            description: "offset beyond range".to_string(),
            affected_range: (80.0, 95.0),
        });
        assert!(report.has_anomalies);
        assert_eq!(report.anomaly_type, Some(AnomalyKind::TruncatedTransition));
        assert_eq!(report.affected_temperature_range, Some((80.0, 95.0)));
    }

    #[test]
    fn empty_report_has_no_anomalies() {
        let report = AnomalyReport::none();
        assert!(!report.has_anomalies);
        assert!(report.anomaly_type.is_none());
        assert!(report.severity.is_none());
    }
}
