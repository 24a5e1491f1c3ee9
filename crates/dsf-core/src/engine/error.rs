use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Malformed curve: {reason}")]
    MalformedCurve { reason: String },

    #[error("No unfolding transition survived thresholding")]
    NoTransitionFound,

    #[error("Invalid simulation parameter '{parameter}' = {value}: {reason}")]
    InvalidSimulationParameter {
        parameter: &'static str,
        value: f64,
        reason: String,
    },

    #[error("Numeric instability in {context}: {reason}")]
    NumericInstability {
        context: &'static str,
        reason: String,
    },
}

impl EngineError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        EngineError::MalformedCurve {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::MalformedCurve { .. } => ErrorKind::MalformedCurve,
            EngineError::NoTransitionFound => ErrorKind::NoTransitionFound,
            EngineError::InvalidSimulationParameter { .. } => ErrorKind::InvalidSimulationParameter,
            EngineError::NumericInstability { .. } => ErrorKind::NumericInstability,
        }
    }

    /// The structured form handed to callers at the serialization boundary.
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MalformedCurve,
    NoTransitionFound,
    InvalidSimulationParameter,
    NumericInstability,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedCurve => "MalformedCurve",
            ErrorKind::NoTransitionFound => "NoTransitionFound",
            ErrorKind::InvalidSimulationParameter => "InvalidSimulationParameter",
            ErrorKind::NumericInstability => "NumericInstability",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&EngineError> for ErrorReport {
    fn from(error: &EngineError) -> Self {
        error.to_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_carries_kind_and_message() {
        let error = EngineError::InvalidSimulationParameter {
            parameter: "ph",
            value: 15.0,
            reason: "must lie in [0, 14]".to_string(),
        };
        let report = error.to_report();
        assert_eq!(report.kind, ErrorKind::InvalidSimulationParameter);
        assert!(report.message.contains("'ph'"));
        assert!(report.message.contains("15"));
    }

    #[test]
    fn malformed_helper_builds_the_expected_variant() {
        let error = EngineError::malformed("too few points");
        assert_eq!(error.kind(), ErrorKind::MalformedCurve);
        assert_eq!(error.to_string(), "Malformed curve: too few points");
    }

    #[test]
    fn kind_display_matches_taxonomy_names() {
        assert_eq!(ErrorKind::NoTransitionFound.to_string(), "NoTransitionFound");
        assert_eq!(EngineError::NoTransitionFound.kind(), ErrorKind::NoTransitionFound);
    }
}
