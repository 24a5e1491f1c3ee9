//! # Workflows Module
//!
//! High-level procedures that callers of the library use directly. Each workflow
//! composes the engine tasks, emits progress events and returns the serializable
//! output types from [`crate::core::models`].
//!
//! ## Overview
//!
//! - **Analysis** ([`analyze`]) - validation, smoothing, transition detection,
//!   quality and anomaly assessment of one curve, or of many independent curves.
//! - **Simulation** ([`simulate`]) - the parametric forward model, single or batched,
//!   and the opt-in round trip that analyzes a freshly simulated curve.
//!
//! Batched workflows return one `Result` per input in input order. [`BatchEntry`] is
//! the per-item form handed across a serialization boundary.

use crate::engine::error::{EngineError, ErrorReport};
use serde::{Deserialize, Serialize};

pub mod analyze;
pub mod simulate;

/// One element of a serialized batch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry<T> {
    pub index: usize,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl<T> BatchEntry<T> {
    pub fn from_result(index: usize, result: Result<T, EngineError>) -> Self {
        match result {
            Ok(data) => Self {
                index,
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                index,
                success: false,
                data: None,
                error: Some(e.to_report()),
            },
        }
    }
}

/// Tags every batch result with its input position.
pub fn into_entries<T>(results: Vec<Result<T, EngineError>>) -> Vec<BatchEntry<T>> {
    results
        .into_iter()
        .enumerate()
        .map(|(index, result)| BatchEntry::from_result(index, result))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ErrorKind;

    #[test]
    fn entries_keep_index_and_split_success_from_error() {
        let results: Vec<Result<u32, EngineError>> = vec![
            Ok(7),
            Err(EngineError::malformed("only 3 points")),
            Ok(9),
        ];
        let entries = into_entries(results);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].data, Some(7));
        assert!(entries[0].success && entries[0].error.is_none());
        assert_eq!(entries[1].index, 1);
        assert!(!entries[1].success && entries[1].data.is_none());
        assert_eq!(entries[1].error.as_ref().unwrap().kind, ErrorKind::MalformedCurve);
        assert_eq!(entries[2].index, 2);
    }

    #[test]
    fn failed_entry_serializes_without_data_field() {
        let entry: BatchEntry<u32> = BatchEntry::from_result(4, Err(EngineError::NoTransitionFound));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["index"], 4);
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["kind"], "NoTransitionFound");
    }
}
