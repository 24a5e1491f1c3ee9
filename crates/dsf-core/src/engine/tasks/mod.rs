//! The analysis stages that run on a validated curve.
//!
//! Each task is a small struct borrowing its slice of the configuration and exposing a
//! single pure entry point. Tasks never call each other; the analysis workflow wires
//! smoothing → transition detection → quality and anomaly assessment.

pub mod anomalies;
pub mod quality;
pub mod smoothing;
pub mod transitions;
