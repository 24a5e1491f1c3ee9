//! # nanoDSF Core Library
//!
//! Analysis and forward simulation of nanoscale Differential Scanning Fluorimetry
//! (nanoDSF) curves: the F350/F330 fluorescence ratio of a protein sample recorded
//! across a temperature ramp.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that every analysis run
//! stays a pure function of its input curve and configuration.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`RawCurve`, `Transition`,
//!   reports), pure numerics (local polynomial smoothing, finite differences, robust
//!   statistics) and the measurement-table reader.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the error taxonomy, progress
//!   reporting, curve validation, the analysis tasks (transition detection, quality
//!   assessment, anomaly detection) and the parametric simulation engine.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the engine:
//!   `analyze` a curve, `simulate` a curve from experimental parameters, run either in
//!   batches, or explicitly `round_trip` a simulated curve through the analyzer.

pub mod core;
pub mod engine;
pub mod workflows;
