//! # Engine Module
//!
//! The computational layer of the crate: everything that turns a validated curve into
//! transitions, scores and flags, plus the forward simulator.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Thresholds and weights of every stage, with a
//!   validating builder
//! - **Error Handling** ([`error`]) - The engine's error taxonomy and its serialized form
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for callers
//! - **Validation** ([`validation`]) - Structural checks that produce a `RawCurve`
//! - **Tasks** ([`tasks`]) - Smoothing, transition detection, quality and anomaly scoring
//! - **Simulation** ([`simulation`]) - The parametric forward model and its parameter domains
//!
//! Every stage is a pure function of its input and configuration, so independent curves
//! and requests can be processed concurrently without coordination.

pub mod config;
pub mod error;
pub mod progress;
pub mod simulation;
pub mod tasks;
pub mod validation;
