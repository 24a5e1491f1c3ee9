//! # Core Module
//!
//! The stateless foundation of the nanoDSF engine.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Curves, transitions, quality and anomaly reports,
//!   simulation requests/results and the serialized analysis output schema
//! - **Signal Processing** ([`signal`]) - Local polynomial smoothing, finite-difference
//!   derivatives and the small statistics toolkit shared by the analysis tasks
//! - **File I/O** ([`io`]) - Reading `temperature`/`F330`/`F350` measurement tables
//!
//! Nothing in this module holds state between calls; every function maps its inputs to
//! freshly allocated outputs.

pub mod io;
pub mod models;
pub mod signal;
