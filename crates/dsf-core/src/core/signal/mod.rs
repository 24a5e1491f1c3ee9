//! Pure numerical routines used by the analysis tasks.
//!
//! - [`smoothing`] - Local polynomial (Savitzky–Golay style) smoothing with shrinking
//!   edge windows
//! - [`derivative`] - Finite-difference first derivatives on non-uniform grids
//! - [`stats`] - Descriptive statistics, linear detrending and peak refinement

pub mod derivative;
pub mod smoothing;
pub mod stats;
