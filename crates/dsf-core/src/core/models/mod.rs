//! Data structures flowing through an analysis or simulation run.

pub mod curve;
pub mod output;
pub mod report;
pub mod simulation;
pub mod transition;
