//! Reading nanoDSF measurement tables.
//!
//! Instruments export one row per temperature step with the two fluorescence channels.
//! This module turns such tables into [`Measurement`](crate::core::models::curve::Measurement)
//! rows; the ratio and every structural check happen later in the validator.

pub mod table;
pub mod traits;
