pub mod analyze;
pub mod info;
pub mod round_trip;
pub mod simulate;
