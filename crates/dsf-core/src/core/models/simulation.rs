use serde::{Deserialize, Serialize};

/// Experimental conditions for one synthetic curve. Omitted fields take the
/// reference values of [`SimulationRequest::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationRequest {
    /// Intrinsic melting temperature in °C.
    pub base_tm: f64,
    /// Ratio change across the unfolding transition.
    pub base_amplitude: f64,
    pub ph: f64,
    /// Protein concentration in mg/mL.
    pub protein_concentration: f64,
    /// Ligand-induced Tm shift in °C.
    pub ligand_affinity: f64,
    pub temperature_range_start: f64,
    pub temperature_range_end: f64,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            base_tm: 60.0,
            base_amplitude: 0.3,
            ph: 7.4,
            protein_concentration: 1.0,
            ligand_affinity: 0.0,
            temperature_range_start: 20.0,
            temperature_range_end: 95.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub temperatures: Vec<f64>,
    pub ratios: Vec<f64>,
    /// The noiseless analytic Tm of the forward model.
    pub predicted_tm: f64,
}

/// Outcome of simulating a curve and then analyzing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTripReport {
    pub predicted_tm: f64,
    pub recovered_tm: Option<f64>,
    pub tm_error: Option<f64>,
    pub num_transitions: usize,
    pub tm_confidence: f64,
}
