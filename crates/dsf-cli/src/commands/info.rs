use crate::error::Result;
use nanodsf::engine::config::{AnalysisConfig, SimulationConfig};
use nanodsf::engine::simulation::parameter_domains;

pub fn run() -> Result<()> {
    println!("nanodsf {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Simulation request parameters:");
    for domain in parameter_domains() {
        let lower = if domain.min_inclusive { '[' } else { '(' };
        let upper = if domain.max.is_infinite() {
            "∞)".to_string()
        } else {
            format!("{}]", domain.max)
        };
        println!(
            "  {:<26} {}{}, {} {:<6} {}",
            domain.name, lower, domain.min, upper, domain.unit, domain.description
        );
    }

    let simulation = SimulationConfig::default();
    println!();
    println!("Forward model:");
    println!(
        "  Tm = base_tm + {} * (ph - {}) + ligand_affinity + {} * ln(max(concentration, {}))",
        simulation.ph_coefficient,
        simulation.reference_ph,
        simulation.concentration_coefficient,
        simulation.concentration_floor
    );
    println!(
        "  {} points, transition width {} °C, folded ratio {}, noise {}% of amplitude",
        simulation.num_points,
        simulation.transition_width,
        simulation.ratio_floor,
        simulation.noise_fraction * 100.0
    );

    let analysis = AnalysisConfig::default();
    println!();
    println!("Default analysis thresholds:");
    println!("  validation.min-points            {}", analysis.validation.min_points);
    println!("  smoothing.window-fraction        {}", analysis.smoothing.window_fraction);
    println!("  transitions.threshold-sigma      {}", analysis.transitions.threshold_sigma);
    println!("  transitions.min-confidence       {}", analysis.transitions.min_confidence);
    println!("  quality.max-baseline-noise       {}", analysis.quality.max_baseline_noise);
    println!("  quality.min-snr                  {}", analysis.quality.min_snr);
    println!("  anomalies.min-peak-separation    {}", analysis.anomalies.min_peak_separation);
    Ok(())
}
