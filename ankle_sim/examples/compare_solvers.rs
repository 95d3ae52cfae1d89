// ankle_sim/examples/compare_solvers.rs

//! Runs the bundled constant-excitation scenario with each solver and
//! compares the final states.
//!
//! To run this example:
//! `cargo run -p ankle_sim --example compare_solvers`

use ankle_sim::prelude::*;
use std::path::Path;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_logging();

    // --- 1. Load the scenario shipped with the crate ---
    let scenario = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets/scenarios/constant_excitation.toml");
    let mut config = ScenarioConfig::load(&scenario)?;
    // Keep the CSV export out of this comparison.
    config.output.path = None;
    let base_dir = scenario.parent().unwrap_or(Path::new("."));

    // --- 2. Run the adaptive reference, then the fixed-step solvers ---
    let reference = run_scenario(&config, base_dir)?;
    let x_ref = reference.final_state();
    info!("dopri5: final state {:?} in {} points", x_ref.as_slice(), reference.len());

    for (method, step) in [(SolverMethod::Rk4, 1e-4), (SolverMethod::Euler, 1e-5)] {
        config.solver.method = method;
        config.solver.max_step = step;
        let trajectory = run_scenario(&config, base_dir)?;
        let x = trajectory.final_state();
        info!(
            "{:?} (dt = {}): final state {:?}, distance to dopri5 = {:.3e}",
            method,
            step,
            x.as_slice(),
            (x - x_ref).norm()
        );
    }
    Ok(())
}
