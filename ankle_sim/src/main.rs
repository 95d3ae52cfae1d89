// ankle_sim/src/main.rs

use ankle_sim::prelude::*;
use anyhow::Context;
use clap::Parser;
use std::path::Path;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = ScenarioConfig::load(&cli.scenario)
        .with_context(|| format!("could not load scenario {}", cli.scenario.display()))?;
    cli.apply_overrides(&mut config);

    let base_dir = cli.scenario.parent().unwrap_or(Path::new("."));
    let trajectory = run_scenario(&config, base_dir)?;

    let x = trajectory.final_state();
    let (activation, angle, velocity) = (x[0], x[1], x[2]);
    info!(
        "Final state at t = {}: activation = {:.5}, angle = {:.5} rad ({:.2} deg), velocity = {:.5} rad/s",
        trajectory.times.last().copied().unwrap_or_default(),
        activation,
        angle,
        angle.to_degrees(),
        velocity
    );
    info!(
        "Solver: {} accepted, {} rejected steps, {} derivative evaluations",
        trajectory.stats.accepted_steps,
        trajectory.stats.rejected_steps,
        trajectory.stats.evaluations
    );
    Ok(())
}
