// ankle_sim/src/lib.rs

//! Scenario-driven front end for `ankle_core`: loads inputs from disk,
//! runs the simulation, and exports the trajectory.

pub mod cli;
pub mod config;
pub mod data;
pub mod output;
pub mod prelude;

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ankle_core::prelude::*;
use crate::config::ScenarioConfig;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,ankle_core=info,ankle_sim=info";

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Builds the input series a scenario describes. Relative paths resolve
/// against `base_dir`; synthetic series are sized to cover the horizon.
pub fn load_inputs(
    config: &ScenarioConfig,
    base_dir: &Path,
) -> anyhow::Result<(ExcitationSeries, ExternalSeries, SampleClock)> {
    let clock = SampleClock::new(config.data.samples_per_unit)?;
    let len = clock.required_len(config.simulation.sim_time);

    let excitation = match (&config.data.excitation, config.data.constant_excitation) {
        (Some(path), _) => data::read_excitation(&resolve(base_dir, path))?,
        (None, Some(value)) => {
            info!("Using constant excitation {} for {} samples", value, len);
            ExcitationSeries::constant(value, len)
        }
        (None, None) => return Err(config::ConfigError::AmbiguousExcitation.into()),
    };

    let external = match &config.data.external {
        Some(paths) => {
            let paths = paths.clone().map(|p| resolve(base_dir, &p));
            data::read_external(&paths)?
        }
        None => {
            info!("No external-state files given; holding all channels at zero");
            ExternalSeries::flat(len, clock)
        }
    };

    Ok((excitation, external, clock))
}

/// Runs one scenario end to end and returns the trajectory.
pub fn run_scenario(config: &ScenarioConfig, base_dir: &Path) -> anyhow::Result<Trajectory> {
    let (excitation, external, clock) = load_inputs(config, base_dir)?;
    let simulation = Simulation::new(excitation, external)
        .with_params(config.parameters.clone())
        .with_clock(clock)
        .with_method(config.solver.method)
        .with_options(config.solver.options());

    let trajectory = simulation
        .run(&config.simulation.initial_state_radians(), config.simulation.sim_time)
        .context("simulation failed")?;

    if let Some(path) = &config.output.path {
        let path = resolve(base_dir, path);
        output::write_trajectory(&path, &trajectory)?;
        info!("Wrote {} points to {}", trajectory.len(), path.display());
    }
    Ok(trajectory)
}
