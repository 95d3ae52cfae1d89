// ankle_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

use crate::config::ScenarioConfig;

/// Ankle-foot FES simulator.
///
/// Runs one forward simulation described by a scenario TOML file and writes
/// the resulting trajectory as CSV.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(
        short,
        long,
        default_value = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/assets/scenarios/constant_excitation.toml"
        )
    )]
    pub scenario: PathBuf,

    /// Where to write the trajectory CSV. Overrides `[output] path`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Simulation horizon. Overrides `[simulation] sim_time`.
    #[arg(long)]
    pub sim_time: Option<f64>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded scenario.
    pub fn apply_overrides(&self, config: &mut ScenarioConfig) {
        if let Some(path) = &self.output {
            config.output.path = Some(path.clone());
        }
        if let Some(sim_time) = self.sim_time {
            config.simulation.sim_time = sim_time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_scenario_values() {
        let cli = Cli::parse_from(["ankle_sim", "--output", "out.csv", "--sim-time", "0.2"]);
        let mut config = ScenarioConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.output.path, Some(PathBuf::from("out.csv")));
        assert_eq!(config.simulation.sim_time, 0.2);
    }

    #[test]
    fn no_overrides_keep_scenario_values() {
        let cli = Cli::parse_from(["ankle_sim", "-s", "custom.toml"]);
        assert_eq!(cli.scenario, PathBuf::from("custom.toml"));
        let mut config = ScenarioConfig::default();
        let before = config.simulation.sim_time;
        cli.apply_overrides(&mut config);
        assert_eq!(config.simulation.sim_time, before);
        assert_eq!(config.output.path, None);
    }
}
