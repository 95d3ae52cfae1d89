// ankle_sim/src/config/structs.rs

use ankle_core::prelude::{ModelParameters, SolverMethod, SolverOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// Everything needed for one simulation run.
/// This struct is the root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    // Every section may be omitted.
    #[serde(default)]
    pub simulation: SimulationSection,

    #[serde(default)]
    pub solver: SolverSection,

    #[serde(default)]
    pub data: DataSection,

    /// Any subset of the model constants; the rest keep their defaults.
    #[serde(default)]
    pub parameters: ModelParameters,

    #[serde(default)]
    pub output: OutputSection,
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in a scenario.toml file.
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    Radians,
    #[default]
    Degrees,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    /// Horizon in solver time units.
    pub sim_time: f64,
    /// `[activation, angle, angular velocity]`.
    pub initial_state: [f64; 3],
    /// Unit of the angle entry in `initial_state`. Velocity is always rad/s.
    pub angle_unit: AngleUnit,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            sim_time: 0.36,
            initial_state: [0.0, -15.0, 0.0],
            angle_unit: AngleUnit::Degrees,
        }
    }
}

impl SimulationSection {
    /// Initial state with the angle converted to radians.
    pub fn initial_state_radians(&self) -> [f64; 3] {
        let [activation, angle, velocity] = self.initial_state;
        let angle = match self.angle_unit {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => angle.to_radians(),
        };
        [activation, angle, velocity]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSection {
    pub method: SolverMethod,
    /// Step cap for the adaptive solver, step size for the fixed-step ones.
    pub max_step: f64,
    pub rtol: f64,
    pub atol: f64,
    pub first_step: Option<f64>,
    pub max_steps: usize,
}

impl Default for SolverSection {
    fn default() -> Self {
        let options = SolverOptions::default();
        Self {
            method: SolverMethod::default(),
            max_step: options.max_step,
            rtol: options.rtol,
            atol: options.atol,
            first_step: options.first_step,
            max_steps: options.max_steps,
        }
    }
}

impl SolverSection {
    pub fn options(&self) -> SolverOptions {
        SolverOptions {
            rtol: self.rtol,
            atol: self.atol,
            max_step: self.max_step,
            first_step: self.first_step,
            max_steps: self.max_steps,
        }
    }
}

/// Where the input series come from. Relative paths are resolved against
/// the directory of the scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSection {
    /// Excitation CSV. When absent, `constant_excitation` is used for the whole run.
    #[serde(default)]
    pub excitation: Option<PathBuf>,
    #[serde(default)]
    pub constant_excitation: Option<f64>,
    /// The four external-state CSVs. When absent, all channels are held at zero.
    #[serde(default)]
    pub external: Option<[PathBuf; 4]>,
    /// Samples per unit of solver time in every input series.
    #[serde(default = "unit_rate")]
    pub samples_per_unit: f64,
}

fn unit_rate() -> f64 {
    1.0
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            excitation: None,
            constant_excitation: Some(0.2),
            external: None,
            samples_per_unit: unit_rate(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Trajectory CSV destination. Nothing is written when absent.
    pub path: Option<PathBuf>,
}
