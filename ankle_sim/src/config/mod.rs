// ankle_sim/src/config/mod.rs

//! Loading and validation of scenario files.

pub mod structs;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub use structs::{
    AngleUnit, DataSection, OutputSection, ScenarioConfig, SimulationSection, SolverSection,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] figment::Error),

    #[error("[data] must set exactly one of `excitation` and `constant_excitation`")]
    AmbiguousExcitation,
}

/// Environment variables with this prefix override scenario values,
/// `__` separating nested keys (e.g. `ANKLE_SIMULATION__SIM_TIME=0.2`).
pub const ENV_PREFIX: &str = "ANKLE_";

impl ScenarioConfig {
    /// Reads a scenario file, then layers `ANKLE_*` environment overrides on top.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading scenario from: {}", path.display());
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    /// Parses a scenario from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::extract(Figment::new().merge(Toml::string(toml)))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: ScenarioConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks serde cannot express. Numeric ranges are left to
    /// the core, which validates parameters and solver options itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.excitation.is_some() == self.data.constant_excitation.is_some() {
            return Err(ConfigError::AmbiguousExcitation);
        }
        Ok(())
    }
}
