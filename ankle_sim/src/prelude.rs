// ankle_sim/src/prelude.rs

// Re-export the entire ankle_core prelude so binaries and examples only
// need a single import.
pub use ankle_core::prelude::*;

pub use crate::cli::Cli;
pub use crate::config::structs::*;
pub use crate::config::{ConfigError, ENV_PREFIX};
pub use crate::data::{read_channel, read_excitation, read_external, DataError};
pub use crate::output::write_trajectory;
pub use crate::{init_logging, load_inputs, run_scenario};
