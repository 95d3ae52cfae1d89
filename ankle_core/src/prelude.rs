// ankle_core/src/prelude.rs

// --- Core Abstractions ---
pub use crate::error::{Channel, ModelError, ModelResult};
pub use crate::models::Dynamics;
pub use crate::types::{AnkleState, ExternalState, State, StateVariable};

// --- Model ---
pub use crate::models::ankle_foot::{AnkleFootModel, Evaluation};
pub use crate::models::joint::JointTorques;
pub use crate::models::muscle::{ForceVelocityRegime, MuscleState};
pub use crate::params::{ActivationLaw, ModelParameters};

// --- Inputs ---
pub use crate::sampler::{
    ExcitationSeries, ExternalSeries, SampleClock, SampledInputs, SignalSampler,
    EXTERNAL_CHANNELS,
};

// --- Integration ---
pub use crate::simulation::{simulate, Simulation, SolverMethod, Trajectory};
pub use crate::utils::adaptive::{Dopri5, SolverOptions, SolverStats};
pub use crate::utils::integrators::{Integrator, RK1, RK4};
