// ankle_core/src/models/mod.rs

use crate::error::{ModelError, ModelResult};
use crate::types::{State, StateVariable};
use crate::utils::integrators::Integrator;
use std::fmt::Debug;

// --- DYNAMICS MODEL TRAIT ---
/// A continuous-time model `x_dot = f(x, t)` whose inputs are bound at
/// construction, so the solver only ever supplies time and state.
///
/// Implementations must be pure with respect to `x`: solvers call
/// `get_derivatives` several times per step, at times of their choosing.
pub trait Dynamics: Debug + Send + Sync {
    /// Returns the complete layout of the state vector for this model.
    /// The order of this Vec defines the indices for the state vector `x`.
    fn get_state_layout(&self) -> Vec<StateVariable>;

    /// Returns the total number of states (the length of the state vector `x`).
    fn get_state_dim(&self) -> usize {
        self.get_state_layout().len()
    }

    /// Computes the time derivative of the state vector at time `t`.
    ///
    /// # Errors
    /// Fails when the model cannot produce inputs for `t`, for example when
    /// a bound input series does not reach that far.
    fn get_derivatives(&self, x: &State, t: f64) -> ModelResult<State>;

    /// Propagates the state forward by `dt` with a fixed-step integrator.
    ///
    /// # Arguments
    /// * `x`: Current state vector (`State`).
    /// * `t`: Current simulation time.
    /// * `dt`: Time step duration. Must be non-negative.
    /// * `integrator`: The fixed-step scheme (e.g. `RK4`).
    fn propagate(
        &self,
        x: &State,
        t: f64,
        dt: f64,
        integrator: &dyn Integrator<f64>,
    ) -> ModelResult<State> {
        if dt.is_nan() || dt < 0.0 {
            return Err(ModelError::Configuration(format!(
                "propagation step must be non-negative, got {}",
                dt
            )));
        }
        if x.nrows() != self.get_state_dim() {
            return Err(ModelError::Configuration(format!(
                "state has {} entries, model expects {}",
                x.nrows(),
                self.get_state_dim()
            )));
        }

        let func = |func_x: &State, func_t: f64| -> ModelResult<State> {
            self.get_derivatives(func_x, func_t)
        };

        integrator.step(&func, x, t, t + dt)
    }
}

pub mod ankle_foot;
pub mod joint;
pub mod muscle;
