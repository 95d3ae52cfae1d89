// ankle_core/src/types.rs

use nalgebra::{DVector, Vector3, Vector4};

// --- Core Type Aliases ---
/// Dynamically sized vector handed to the generic integrators.
pub type State = DVector<f64>;
/// The model state `x = (x1, x2, x3)`: activation, ankle angle, angular velocity.
pub type AnkleState = Vector3<f64>;
/// The four external-state channels sampled at one instant.
pub type ExternalState = Vector4<f64>;

/// Every variable that can appear in the model's state vector.
/// The order returned by [`crate::models::Dynamics::get_state_layout`] defines the indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    /// Dynamic muscle activation level, dimensionless in [0, 1].
    Activation,
    /// Ankle angle in radians.
    AnkleAngle,
    /// Absolute angular velocity of the foot in radians/second.
    AngularVelocity,
}

impl StateVariable {
    pub fn name(&self) -> &'static str {
        match self {
            StateVariable::Activation => "activation",
            StateVariable::AnkleAngle => "angle",
            StateVariable::AngularVelocity => "velocity",
        }
    }
}

pub(crate) fn to_dynamic(x: &AnkleState) -> State {
    DVector::from_row_slice(x.as_slice())
}

pub(crate) fn to_fixed(x: &State) -> AnkleState {
    Vector3::new(x[0], x[1], x[2])
}
