// ankle_core/src/models/ankle_foot.rs

use crate::error::{ModelError, ModelResult};
use crate::models::joint::JointTorques;
use crate::models::muscle::MuscleState;
use crate::models::Dynamics;
use crate::params::ModelParameters;
use crate::sampler::{SampledInputs, SignalSampler};
use crate::types::{to_dynamic, AnkleState, State, StateVariable};

/// Three-state ankle-foot model driven by an excitation signal and four
/// externally measured kinematic channels.
///
/// The model holds only read-only inputs; every evaluation is a pure
/// function of `(t, x)`.
#[derive(Debug, Clone)]
pub struct AnkleFootModel {
    params: ModelParameters,
    sampler: SignalSampler,
}

/// Everything computed during one derivative evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub time: f64,
    pub inputs: SampledInputs,
    pub muscle: MuscleState,
    pub torques: JointTorques,
    pub derivative: AnkleState,
}

impl AnkleFootModel {
    /// Binds a validated parameter set to the input series.
    pub fn new(params: ModelParameters, sampler: SignalSampler) -> ModelResult<Self> {
        params.validate()?;
        Ok(Self { params, sampler })
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub fn sampler(&self) -> &SignalSampler {
        &self.sampler
    }

    /// `x1_dot` for activation `x1` under excitation `u`.
    pub fn activation_rate(&self, x1: f64, u: f64) -> f64 {
        let p = &self.params;
        (u - x1) * p.activation_law.bracket(u, p.t_act, p.t_deact)
    }

    /// Full breakdown of the derivative at `(t, x)`.
    pub fn evaluate(&self, t: f64, x: &AnkleState) -> ModelResult<Evaluation> {
        let inputs = self
            .sampler
            .sample(t)
            .map_err(|e| e.with_state(x.as_slice()))?;
        let muscle = MuscleState::compute(x, &inputs.external, &self.params);
        let torques = JointTorques::compute(x, &inputs.external, &muscle, &self.params);

        let derivative = AnkleState::new(
            self.activation_rate(x[0], inputs.excitation),
            x[2],
            torques.net_acceleration(),
        );

        Ok(Evaluation {
            time: t,
            inputs,
            muscle,
            torques,
            derivative,
        })
    }

    /// `(x1_dot, x2_dot, x3_dot)` at `(t, x)`.
    pub fn derivative(&self, t: f64, x: &AnkleState) -> ModelResult<AnkleState> {
        Ok(self.evaluate(t, x)?.derivative)
    }
}

impl Dynamics for AnkleFootModel {
    fn get_state_layout(&self) -> Vec<StateVariable> {
        vec![
            StateVariable::Activation,
            StateVariable::AnkleAngle,
            StateVariable::AngularVelocity,
        ]
    }

    fn get_derivatives(&self, x: &State, t: f64) -> ModelResult<State> {
        if x.nrows() != 3 {
            return Err(ModelError::Configuration(format!(
                "ankle-foot state has 3 entries, got {}",
                x.nrows()
            )));
        }
        let x = AnkleState::new(x[0], x[1], x[2]);
        Ok(to_dynamic(&self.derivative(t, &x)?))
    }
}
