// ankle_core/src/models/muscle.rs

//! Tibialis anterior force: activation times maximal isometric force, shaped
//! by the force-length and force-velocity relations.

use crate::params::ModelParameters;
use crate::types::{AnkleState, ExternalState};

/// Which side of the force-velocity curve a contraction sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceVelocityRegime {
    /// `vCE < 0`: the contractile element is shortening.
    Shortening,
    /// `vCE >= 0`: lengthening, or isometric at exactly zero.
    Lengthening,
}

impl ForceVelocityRegime {
    /// Strict sign test; `vCE == 0` falls on the lengthening side.
    pub fn from_velocity(v_ce: f64) -> Self {
        if v_ce < 0.0 {
            ForceVelocityRegime::Shortening
        } else {
            ForceVelocityRegime::Lengthening
        }
    }

    /// Evaluates this branch's formula at `v_ce`, regardless of whether the
    /// velocity actually belongs to the branch.
    pub fn evaluate(&self, v_ce: f64, p: &ModelParameters) -> f64 {
        match self {
            ForceVelocityRegime::Shortening => {
                (1.0 - v_ce / p.v_max) / (1.0 + v_ce / (p.v_max * p.fv1))
            }
            ForceVelocityRegime::Lengthening => {
                (1.0 - p.a_v * (v_ce / p.fv2)) / (1.0 + v_ce / p.fv2)
            }
        }
    }
}

/// Muscle-tendon unit length, `lMT0 + d (x_ext[2] - x2)`.
pub fn muscle_tendon_length(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> f64 {
    p.rest_length + p.moment_arm * (x_ext[2] - x[1])
}

/// Contraction velocity of the contractile element, `d (x_ext[3] - x3)`.
pub fn contraction_velocity(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> f64 {
    p.moment_arm * (x_ext[3] - x[2])
}

/// Gaussian force-length factor in (0, 1] for a contractile-element length.
pub fn force_length_at(l_ce: f64, p: &ModelParameters) -> f64 {
    let l_opt = p.optimal_fiber_length();
    (-((l_ce - l_opt) / (p.width * l_opt)).powi(2)).exp()
}

pub fn force_length(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> f64 {
    force_length_at(muscle_tendon_length(x, x_ext, p) - p.tendon_length, p)
}

pub fn force_velocity_at(v_ce: f64, p: &ModelParameters) -> f64 {
    ForceVelocityRegime::from_velocity(v_ce).evaluate(v_ce, p)
}

pub fn force_velocity(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> f64 {
    force_velocity_at(contraction_velocity(x, x_ext, p), p)
}

/// Intermediate quantities of one muscle force evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleState {
    pub muscle_tendon_length: f64,
    pub fiber_length: f64,
    pub contraction_velocity: f64,
    pub force_length: f64,
    pub force_velocity: f64,
    pub regime: ForceVelocityRegime,
    /// `Fm = x1 FMax Ffl Ffv` [N]
    pub force: f64,
}

impl MuscleState {
    pub fn compute(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> Self {
        let l_mt = muscle_tendon_length(x, x_ext, p);
        let l_ce = l_mt - p.tendon_length;
        let v_ce = contraction_velocity(x, x_ext, p);
        let regime = ForceVelocityRegime::from_velocity(v_ce);
        let f_fl = force_length_at(l_ce, p);
        let f_fv = regime.evaluate(v_ce, p);

        Self {
            muscle_tendon_length: l_mt,
            fiber_length: l_ce,
            contraction_velocity: v_ce,
            force_length: f_fl,
            force_velocity: f_fv,
            regime,
            force: x[0] * p.f_max * f_fl * f_fv,
        }
    }
}

pub fn muscle_force(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> f64 {
    MuscleState::compute(x, x_ext, p).force
}
