// ankle_core/src/models/joint.rs

//! Torque balance around the ankle joint.

use crate::models::muscle::MuscleState;
use crate::params::ModelParameters;
use crate::types::{AnkleState, ExternalState};

/// Gravity acting on the foot COM. Negative: resists dorsiflexion.
pub fn gravity_torque(x: &AnkleState, p: &ModelParameters) -> f64 {
    -p.foot_mass * p.com_distance * x[1].cos() * p.gravity
}

/// Torque induced by the measured ankle inputs projected through the current angle.
pub fn ankle_torque(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> f64 {
    p.foot_mass * p.com_distance * (x_ext[0] * x[1].sin() - x_ext[1] * x[1].cos())
}

/// Passive double-exponential stiffness, `exp(a1 + a2 x2) - exp(a3 + a4 x2) + a5`.
pub fn elastic_torque(x: &AnkleState, p: &ModelParameters) -> f64 {
    let [a1, a2, a3, a4, a5] = p.elastic;
    (a1 + a2 * x[1]).exp() - (a3 + a4 * x[1]).exp() + a5
}

/// Damping on the mismatch between the reference and the simulated velocity.
pub fn viscous_torque(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> f64 {
    p.viscosity * (x_ext[3] - x[2])
}

/// The individual terms of `x3Dot`.
///
/// The muscle term is already divided by the inertia; the remaining terms
/// enter the acceleration as they are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTorques {
    pub muscle: f64,
    pub gravity: f64,
    pub ankle: f64,
    pub elastic: f64,
    pub viscous: f64,
}

impl JointTorques {
    pub fn compute(
        x: &AnkleState,
        x_ext: &ExternalState,
        muscle: &MuscleState,
        p: &ModelParameters,
    ) -> Self {
        Self {
            muscle: muscle.force * p.moment_arm / p.inertia,
            gravity: gravity_torque(x, p),
            ankle: ankle_torque(x, x_ext, p),
            elastic: elastic_torque(x, p),
            viscous: viscous_torque(x, x_ext, p),
        }
    }

    pub fn net_acceleration(&self) -> f64 {
        self.muscle + self.gravity + self.ankle + self.elastic + self.viscous
    }
}

/// `x3Dot = Fm d / J + Tgrav + Tankle + TEla + B (x_ext[3] - x3)`
pub fn angular_acceleration(x: &AnkleState, x_ext: &ExternalState, p: &ModelParameters) -> f64 {
    let muscle = MuscleState::compute(x, x_ext, p);
    JointTorques::compute(x, x_ext, &muscle, p).net_acceleration()
}
