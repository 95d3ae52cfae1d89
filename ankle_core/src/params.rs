// ankle_core/src/params.rs

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Form of the bracket in the first-order activation dynamics
/// `x1_dot = (u - x1) * bracket(u)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationLaw {
    /// `u / t_act + (1 - u) / t_deact`. Always positive, so activation
    /// relaxes toward the excitation: rising with `t_act`, decaying with `t_deact`.
    #[default]
    Relaxing,
    /// `u / t_act - (1 - u) / t_deact`, the literal published expression. The
    /// bracket vanishes at `u = t_act / (t_act + t_deact)` and turns negative
    /// below it, where activation moves away from the excitation.
    Published,
}

impl ActivationLaw {
    pub fn bracket(&self, u: f64, t_act: f64, t_deact: f64) -> f64 {
        match self {
            ActivationLaw::Relaxing => u / t_act + (1.0 - u) / t_deact,
            ActivationLaw::Published => u / t_act - (1.0 - u) / t_deact,
        }
    }
}

/// Physiological and anthropometric constants of the ankle-foot model.
///
/// The defaults describe an average subject (75 kg, 1.75 m). Lengths are kept
/// in the centimetre units the constants were fitted in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParameters {
    pub t_act: f64,   // Activation time constant [s]
    pub t_deact: f64, // Relaxation time constant [s]
    pub inertia: f64, // Foot inertia around the ankle [kg m^2]
    pub moment_arm: f64, // Tibialis anterior moment arm w.r.t. the ankle [cm]
    pub viscosity: f64,
    pub com_distance: f64, // Foot COM location w.r.t. the ankle [cm]
    pub foot_mass: f64,    // [kg]

    // Force-velocity shape
    pub a_v: f64,
    pub fv1: f64,
    pub fv2: f64,
    pub v_max: f64, // Maximal shortening speed, negative by convention [m/s]

    pub f_max: f64, // Maximal isometric force [N]

    // Force-length shape and muscle-tendon geometry
    pub width: f64,
    pub tendon_length: f64, // Constant tendon length [cm]
    pub rest_length: f64,   // Muscle-tendon length at rest [cm]

    /// `a1..a5` of the passive elastic torque curve. Free-form fitted constants.
    pub elastic: [f64; 5],
    pub gravity: f64,

    pub activation_law: ActivationLaw,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            t_act: 0.01,
            t_deact: 0.04,
            inertia: 0.0197,
            moment_arm: 3.7,
            viscosity: 0.82,
            com_distance: 11.45,
            foot_mass: 1.0275,
            a_v: 1.33,
            fv1: 0.18,
            fv2: 0.023,
            v_max: -0.9,
            f_max: 600.0,
            width: 0.56,
            tendon_length: 22.3,
            rest_length: 32.1,
            elastic: [2.10, -0.08, -7.97, 0.19, -1.79],
            gravity: 9.81,
            activation_law: ActivationLaw::default(),
        }
    }
}

impl ModelParameters {
    /// Optimal contractile-element length, `lMT0 - lT`.
    pub fn optimal_fiber_length(&self) -> f64 {
        self.rest_length - self.tendon_length
    }

    /// Checks the sign and finiteness invariants every computation relies on.
    pub fn validate(&self) -> ModelResult<()> {
        let named = [
            ("t_act", self.t_act),
            ("t_deact", self.t_deact),
            ("inertia", self.inertia),
            ("moment_arm", self.moment_arm),
            ("viscosity", self.viscosity),
            ("com_distance", self.com_distance),
            ("foot_mass", self.foot_mass),
            ("a_v", self.a_v),
            ("fv1", self.fv1),
            ("fv2", self.fv2),
            ("v_max", self.v_max),
            ("f_max", self.f_max),
            ("width", self.width),
            ("tendon_length", self.tendon_length),
            ("rest_length", self.rest_length),
            ("gravity", self.gravity),
        ];
        if let Some((name, value)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{} must be finite, got {}", name, value)));
        }
        if let Some(i) = self.elastic.iter().position(|a| !a.is_finite()) {
            return Err(invalid(format!("elastic coefficient a{} is not finite", i + 1)));
        }

        if self.t_act <= 0.0 {
            return Err(invalid(format!("t_act must be positive, got {}", self.t_act)));
        }
        if self.t_deact <= 0.0 {
            return Err(invalid(format!(
                "t_deact must be positive, got {}",
                self.t_deact
            )));
        }
        if self.inertia == 0.0 {
            return Err(invalid("inertia must be non-zero".to_string()));
        }
        if self.v_max >= 0.0 {
            return Err(invalid(format!(
                "v_max must be negative (shortening direction), got {}",
                self.v_max
            )));
        }
        if self.f_max <= 0.0 {
            return Err(invalid(format!("f_max must be positive, got {}", self.f_max)));
        }
        if self.fv1 == 0.0 || self.fv2 == 0.0 {
            return Err(invalid("fv1 and fv2 must be non-zero".to_string()));
        }
        if self.width * self.optimal_fiber_length() == 0.0 {
            return Err(invalid(
                "force-length width and optimal fiber length must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ModelError {
    ModelError::Configuration(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ModelParameters::default().validate().unwrap();
    }

    #[test]
    fn optimal_fiber_length_is_rest_minus_tendon() {
        let p = ModelParameters::default();
        approx::assert_abs_diff_eq!(p.optimal_fiber_length(), 9.8, epsilon = 1e-12);
    }

    #[test]
    fn rejects_non_positive_time_constants() {
        let p = ModelParameters {
            t_act: 0.0,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(ModelError::Configuration(_))));

        let p = ModelParameters {
            t_deact: -0.04,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(ModelError::Configuration(_))));
    }

    #[test]
    fn rejects_zero_inertia() {
        let p = ModelParameters {
            inertia: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_lengthening_v_max() {
        let p = ModelParameters {
            v_max: 0.9,
            ..Default::default()
        };
        let err = p.validate().unwrap_err().to_string();
        assert!(err.contains("v_max"), "unexpected message: {}", err);
    }

    #[test]
    fn rejects_non_finite_values() {
        let p = ModelParameters {
            gravity: f64::NAN,
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let mut p = ModelParameters::default();
        p.elastic[2] = f64::INFINITY;
        assert!(p.validate().is_err());
    }

    #[test]
    fn published_bracket_vanishes_at_time_constant_ratio() {
        let p = ModelParameters::default();
        let u = p.t_act / (p.t_act + p.t_deact);
        approx::assert_abs_diff_eq!(
            ActivationLaw::Published.bracket(u, p.t_act, p.t_deact),
            0.0,
            epsilon = 1e-12
        );
        assert!(ActivationLaw::Published.bracket(0.0, p.t_act, p.t_deact) < 0.0);
    }

    #[test]
    fn relaxing_bracket_is_positive_on_unit_interval() {
        let p = ModelParameters::default();
        for i in 0..=10 {
            let u = i as f64 / 10.0;
            assert!(ActivationLaw::Relaxing.bracket(u, p.t_act, p.t_deact) > 0.0);
        }
    }

    #[test]
    fn elastic_coefficients_have_no_sign_constraint() {
        let p = ModelParameters {
            elastic: [-1.0, 2.0, 3.0, -4.0, 5.0],
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }
}
