// ankle_core/src/utils/adaptive.rs

//! Dormand-Prince 5(4) adaptive explicit Runge-Kutta integration.
//!
//! Seven stages with the FSAL property: the derivative at the end of an
//! accepted step is reused as the first stage of the next one. The local
//! error estimate is the difference between the embedded 4th and the
//! propagating 5th order solutions, measured in a weighted RMS norm.
//!
//! # References
//! - Dormand, J. R., & Prince, P. J. (1980). "A family of embedded
//!   Runge-Kutta formulae". Journal of Computational and Applied
//!   Mathematics, 6(1), 19-26.
//! - Hairer, E., Nørsett, S. P., & Wanner, G. (1993). "Solving Ordinary
//!   Differential Equations I", section II.4 (starting step size).

use std::cell::Cell;

use tracing::{debug, trace};

use crate::error::{ModelError, ModelResult};
use crate::models::Dynamics;
use crate::types::State;

// Butcher tableau
const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

#[rustfmt::skip]
const A: [&[f64]; 6] = [
    &[],
    &[1.0/5.0],
    &[3.0/40.0, 9.0/40.0],
    &[44.0/45.0, -56.0/15.0, 32.0/9.0],
    &[19372.0/6561.0, -25360.0/2187.0, 64448.0/6561.0, -212.0/729.0],
    &[9017.0/3168.0, -355.0/33.0, 46732.0/5247.0, 49.0/176.0, -5103.0/18656.0],
];

// 5th order weights
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

// Difference between the 5th and the embedded 4th order weights, FSAL stage last.
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

const ERROR_EXPONENT: f64 = -1.0 / 5.0;
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Step control settings for the adaptive solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Relative tolerance (default: 1e-3).
    pub rtol: f64,
    /// Absolute tolerance (default: 1e-6).
    pub atol: f64,
    /// Hard upper bound on the step size (default: 0.001).
    pub max_step: f64,
    /// Initial step size. `None` selects one from the derivative at `t0`.
    pub first_step: Option<f64>,
    /// Maximum number of accepted steps (default: 10_000_000).
    pub max_steps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_step: 1e-3,
            first_step: None,
            max_steps: 10_000_000,
        }
    }
}

impl SolverOptions {
    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    pub fn with_first_step(mut self, first_step: f64) -> Self {
        self.first_step = Some(first_step);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn validate(&self) -> ModelResult<()> {
        let invalid = |msg: String| Err(ModelError::Configuration(msg));
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return invalid(format!("rtol must be finite and > 0, got {}", self.rtol));
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return invalid(format!("atol must be finite and > 0, got {}", self.atol));
        }
        if !self.max_step.is_finite() || self.max_step <= 0.0 {
            return invalid(format!(
                "max_step must be finite and > 0, got {}",
                self.max_step
            ));
        }
        if let Some(h) = self.first_step {
            if !h.is_finite() || h <= 0.0 || h > self.max_step {
                return invalid(format!(
                    "first_step must be in (0, max_step], got {}",
                    h
                ));
            }
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be > 0".to_string());
        }
        Ok(())
    }
}

/// Work counters for one integration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// States at every accepted step, starting with the initial condition.
#[derive(Debug, Clone)]
pub struct Solution {
    pub times: Vec<f64>,
    pub states: Vec<State>,
    pub stats: SolverStats,
}

#[derive(Debug, Clone, Default)]
pub struct Dopri5 {
    pub options: SolverOptions,
}

impl Dopri5 {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    /// Integrates `dynamics` from `(t0, x0)` to `t_end`.
    ///
    /// The output grid is whatever the step controller chose; consecutive
    /// times are never further apart than `max_step`.
    pub fn solve(
        &self,
        dynamics: &dyn Dynamics,
        x0: &State,
        t0: f64,
        t_end: f64,
    ) -> ModelResult<Solution> {
        let opts = &self.options;
        opts.validate()?;
        if !t0.is_finite() || !t_end.is_finite() || t_end < t0 {
            return Err(ModelError::Configuration(format!(
                "integration interval [{}, {}] is invalid",
                t0, t_end
            )));
        }

        let evaluations = Cell::new(0usize);
        let mut eval = |t: f64, x: &State| -> ModelResult<State> {
            evaluations.set(evaluations.get() + 1);
            dynamics.get_derivatives(x, t)
        };

        let mut t = t0;
        let mut x = x0.clone();
        let mut times = vec![t];
        let mut states = vec![x.clone()];

        if t_end == t0 {
            return Ok(Solution {
                times,
                states,
                stats: SolverStats::default(),
            });
        }

        let mut f = eval(t, &x)?;
        ensure_finite(&f, t, &x, "derivative at initial state")?;

        let mut h = match opts.first_step {
            Some(h) => h,
            None => initial_step(&mut eval, t, &x, &f, t_end - t0, opts)?,
        }
        .min(opts.max_step);

        let mut accepted = 0usize;
        let mut rejected = 0usize;

        while t < t_end {
            if accepted >= opts.max_steps {
                return Err(failure(
                    t,
                    &x,
                    format!("exceeded max_steps = {} before t_end = {}", opts.max_steps, t_end),
                ));
            }

            let mut step_rejected = false;
            let (t_new, x_new, f_new, h_next) = loop {
                let min_step = 10.0 * spacing(t);
                if h < min_step {
                    return Err(failure(
                        t,
                        &x,
                        format!("step size {:e} fell below the minimum {:e}", h, min_step),
                    ));
                }

                let t_new = (t + h).min(t_end);
                let h_step = t_new - t;
                let (x_new, f_new, error) = self.attempt(&mut eval, t, &x, &f, h_step)?;

                if !error.is_finite() || x_new.iter().any(|v| !v.is_finite()) {
                    return Err(failure(t, &x, "non-finite state produced".to_string()));
                }

                if error < 1.0 {
                    let mut factor = if error == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * error.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                    };
                    if step_rejected {
                        factor = factor.min(1.0);
                    }
                    break (t_new, x_new, f_new, h_step * factor);
                }

                h = h_step * (SAFETY * error.powf(ERROR_EXPONENT)).max(MIN_FACTOR);
                step_rejected = true;
                rejected += 1;
                trace!(t, error, h, "step rejected");
            };

            ensure_finite(&f_new, t_new, &x_new, "derivative")?;

            t = t_new;
            x = x_new;
            f = f_new;
            h = h_next.min(opts.max_step);
            accepted += 1;

            times.push(t);
            states.push(x.clone());
        }

        let stats = SolverStats {
            accepted_steps: accepted,
            rejected_steps: rejected,
            evaluations: evaluations.get(),
        };
        debug!(
            accepted = stats.accepted_steps,
            rejected = stats.rejected_steps,
            evaluations = stats.evaluations,
            "dopri5 finished"
        );

        Ok(Solution {
            times,
            states,
            stats,
        })
    }

    /// One trial step of size `h`. Returns the 5th order solution, its
    /// derivative (the next step's first stage) and the scaled error norm.
    fn attempt(
        &self,
        eval: &mut dyn FnMut(f64, &State) -> ModelResult<State>,
        t: f64,
        x: &State,
        f: &State,
        h: f64,
    ) -> ModelResult<(State, State, f64)> {
        let mut k: Vec<State> = Vec::with_capacity(7);
        k.push(f.clone());

        for stage in 1..6 {
            let mut dx = State::zeros(x.len());
            for (j, &a) in A[stage].iter().enumerate() {
                dx.axpy(a, &k[j], 1.0);
            }
            let x_stage = x + h * dx;
            k.push(eval(t + C[stage] * h, &x_stage)?);
        }

        let mut dx = State::zeros(x.len());
        for (j, &b) in B.iter().enumerate() {
            dx.axpy(b, &k[j], 1.0);
        }
        let x_new = x + h * dx;
        let f_new = eval(t + h, &x_new)?;
        k.push(f_new.clone());

        let mut err = State::zeros(x.len());
        for (j, &e) in E.iter().enumerate() {
            err.axpy(e, &k[j], 1.0);
        }
        err *= h;

        let opts = &self.options;
        let scaled = err.zip_zip_map(x, &x_new, |e, a, b| {
            e / (opts.atol + a.abs().max(b.abs()) * opts.rtol)
        });

        Ok((x_new, f_new, rms(&scaled)))
    }
}

/// Starting step from the size of the state, its derivative and an
/// estimate of the second derivative.
fn initial_step(
    eval: &mut dyn FnMut(f64, &State) -> ModelResult<State>,
    t0: f64,
    x0: &State,
    f0: &State,
    span: f64,
    opts: &SolverOptions,
) -> ModelResult<f64> {
    let scale = x0.map(|v| opts.atol + v.abs() * opts.rtol);
    let d0 = rms(&x0.component_div(&scale));
    let d1 = rms(&f0.component_div(&scale));

    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    // The trial evaluation must stay inside the integration interval.
    let h0 = h0.min(span);

    let x1 = x0 + h0 * f0;
    let f1 = eval(t0 + h0, &x1)?;
    let d2 = rms(&(f1 - f0).component_div(&scale)) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / 5.0)
    };

    Ok((100.0 * h0).min(h1).min(span))
}

fn rms(v: &State) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    (v.norm_squared() / v.len() as f64).sqrt()
}

/// Distance from `t` to the next representable float above it.
fn spacing(t: f64) -> f64 {
    if t == 0.0 {
        return f64::MIN_POSITIVE;
    }
    let next = f64::from_bits(t.abs().to_bits() + 1);
    next - t.abs()
}

fn failure(t: f64, x: &State, reason: String) -> ModelError {
    ModelError::Integration {
        time: t,
        state: x.iter().copied().collect(),
        reason,
    }
}

fn ensure_finite(v: &State, t: f64, x: &State, what: &str) -> ModelResult<()> {
    if v.iter().all(|e| e.is_finite()) {
        Ok(())
    } else {
        Err(failure(t, x, format!("non-finite {}", what)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StateVariable;
    use approx::assert_relative_eq;

    /// Closed-form test systems.
    #[derive(Debug)]
    enum TestSystem {
        Decay(f64),
        Oscillator,
        Blowup,
        FailsAfter(f64),
        /// `x' = -rate * x`, undefined past `horizon`.
        SlowDrift { rate: f64, horizon: f64 },
    }

    impl Dynamics for TestSystem {
        fn get_state_layout(&self) -> Vec<StateVariable> {
            match self {
                TestSystem::Oscillator => {
                    vec![StateVariable::AnkleAngle, StateVariable::AngularVelocity]
                }
                _ => vec![StateVariable::Activation],
            }
        }

        fn get_derivatives(&self, x: &State, t: f64) -> ModelResult<State> {
            match self {
                TestSystem::Decay(rate) => Ok(-*rate * x),
                TestSystem::Oscillator => Ok(State::from_vec(vec![x[1], -x[0]])),
                TestSystem::Blowup => Ok(x.map(|v| v * v)),
                TestSystem::FailsAfter(limit) => {
                    if t > *limit {
                        Err(ModelError::Configuration(format!("no input at {}", t)))
                    } else {
                        Ok(State::zeros(1))
                    }
                }
                TestSystem::SlowDrift { rate, horizon } => {
                    if t > *horizon {
                        Err(ModelError::Configuration(format!("no input at {}", t)))
                    } else {
                        Ok(-*rate * x)
                    }
                }
            }
        }
    }

    #[test]
    fn exponential_decay_within_tolerance() {
        let solver = Dopri5::new(SolverOptions::default().with_tolerances(1e-8, 1e-10));
        let x0 = State::from_vec(vec![1.0]);
        let sol = solver.solve(&TestSystem::Decay(25.0), &x0, 0.0, 0.1).unwrap();

        assert_eq!(sol.times[0], 0.0);
        assert_eq!(*sol.times.last().unwrap(), 0.1);
        for (t, x) in sol.times.iter().zip(&sol.states) {
            assert_relative_eq!(x[0], (-25.0 * t).exp(), max_relative = 1e-6);
        }
    }

    #[test]
    fn step_never_exceeds_max_step() {
        let solver = Dopri5::new(SolverOptions::default().with_max_step(0.01));
        let x0 = State::from_vec(vec![1.0, 0.0]);
        let sol = solver.solve(&TestSystem::Oscillator, &x0, 0.0, 1.0).unwrap();

        assert!(sol.times.windows(2).all(|w| w[1] > w[0]));
        assert!(sol.times.windows(2).all(|w| w[1] - w[0] <= 0.01 + 1e-15));
        assert!(sol.stats.accepted_steps >= 100);
        assert_eq!(sol.times.len(), sol.stats.accepted_steps + 1);
        let last = sol.states.last().unwrap();
        assert_relative_eq!(last[0], 1.0f64.cos(), epsilon = 1e-4);
        assert_relative_eq!(last[1], -1.0f64.sin(), epsilon = 1e-4);
    }

    #[test]
    fn harmonic_oscillator_full_period() {
        let solver = Dopri5::new(
            SolverOptions::default()
                .with_tolerances(1e-9, 1e-12)
                .with_max_step(0.1),
        );
        let x0 = State::from_vec(vec![1.0, 0.0]);
        let period = 2.0 * std::f64::consts::PI;
        let sol = solver.solve(&TestSystem::Oscillator, &x0, 0.0, period).unwrap();
        let last = sol.states.last().unwrap();
        assert_relative_eq!(last[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(last[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_length_interval_returns_initial_state() {
        let x0 = State::from_vec(vec![2.0]);
        let sol = Dopri5::default()
            .solve(&TestSystem::Decay(1.0), &x0, 0.0, 0.0)
            .unwrap();
        assert_eq!(sol.times, vec![0.0]);
        assert_eq!(sol.states[0][0], 2.0);
        assert_eq!(sol.stats.evaluations, 0);
    }

    #[test]
    fn finite_time_blowup_is_integration_failure() {
        // x' = x^2 with x(0) = 1 blows up at t = 1.
        let x0 = State::from_vec(vec![1.0]);
        let solver = Dopri5::new(SolverOptions::default().with_max_step(0.1));
        match solver.solve(&TestSystem::Blowup, &x0, 0.0, 2.0) {
            Err(ModelError::Integration { time, state, .. }) => {
                assert!(time < 1.0 + 1e-6, "failed late at t = {}", time);
                assert!(state.iter().all(|v| v.is_finite()));
            }
            other => panic!("expected integration failure, got {:?}", other),
        }
    }

    #[test]
    fn derivative_errors_propagate_unchanged() {
        let x0 = State::from_vec(vec![0.0]);
        let result = Dopri5::default().solve(&TestSystem::FailsAfter(0.05), &x0, 0.0, 0.1);
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn starting_step_never_looks_past_the_interval() {
        // A nearly stationary start makes the raw starting-step guess
        // (0.01 * |x| / |x'|) about 100 time units long.
        let system = TestSystem::SlowDrift {
            rate: 1e-4,
            horizon: 0.1,
        };
        let x0 = State::from_vec(vec![1.0]);
        let sol = Dopri5::default().solve(&system, &x0, 0.0, 0.1).unwrap();

        assert_eq!(*sol.times.last().unwrap(), 0.1);
        assert_relative_eq!(sol.states.last().unwrap()[0], (-1e-5f64).exp(), max_relative = 1e-9);
    }

    #[test]
    fn max_steps_exhaustion_is_reported() {
        let solver = Dopri5::new(SolverOptions::default().with_max_steps(5));
        let x0 = State::from_vec(vec![1.0]);
        let result = solver.solve(&TestSystem::Decay(1.0), &x0, 0.0, 1.0);
        assert!(matches!(result, Err(ModelError::Integration { .. })));
    }

    #[test]
    fn options_are_validated() {
        let x0 = State::from_vec(vec![1.0]);
        for opts in [
            SolverOptions::default().with_tolerances(0.0, 1e-6),
            SolverOptions::default().with_tolerances(1e-3, f64::NAN),
            SolverOptions::default().with_max_step(-1.0),
            SolverOptions::default().with_first_step(0.5),
            SolverOptions::default().with_max_steps(0),
        ] {
            let result = Dopri5::new(opts).solve(&TestSystem::Decay(1.0), &x0, 0.0, 1.0);
            assert!(matches!(result, Err(ModelError::Configuration(_))));
        }
    }

    #[test]
    fn reversed_interval_is_rejected() {
        let x0 = State::from_vec(vec![1.0]);
        let result = Dopri5::default().solve(&TestSystem::Decay(1.0), &x0, 1.0, 0.0);
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn spacing_matches_float_resolution() {
        assert_eq!(spacing(1.0), f64::EPSILON);
        assert!(spacing(0.0) > 0.0);
        assert_eq!(spacing(-2.0), 2.0 * f64::EPSILON);
    }
}
