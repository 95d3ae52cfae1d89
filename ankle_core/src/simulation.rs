// ankle_core/src/simulation.rs

//! Forward simulation over `[0, sim_time]`.

use nalgebra::{Matrix3xX, Vector3};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ModelError, ModelResult};
use crate::models::ankle_foot::AnkleFootModel;
use crate::models::Dynamics;
use crate::params::ModelParameters;
use crate::sampler::{ExcitationSeries, ExternalSeries, SampleClock, SignalSampler};
use crate::types::{to_dynamic, to_fixed, AnkleState, State};
use crate::utils::adaptive::{Dopri5, Solution, SolverOptions, SolverStats};
use crate::utils::integrators::{Integrator, RK1, RK4};

/// Integration scheme used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// Adaptive Dormand-Prince 5(4).
    #[default]
    Dopri5,
    /// Classic Runge-Kutta with a fixed step of `max_step`.
    Rk4,
    /// Forward Euler with a fixed step of `max_step`.
    Euler,
}

/// Solver-chosen evaluation times and the state at each of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    /// One column per time: rows are activation, angle, angular velocity.
    pub states: Matrix3xX<f64>,
    pub stats: SolverStats,
}

impl Trajectory {
    fn from_solution(solution: Solution) -> Self {
        let columns: Vec<Vector3<f64>> = solution.states.iter().map(to_fixed).collect();
        Self {
            times: solution.times,
            states: Matrix3xX::from_columns(&columns),
            stats: solution.stats,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn state(&self, i: usize) -> AnkleState {
        self.states.column(i).into_owned()
    }

    pub fn final_state(&self) -> AnkleState {
        self.state(self.len() - 1)
    }

    pub fn activation(&self) -> Vec<f64> {
        self.states.row(0).iter().copied().collect()
    }

    pub fn angle(&self) -> Vec<f64> {
        self.states.row(1).iter().copied().collect()
    }

    pub fn velocity(&self) -> Vec<f64> {
        self.states.row(2).iter().copied().collect()
    }
}

/// One simulation run: parameters, input series and solver settings.
#[derive(Debug, Clone)]
pub struct Simulation {
    excitation: ExcitationSeries,
    external: ExternalSeries,
    params: ModelParameters,
    clock: SampleClock,
    method: SolverMethod,
    options: SolverOptions,
}

impl Simulation {
    pub fn new(excitation: ExcitationSeries, external: ExternalSeries) -> Self {
        Self {
            excitation,
            external,
            params: ModelParameters::default(),
            clock: SampleClock::default(),
            method: SolverMethod::default(),
            options: SolverOptions::default(),
        }
    }

    pub fn with_params(mut self, params: ModelParameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_clock(mut self, clock: SampleClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_method(mut self, method: SolverMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Integrates from `initial_state` at `t = 0` up to `sim_time`.
    ///
    /// # Errors
    /// * `Configuration` for bad parameters, options, horizon or initial state,
    ///   and for input series that do not cover the horizon.
    /// * `InputBounds` if a lookup still falls outside a series.
    /// * `Integration` if the solver cannot advance or produces non-finite values.
    pub fn run(&self, initial_state: &[f64], sim_time: f64) -> ModelResult<Trajectory> {
        if initial_state.len() != 3 {
            return Err(ModelError::Configuration(format!(
                "initial state needs 3 entries (activation, angle, velocity), got {}",
                initial_state.len()
            )));
        }
        if let Some(v) = initial_state.iter().find(|v| !v.is_finite()) {
            return Err(ModelError::Configuration(format!(
                "initial state must be finite, got {}",
                v
            )));
        }
        if !sim_time.is_finite() || sim_time <= 0.0 {
            return Err(ModelError::Configuration(format!(
                "sim_time must be finite and positive, got {}",
                sim_time
            )));
        }
        self.options.validate()?;

        let sampler =
            SignalSampler::new(self.excitation.clone(), self.external.clone(), self.clock);
        sampler.check_horizon(sim_time)?;
        let model = AnkleFootModel::new(self.params.clone(), sampler)?;

        info!(
            sim_time,
            method = ?self.method,
            max_step = self.options.max_step,
            samples_per_unit = self.clock.samples_per_unit(),
            "starting ankle-foot simulation"
        );

        let x0 = to_dynamic(&AnkleState::from_column_slice(initial_state));
        let solution = match self.method {
            SolverMethod::Dopri5 => {
                Dopri5::new(self.options.clone()).solve(&model, &x0, 0.0, sim_time)?
            }
            SolverMethod::Rk4 => fixed_step(&model, &RK4, &x0, sim_time, &self.options)?,
            SolverMethod::Euler => fixed_step(&model, &RK1, &x0, sim_time, &self.options)?,
        };

        let trajectory = Trajectory::from_solution(solution);
        info!(
            points = trajectory.len(),
            accepted = trajectory.stats.accepted_steps,
            rejected = trajectory.stats.rejected_steps,
            "simulation finished"
        );
        Ok(trajectory)
    }
}

/// Steps of exactly `max_step`, the last one shortened to land on `sim_time`.
fn fixed_step(
    model: &AnkleFootModel,
    integrator: &dyn Integrator<f64>,
    x0: &State,
    sim_time: f64,
    options: &SolverOptions,
) -> ModelResult<Solution> {
    let dt = options.max_step;
    let mut steps = ((sim_time / dt).ceil() as usize).max(1);
    // Rounding in the division can add a step of zero length.
    if (steps - 1) as f64 * dt >= sim_time {
        steps -= 1;
    }
    if steps > options.max_steps {
        return Err(ModelError::Configuration(format!(
            "fixed step {} needs {} steps, more than max_steps = {}",
            dt, steps, options.max_steps
        )));
    }

    let mut times = Vec::with_capacity(steps + 1);
    let mut states = Vec::with_capacity(steps + 1);
    let mut t = 0.0;
    let mut x = x0.clone();
    times.push(t);
    states.push(x.clone());

    for i in 1..=steps {
        let t_next = (i as f64 * dt).min(sim_time);
        let x_next = model.propagate(&x, t, t_next - t, integrator)?;
        if x_next.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Integration {
                time: t,
                state: x.iter().copied().collect(),
                reason: "non-finite state produced".to_string(),
            });
        }
        t = t_next;
        x = x_next;
        times.push(t);
        states.push(x.clone());
    }

    Ok(Solution {
        times,
        states,
        stats: SolverStats {
            accepted_steps: steps,
            rejected_steps: 0,
            evaluations: steps * integrator.stages(),
        },
    })
}

/// Runs the model with default parameters, unit sample clock and the
/// adaptive solver capped at a step of 0.001.
pub fn simulate(
    excitation: ExcitationSeries,
    external: ExternalSeries,
    initial_state: &[f64],
    sim_time: f64,
) -> ModelResult<Trajectory> {
    Simulation::new(excitation, external).run(initial_state, sim_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs(u: f64, len: usize) -> (ExcitationSeries, ExternalSeries) {
        (
            ExcitationSeries::constant(u, len),
            ExternalSeries::flat(len, SampleClock::default()),
        )
    }

    #[test]
    fn trajectory_spans_horizon() {
        let (u, ext) = inputs(0.2, 2);
        let traj = simulate(u, ext, &[0.0, -0.26, 0.0], 0.05).unwrap();
        assert_eq!(traj.times[0], 0.0);
        assert_eq!(*traj.times.last().unwrap(), 0.05);
        assert_eq!(traj.states.ncols(), traj.len());
        assert_eq!(traj.state(0), AnkleState::new(0.0, -0.26, 0.0));
        assert_eq!(traj.activation().len(), traj.len());
    }

    #[test]
    fn rejects_bad_initial_state_and_horizon() {
        let (u, ext) = inputs(0.2, 2);
        let sim = Simulation::new(u, ext);
        assert!(matches!(sim.run(&[0.0, 0.0], 0.1), Err(ModelError::Configuration(_))));
        assert!(matches!(
            sim.run(&[0.0, f64::NAN, 0.0], 0.1),
            Err(ModelError::Configuration(_))
        ));
        assert!(matches!(sim.run(&[0.0, 0.0, 0.0], 0.0), Err(ModelError::Configuration(_))));
        assert!(matches!(sim.run(&[0.0, 0.0, 0.0], -1.0), Err(ModelError::Configuration(_))));
    }

    #[test]
    fn short_series_fail_before_integrating() {
        let clock = SampleClock::new(1000.0).unwrap();
        let sim = Simulation::new(
            ExcitationSeries::constant(0.2, 50),
            ExternalSeries::flat(50, clock),
        )
        .with_clock(clock);
        assert!(matches!(
            sim.run(&[0.0, 0.0, 0.0], 0.1),
            Err(ModelError::Configuration(_))
        ));
        assert!(sim.run(&[0.0, 0.0, 0.0], 0.049).is_ok());
    }

    #[test]
    fn fixed_step_methods_land_on_horizon() {
        for method in [SolverMethod::Rk4, SolverMethod::Euler] {
            let (u, ext) = inputs(0.5, 2);
            let traj = Simulation::new(u, ext)
                .with_method(method)
                .with_options(SolverOptions::default().with_max_step(0.003))
                .run(&[0.0, 0.0, 0.0], 0.01)
                .unwrap();
            assert_eq!(traj.len(), 5);
            assert_relative_eq!(*traj.times.last().unwrap(), 0.01);
            assert_eq!(traj.stats.rejected_steps, 0);
        }
    }

    #[test]
    fn rk4_agrees_with_adaptive_solver_on_activation() {
        let run = |method| {
            let (u, ext) = inputs(1.0, 2);
            Simulation::new(u, ext)
                .with_method(method)
                .with_options(SolverOptions::default().with_max_step(1e-4))
                .run(&[0.0, 0.0, 0.0], 0.02)
                .unwrap()
                .final_state()[0]
        };
        let exact = 1.0 - (-2.0f64).exp();
        assert_relative_eq!(run(SolverMethod::Rk4), exact, max_relative = 1e-6);
        assert_relative_eq!(run(SolverMethod::Dopri5), exact, max_relative = 1e-4);
    }
}
