// ankle_core/src/utils/integrators.rs

//! Fixed-step explicit integrators.
//!
//! The right-hand side is fallible: a derivative evaluation that fails (for
//! instance an input lookup past the end of a series) aborts the step.

use nalgebra::DVector;

use crate::error::ModelResult;

/// Right-hand side `f(x, t)` as seen by the integrators.
pub type Derivative<'a, T> = &'a dyn Fn(&DVector<T>, T) -> ModelResult<DVector<T>>;

pub trait Integrator<T> {
    /// Advances `x0` from `t0` to `tf` in a single step.
    fn step(&self, func: Derivative<'_, T>, x0: &DVector<T>, t0: T, tf: T)
        -> ModelResult<DVector<T>>;

    /// Number of derivative evaluations per step.
    fn stages(&self) -> usize;
}

// Runge-Kutta methods
#[derive(Debug, Default, Clone, Copy)]
pub struct RK1;

impl<T> Integrator<T> for RK1
where
    T: Copy + std::ops::Mul<DVector<T>, Output = DVector<T>> + num_traits::Float,
    DVector<T>: std::ops::Add<Output = DVector<T>>,
{
    fn step(
        &self,
        func: Derivative<'_, T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> ModelResult<DVector<T>> {
        let dt: T = tf - t0;
        Ok(x0.clone() + dt * func(x0, t0)?) // Euler's method
    }

    fn stages(&self) -> usize {
        1
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RK4;

impl<T> Integrator<T> for RK4
where
    T: Copy + num_traits::Float + std::ops::Mul<DVector<T>, Output = DVector<T>>,
    DVector<T>: std::ops::Add<Output = DVector<T>>,
{
    fn step(
        &self,
        func: Derivative<'_, T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> ModelResult<DVector<T>> {
        let dt = tf - t0;
        let two = T::one() + T::one();
        let half = T::one() / two;
        let sixth = T::one() / (two + two + two);

        let k1 = func(x0, t0)?;
        let k2 = func(&(x0.clone() + half * dt * k1.clone()), t0 + half * dt)?;
        let k3 = func(&(x0.clone() + half * dt * k2.clone()), t0 + half * dt)?;
        let k4 = func(&(x0.clone() + dt * k3.clone()), tf)?;

        Ok(x0.clone() + dt * sixth * (k1 + two * k2 + two * k3 + k4))
    }

    fn stages(&self) -> usize {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use approx::assert_relative_eq;

    fn decay(x: &DVector<f64>, _t: f64) -> ModelResult<DVector<f64>> {
        Ok(-x)
    }

    fn integrate(integrator: &dyn Integrator<f64>, dt: f64, steps: usize) -> f64 {
        let mut x = DVector::from_vec(vec![1.0]);
        let mut t = 0.0;
        for _ in 0..steps {
            x = integrator.step(&decay, &x, t, t + dt).unwrap();
            t += dt;
        }
        x[0]
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        assert_relative_eq!(integrate(&RK4, 0.01, 100), (-1.0f64).exp(), max_relative = 1e-9);
    }

    #[test]
    fn euler_is_first_order() {
        let coarse = (integrate(&RK1, 0.01, 100) - (-1.0f64).exp()).abs();
        let fine = (integrate(&RK1, 0.005, 200) - (-1.0f64).exp()).abs();
        assert_relative_eq!(coarse / fine, 2.0, max_relative = 0.05);
    }

    #[test]
    fn derivative_failure_aborts_the_step() {
        let failing = |_x: &DVector<f64>, t: f64| -> ModelResult<DVector<f64>> {
            Err(ModelError::Configuration(format!("no data at {}", t)))
        };
        let x0 = DVector::from_vec(vec![1.0]);
        assert!(RK4.step(&failing, &x0, 0.0, 0.1).is_err());
        assert!(RK1.step(&failing, &x0, 0.0, 0.1).is_err());
    }
}
