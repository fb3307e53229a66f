use super::solvers::traits::Problem;
use crate::core::{Error, Result};

/// [`Problem`] backed by a plain closure.
pub struct FnProblem<F> {
    initial: Vec<f64>,
    bounds: Vec<(f64, f64)>,
    objective: F,
}

impl<F> FnProblem<F>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    /// Bounded problem. Each bound must satisfy `min <= max` and the initial
    /// point must lie inside them.
    pub fn new(initial: Vec<f64>, bounds: Vec<(f64, f64)>, objective: F) -> Result<Self> {
        if initial.is_empty() {
            return Err(Error::invalid("problem needs at least one parameter"));
        }
        if bounds.len() != initial.len() {
            return Err(Error::invalid(format!(
                "{} bounds given for {} parameters",
                bounds.len(),
                initial.len()
            )));
        }
        for (i, (&(min, max), &x)) in bounds.iter().zip(&initial).enumerate() {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(Error::invalid(format!(
                    "parameter {i}: invalid bounds ({min}, {max})"
                )));
            }
            if !(min..=max).contains(&x) {
                return Err(Error::invalid(format!(
                    "parameter {i}: initial value {x} outside ({min}, {max})"
                )));
            }
        }

        Ok(Self {
            initial,
            bounds,
            objective,
        })
    }

    /// Problem without bounds; not usable with population-based solvers.
    pub fn unbounded(initial: Vec<f64>, objective: F) -> Self {
        let bounds = vec![(f64::NEG_INFINITY, f64::INFINITY); initial.len()];
        Self {
            initial,
            bounds,
            objective,
        }
    }
}

impl<F> Problem for FnProblem<F>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    fn cost(&self, params: &[f64]) -> Result<f64> {
        let value = (self.objective)(params);
        if value.is_nan() {
            return Err(Error::Objective(format!("objective is NaN at {params:?}")));
        }
        Ok(value)
    }

    fn initial_params(&self) -> &[f64] {
        &self.initial
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }
}
