use tracing::debug;

use super::clamp_to_bounds;
use super::traits::{Problem, Solver};
use crate::core::{Control, Error, Result, SolverResult, StopReason};
use crate::optimization::callback::OptimizationCallback;

const MAX_BACKTRACKS: usize = 10;

/// Gradient descent with Armijo line search and learning rate adaptation
pub struct GradientDescent {
    max_epochs: usize,
    precision: f64,
    learning_rate: f64,
    min_learning_rate: f64,
    max_learning_rate: f64,
    armijo_c: f64,         // Armijo condition parameter
    backtrack_factor: f64, // Line search backtracking
    increase_factor: f64,  // Learning rate increase when successful
}

impl GradientDescent {
    /// `precision` is the gradient norm below which the run has converged.
    pub fn new(max_epochs: usize, precision: f64) -> Self {
        Self {
            max_epochs,
            precision,
            learning_rate: 0.1,
            min_learning_rate: 1e-6,
            max_learning_rate: 1.0,
            armijo_c: 1e-4,
            backtrack_factor: 0.5,
            increase_factor: 1.2,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_epochs == 0 {
            return Err(Error::invalid("max_epochs must be at least 1"));
        }
        if !(self.precision > 0.0) {
            return Err(Error::invalid(format!(
                "precision must be positive, got {}",
                self.precision
            )));
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::invalid(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Armijo line search with backtracking.
    ///
    /// Returns the accepted step, or `None` when no step satisfied the
    /// sufficient decrease condition.
    fn line_search(
        &self,
        problem: &dyn Problem,
        params: &[f64],
        gradient: &[f64],
        current_cost: f64,
        learning_rate: f64,
        cost_evals: &mut usize,
    ) -> Result<Option<Step>> {
        let bounds = problem.bounds();
        let grad_norm_sq: f64 = gradient.iter().map(|&g| g * g).sum();
        let mut alpha = learning_rate;
        let mut candidate = params.to_vec();

        for _ in 0..MAX_BACKTRACKS {
            for ((c, &p), &g) in candidate.iter_mut().zip(params).zip(gradient) {
                *c = p - alpha * g;
            }
            clamp_to_bounds(&mut candidate, bounds);

            let new_cost = problem.cost(&candidate)?;
            *cost_evals += 1;

            // Armijo condition: sufficient decrease
            if new_cost <= current_cost - self.armijo_c * alpha * grad_norm_sq {
                return Ok(Some(Step {
                    params: candidate,
                    cost: new_cost,
                    backtracked: alpha < learning_rate,
                }));
            }

            alpha *= self.backtrack_factor;
            if alpha < self.min_learning_rate {
                break;
            }
        }

        Ok(None)
    }

    /// Trial step size for the next epoch. Three full-length steps in a row
    /// grow it; a backtracked step restarts the count.
    fn next_learning_rate(&self, learning_rate: f64, backtracked: bool, streak: &mut u32) -> f64 {
        if backtracked {
            *streak = 0;
            return learning_rate;
        }
        *streak += 1;
        if *streak >= 3 {
            (learning_rate * self.increase_factor).min(self.max_learning_rate)
        } else {
            learning_rate
        }
    }

    fn run(
        &self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
        control: &mut Control,
        params: &mut Vec<f64>,
    ) -> Result<SolverResult> {
        let mut gradient = vec![0.0; params.len()];
        let mut learning_rate = self.learning_rate;
        let mut full_steps = 0;
        let mut evals = Evals::default();

        let mut cost = problem.cost(params)?;
        evals.cost += 1;
        callback.evaluate(control, problem, params, cost);

        if control.terminate_requested() {
            return Ok(evals.finish(StopReason::Terminated, cost, 0, params));
        }

        for epoch in 0..self.max_epochs {
            callback.begin_epoch(control, problem, params, epoch, cost);
            if control.terminate_requested() {
                return Ok(evals.finish(StopReason::Terminated, cost, epoch, params));
            }

            problem.gradient(params, &mut gradient)?;
            evals.grad += 1;
            let grad_norm = gradient.iter().map(|&g| g * g).sum::<f64>().sqrt();
            let converged = grad_norm < self.precision;

            let mut stalled = false;
            let mut backtracked = false;
            if !converged {
                match self.line_search(problem, params, &gradient, cost, learning_rate, &mut evals.cost)? {
                    Some(step) => {
                        *params = step.params;
                        cost = step.cost;
                        backtracked = step.backtracked;
                        callback.step_taken(control, problem, params);
                        callback.evaluate(control, problem, params, cost);
                    }
                    None => {
                        debug!(epoch, grad_norm, "line search found no descent step");
                        stalled = true;
                    }
                }
            }

            callback.end_epoch(control, problem, params, epoch, cost);
            if control.terminate_requested() {
                return Ok(evals.finish(StopReason::Terminated, cost, epoch + 1, params));
            }
            if converged {
                return Ok(evals.finish(StopReason::Converged, cost, epoch + 1, params));
            }
            if stalled {
                return Ok(evals.finish(StopReason::Stagnated, cost, epoch + 1, params));
            }

            learning_rate = self.next_learning_rate(learning_rate, backtracked, &mut full_steps);
        }

        Ok(evals.finish(StopReason::MaxEpochs, cost, self.max_epochs, params))
    }
}

struct Step {
    params: Vec<f64>,
    cost: f64,
    backtracked: bool,
}

#[derive(Default)]
struct Evals {
    cost: usize,
    grad: usize,
}

impl Evals {
    fn finish(&self, reason: StopReason, cost: f64, epochs: usize, params: &[f64]) -> SolverResult {
        SolverResult {
            reason,
            cost,
            epochs,
            params: params.to_vec(),
            cost_evals: self.cost,
            grad_evals: self.grad,
        }
    }
}

impl Solver for GradientDescent {
    fn name(&self) -> &str {
        "GradientDescent"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult> {
        self.validate()?;

        let mut control = Control::new();
        let mut params = problem.initial_params().to_vec();
        clamp_to_bounds(&mut params, problem.bounds());

        callback.begin_optimization(&mut control, problem, &params);
        let outcome = self.run(problem, callback, &mut control, &mut params);
        callback.end_optimization(&mut control, problem, &params);

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::callback::NoCallback;
    use crate::optimization::problem::FnProblem;
    use approx::assert_abs_diff_eq;

    #[test]
    fn converges_on_a_quadratic() {
        let problem = FnProblem::unbounded(vec![3.0, -2.0], |x: &[f64]| {
            (x[0] - 1.0).powi(2) + 2.0 * (x[1] + 0.5).powi(2)
        });
        let mut solver = GradientDescent::new(500, 1e-6);

        let result = solver.solve(&problem, &mut NoCallback).unwrap();

        assert_eq!(result.reason, StopReason::Converged);
        assert_abs_diff_eq!(result.params[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(result.params[1], -0.5, epsilon = 1e-4);
        assert!(result.grad_evals >= 1);
    }

    #[test]
    fn respects_bounds() {
        let problem = FnProblem::new(vec![0.0], vec![(-1.0, 1.0)], |x: &[f64]| (x[0] - 5.0).powi(2))
            .unwrap();
        let mut solver = GradientDescent::new(200, 1e-8);

        let result = solver.solve(&problem, &mut NoCallback).unwrap();

        assert!(result.params[0] <= 1.0);
        assert_abs_diff_eq!(result.params[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn stops_at_max_epochs() {
        let problem = FnProblem::unbounded(vec![10.0], |x: &[f64]| x[0] * x[0]);
        let mut solver = GradientDescent::new(2, 1e-12).with_learning_rate(1e-3);

        let result = solver.solve(&problem, &mut NoCallback).unwrap();

        assert_eq!(result.reason, StopReason::MaxEpochs);
        assert_eq!(result.epochs, 2);
    }

    #[test]
    fn learning_rate_grows_only_after_three_full_steps_in_a_row() {
        let solver = GradientDescent::new(10, 1e-6);
        let mut streak = 0;

        let lr = solver.next_learning_rate(0.1, false, &mut streak);
        let lr = solver.next_learning_rate(lr, false, &mut streak);
        assert_eq!(lr, 0.1);

        // A backtracked step restarts the count.
        let lr = solver.next_learning_rate(lr, true, &mut streak);
        assert_eq!(streak, 0);
        let lr = solver.next_learning_rate(lr, false, &mut streak);
        let lr = solver.next_learning_rate(lr, false, &mut streak);
        assert_eq!(lr, 0.1);

        let lr = solver.next_learning_rate(lr, false, &mut streak);
        assert_abs_diff_eq!(lr, 0.12, epsilon = 1e-12);
        let lr = solver.next_learning_rate(lr, false, &mut streak);
        assert_abs_diff_eq!(lr, 0.144, epsilon = 1e-12);
    }

    #[test]
    fn growth_is_capped_at_the_max_learning_rate() {
        let solver = GradientDescent::new(10, 1e-6);
        let mut streak = 5;
        assert_eq!(solver.next_learning_rate(0.95, false, &mut streak), 1.0);
    }

    #[test]
    fn zero_epochs_is_invalid() {
        let problem = FnProblem::unbounded(vec![0.0], |x: &[f64]| x[0]);
        let err = GradientDescent::new(0, 1e-6).solve(&problem, &mut NoCallback).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn objective_errors_propagate() {
        let problem = FnProblem::unbounded(vec![1.0], |x: &[f64]| if x[0] < 0.9 { f64::NAN } else { x[0] });
        let err = GradientDescent::new(50, 1e-9)
            .with_learning_rate(1.0)
            .solve(&problem, &mut NoCallback)
            .unwrap_err();
        assert!(matches!(err, Error::Objective(_)));
    }
}
