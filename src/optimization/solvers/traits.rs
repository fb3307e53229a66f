use crate::core::{Result, SolverResult};
use crate::optimization::callback::OptimizationCallback;

/// Objective being minimized.
///
/// `Sync` because population-based solvers evaluate candidates in parallel.
pub trait Problem: Sync {
    /// Evaluate the objective at `params`.
    fn cost(&self, params: &[f64]) -> Result<f64>;

    /// Starting point.
    fn initial_params(&self) -> &[f64];

    /// Parameter bounds (min, max) for each parameter
    fn bounds(&self) -> &[(f64, f64)];

    fn num_params(&self) -> usize {
        self.initial_params().len()
    }

    /// Gradient at `params`, written into `grad`.
    ///
    /// Defaults to central finite differences (two cost evaluations per
    /// parameter).
    fn gradient(&self, params: &[f64], grad: &mut [f64]) -> Result<()> {
        let h = 1e-6;
        let mut probe = params.to_vec();

        for i in 0..params.len() {
            probe[i] = params[i] + h;
            let c_plus = self.cost(&probe)?;

            probe[i] = params[i] - h;
            let c_minus = self.cost(&probe)?;

            probe[i] = params[i];
            grad[i] = (c_plus - c_minus) / (2.0 * h);
        }

        Ok(())
    }
}

/// An optimizer loop.
pub trait Solver {
    fn name(&self) -> &str;

    /// Minimize `problem`, driving `callback` through the run's lifecycle.
    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult>;
}

// ============================================================================
// EPOCH LOOP CONTRACT
// ============================================================================
//
// Every solver drives its callback the same way, so any mix of callbacks can
// be registered without the solver knowing about them:
//
//    let mut control = Control::new();
//    callback.begin_optimization(&mut control, problem, &params);
//
//    for epoch in 0..self.max_epochs {
//        callback.begin_epoch(&mut control, problem, &params, epoch, cost);
//
//        // update params; call callback.evaluate() after each cost
//        // evaluation at the current point and callback.step_taken()
//        // after each update
//
//        callback.end_epoch(&mut control, problem, &params, epoch, cost);
//        if control.terminate_requested() {
//            // return StopReason::Terminated with the params of this epoch
//        }
//
//        // solver-specific convergence tests
//    }
//
//    callback.end_optimization(&mut control, problem, &params);
//
// NOTES:
//    - end_optimization runs on every exit path, including errors raised by
//      the problem.
//    - The flag is also honoured after begin_optimization and begin_epoch;
//      in that case the epoch is not counted.
//    - Callbacks are invoked on the solver's thread only. Parallel work
//      inside an epoch must finish before the next hook.
//
// ============================================================================
