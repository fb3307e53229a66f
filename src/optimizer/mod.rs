use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{Result, SolverResult};
use crate::optimization::{
    CallbackSet, Clock, GradientDescent, MonotonicClock, NoCallback, OptimizationCallback,
    ParticleOptimizer, Problem, ProgressLog, Solver, TimerStopConfig, select_solver,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Chosen from the problem's dimension and bounds.
    #[default]
    Auto,
    Gradient,
    Pso,
}

/// Run configuration: which solver to use and which stock callbacks to
/// register around it.
///
/// ```json
/// {
///   "solver": "pso",
///   "max_epochs": 500,
///   "timer": { "timeout_secs": 30.0 },
///   "progress_every": 10
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Optimizer {
    pub solver: SolverKind,
    pub max_epochs: usize,
    pub precision: f64,
    /// Wall-clock limit for the whole run.
    pub timer: Option<TimerStopConfig>,
    /// Log every n-th epoch when set.
    pub progress_every: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self {
            solver: SolverKind::Auto,
            max_epochs: 1000,
            precision: 1e-6,
            timer: None,
            progress_every: None,
            seed: None,
        }
    }
}

impl Optimizer {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn optimize(&self, problem: &dyn Problem) -> Result<SolverResult> {
        self.optimize_with(problem, NoCallback)
    }

    /// Run with an extra callback registered after the configured ones.
    pub fn optimize_with(
        &self,
        problem: &dyn Problem,
        callback: impl OptimizationCallback,
    ) -> Result<SolverResult> {
        self.optimize_with_clock(problem, MonotonicClock::new(), callback)
    }

    /// Like [`optimize_with`](Self::optimize_with), timing the run on `clock`.
    pub fn optimize_with_clock<C: Clock>(
        &self,
        problem: &dyn Problem,
        clock: C,
        callback: impl OptimizationCallback,
    ) -> Result<SolverResult> {
        let mut callbacks = CallbackSet::new();
        if let Some(timer) = &self.timer {
            callbacks.push(timer.build_with_clock(clock)?);
        }
        if let Some(every) = self.progress_every {
            callbacks.push(ProgressLog::new(every));
        }
        callbacks.push(callback);

        let mut solver = self.build_solver(problem.bounds());
        info!(
            solver = solver.name(),
            max_epochs = self.max_epochs,
            timeout_secs = ?self.timer.map(|t| t.timeout_secs),
            "optimization start"
        );

        let result = solver.solve(problem, &mut callbacks)?;

        info!(
            reason = %result.reason,
            cost = result.cost,
            epochs = result.epochs,
            cost_evals = result.cost_evals,
            grad_evals = result.grad_evals,
            "optimization complete"
        );
        Ok(result)
    }

    fn build_solver(&self, bounds: &[(f64, f64)]) -> Box<dyn Solver> {
        match self.solver {
            SolverKind::Gradient => Box::new(GradientDescent::new(self.max_epochs, self.precision)),
            SolverKind::Pso => {
                let mut pso = ParticleOptimizer::new(self.max_epochs, self.precision);
                if let Some(seed) = self.seed {
                    pso = pso.with_seed(seed);
                }
                Box::new(pso)
            }
            SolverKind::Auto => {
                let (solver, reason) =
                    select_solver(bounds, self.max_epochs, self.precision, self.seed);
                info!("{reason}");
                solver
            }
        }
    }
}
