use tracing::info;

use super::callback::OptimizationCallback;
use super::solvers::traits::Problem;
use crate::core::{Control, IterationResult};

/// Logs optimization progress through `tracing`.
pub struct ProgressLog {
    every: usize,
    epochs: usize,
    last_objective: Option<f64>,
}

impl ProgressLog {
    /// Log every `every`-th epoch (at least every epoch).
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            epochs: 0,
            last_objective: None,
        }
    }

    /// Epochs observed so far.
    pub fn epochs(&self) -> usize {
        self.epochs
    }
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::new(1)
    }
}

impl OptimizationCallback for ProgressLog {
    fn begin_optimization(&mut self, _control: &mut Control, problem: &dyn Problem, _coordinates: &[f64]) {
        self.epochs = 0;
        self.last_objective = None;
        info!(num_params = problem.num_params(), "optimization started");
    }

    fn end_epoch(
        &mut self,
        _control: &mut Control,
        _problem: &dyn Problem,
        _coordinates: &[f64],
        epoch: usize,
        objective: f64,
    ) {
        self.epochs += 1;
        self.last_objective = Some(objective);
        if epoch % self.every == 0 {
            info!(epoch, objective, "epoch complete");
        }
    }

    fn end_optimization(&mut self, control: &mut Control, _problem: &dyn Problem, coordinates: &[f64]) {
        info!(
            epochs = self.epochs,
            objective = ?self.last_objective,
            terminated = control.terminate_requested(),
            params = ?coordinates,
            "optimization finished"
        );
    }
}

/// Keeps the iteration history and the best point seen at epoch ends.
#[derive(Debug, Default)]
pub struct StoreBest {
    history: Vec<IterationResult>,
    best: Option<IterationResult>,
}

impl StoreBest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get iteration history
    pub fn history(&self) -> &[IterationResult] {
        &self.history
    }

    pub fn best(&self) -> Option<&IterationResult> {
        self.best.as_ref()
    }
}

impl OptimizationCallback for StoreBest {
    fn begin_optimization(&mut self, _control: &mut Control, _problem: &dyn Problem, _coordinates: &[f64]) {
        self.history.clear();
        self.best = None;
    }

    fn end_epoch(
        &mut self,
        _control: &mut Control,
        _problem: &dyn Problem,
        coordinates: &[f64],
        epoch: usize,
        objective: f64,
    ) {
        let record = IterationResult {
            epoch,
            params: coordinates.to_vec(),
            cost: objective,
        };
        if self.best.as_ref().is_none_or(|b| objective < b.cost) {
            self.best = Some(record.clone());
        }
        self.history.push(record);
    }
}
