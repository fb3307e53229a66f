//! Lifecycle hooks an optimizer loop invokes on its observers.
//!
//! Every hook has a no-op default, so a callback implements only the events
//! it cares about and can be registered next to callbacks that implement a
//! different subset. Hooks cannot fail: the only way to influence the loop
//! is [`Control::request_termination`].

use super::solvers::traits::Problem;
use crate::core::Control;

/// Observer of an optimization run.
///
/// The loop calls hooks synchronously on its own thread. Implementations
/// must return promptly and must not spawn background work.
pub trait OptimizationCallback {
    /// Once, before the first epoch.
    fn begin_optimization(
        &mut self,
        _control: &mut Control,
        _problem: &dyn Problem,
        _coordinates: &[f64],
    ) {
    }

    /// Once, after the last epoch, whatever the stop reason.
    fn end_optimization(
        &mut self,
        _control: &mut Control,
        _problem: &dyn Problem,
        _coordinates: &[f64],
    ) {
    }

    /// At the start of every epoch.
    fn begin_epoch(
        &mut self,
        _control: &mut Control,
        _problem: &dyn Problem,
        _coordinates: &[f64],
        _epoch: usize,
        _objective: f64,
    ) {
    }

    /// After every completed epoch. The loop checks the termination flag
    /// right after this hook.
    fn end_epoch(
        &mut self,
        _control: &mut Control,
        _problem: &dyn Problem,
        _coordinates: &[f64],
        _epoch: usize,
        _objective: f64,
    ) {
    }

    /// After each objective evaluation at the loop's current point.
    fn evaluate(
        &mut self,
        _control: &mut Control,
        _problem: &dyn Problem,
        _coordinates: &[f64],
        _objective: f64,
    ) {
    }

    /// After each coordinate update.
    fn step_taken(&mut self, _control: &mut Control, _problem: &dyn Problem, _coordinates: &[f64]) {}
}

/// Callback that observes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCallback;

impl OptimizationCallback for NoCallback {}

impl<C: OptimizationCallback + ?Sized> OptimizationCallback for &mut C {
    fn begin_optimization(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        (**self).begin_optimization(control, problem, coordinates)
    }

    fn end_optimization(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        (**self).end_optimization(control, problem, coordinates)
    }

    fn begin_epoch(
        &mut self,
        control: &mut Control,
        problem: &dyn Problem,
        coordinates: &[f64],
        epoch: usize,
        objective: f64,
    ) {
        (**self).begin_epoch(control, problem, coordinates, epoch, objective)
    }

    fn end_epoch(
        &mut self,
        control: &mut Control,
        problem: &dyn Problem,
        coordinates: &[f64],
        epoch: usize,
        objective: f64,
    ) {
        (**self).end_epoch(control, problem, coordinates, epoch, objective)
    }

    fn evaluate(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64], objective: f64) {
        (**self).evaluate(control, problem, coordinates, objective)
    }

    fn step_taken(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        (**self).step_taken(control, problem, coordinates)
    }
}

impl<C: OptimizationCallback + ?Sized> OptimizationCallback for Box<C> {
    fn begin_optimization(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        (**self).begin_optimization(control, problem, coordinates)
    }

    fn end_optimization(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        (**self).end_optimization(control, problem, coordinates)
    }

    fn begin_epoch(
        &mut self,
        control: &mut Control,
        problem: &dyn Problem,
        coordinates: &[f64],
        epoch: usize,
        objective: f64,
    ) {
        (**self).begin_epoch(control, problem, coordinates, epoch, objective)
    }

    fn end_epoch(
        &mut self,
        control: &mut Control,
        problem: &dyn Problem,
        coordinates: &[f64],
        epoch: usize,
        objective: f64,
    ) {
        (**self).end_epoch(control, problem, coordinates, epoch, objective)
    }

    fn evaluate(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64], objective: f64) {
        (**self).evaluate(control, problem, coordinates, objective)
    }

    fn step_taken(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        (**self).step_taken(control, problem, coordinates)
    }
}

/// Ordered chain of callbacks driven as one.
///
/// Every hook reaches every member in registration order, including after an
/// earlier member has requested termination.
#[derive(Default)]
pub struct CallbackSet<'a> {
    callbacks: Vec<Box<dyn OptimizationCallback + 'a>>,
}

impl<'a> CallbackSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, callback: impl OptimizationCallback + 'a) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn with(mut self, callback: impl OptimizationCallback + 'a) -> Self {
        self.push(callback);
        self
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl OptimizationCallback for CallbackSet<'_> {
    fn begin_optimization(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        for cb in &mut self.callbacks {
            cb.begin_optimization(control, problem, coordinates);
        }
    }

    fn end_optimization(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        for cb in &mut self.callbacks {
            cb.end_optimization(control, problem, coordinates);
        }
    }

    fn begin_epoch(
        &mut self,
        control: &mut Control,
        problem: &dyn Problem,
        coordinates: &[f64],
        epoch: usize,
        objective: f64,
    ) {
        for cb in &mut self.callbacks {
            cb.begin_epoch(control, problem, coordinates, epoch, objective);
        }
    }

    fn end_epoch(
        &mut self,
        control: &mut Control,
        problem: &dyn Problem,
        coordinates: &[f64],
        epoch: usize,
        objective: f64,
    ) {
        for cb in &mut self.callbacks {
            cb.end_epoch(control, problem, coordinates, epoch, objective);
        }
    }

    fn evaluate(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64], objective: f64) {
        for cb in &mut self.callbacks {
            cb.evaluate(control, problem, coordinates, objective);
        }
    }

    fn step_taken(&mut self, control: &mut Control, problem: &dyn Problem, coordinates: &[f64]) {
        for cb in &mut self.callbacks {
            cb.step_taken(control, problem, coordinates);
        }
    }
}
