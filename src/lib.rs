//! Callback-driven termination for iterative optimizers.
//!
//! Solvers drive an [`OptimizationCallback`] through a fixed set of lifecycle
//! hooks and stop once any callback raises the termination flag on the
//! loop's [`Control`]. [`TimerStop`] uses this to end a run after a
//! wall-clock timeout.

mod core;
mod optimization;
mod optimizer;

pub use self::core::*;
pub use optimization::*;
pub use optimizer::{Optimizer, SolverKind};
