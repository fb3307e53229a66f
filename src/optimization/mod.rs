pub mod callback;
pub mod clock;
pub mod problem;
pub mod progress;
pub mod solvers;
pub mod timer_stop;

pub use callback::{CallbackSet, NoCallback, OptimizationCallback};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use problem::FnProblem;
pub use progress::{ProgressLog, StoreBest};
pub use solvers::{GradientDescent, ParticleOptimizer, Problem, Solver, select_solver};
pub use timer_stop::{TimerStop, TimerStopConfig, UnarmedPolicy};
