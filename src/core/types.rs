use serde::Serialize;

// ===== LOOP CONTROL =====

/// Control state owned by an optimizer loop for the duration of one run.
///
/// The termination flag is the only thing a callback may change. It can be
/// raised but never lowered; a new run starts from a new `Control`.
#[derive(Debug, Default)]
pub struct Control {
    terminate: bool,
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop after the current hook returns.
    pub fn request_termination(&mut self) {
        self.terminate = true;
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate
    }
}

// ===== RESULTS =====

/// Why a solver returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Converged,
    Stagnated,
    /// A callback raised the termination flag.
    Terminated,
    MaxEpochs,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Converged => "Converged",
            Self::Stagnated => "Stagnated",
            Self::Terminated => "Terminated by callback",
            Self::MaxEpochs => "Max epochs reached",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SolverResult {
    pub reason: StopReason,
    pub cost: f64,
    /// Number of completed epochs.
    pub epochs: usize,
    pub params: Vec<f64>,
    pub cost_evals: usize,
    pub grad_evals: usize,
}

impl SolverResult {
    /// True when the run ended on its own convergence test.
    pub fn success(&self) -> bool {
        self.reason == StopReason::Converged
    }
}

/// One entry of an optimization history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationResult {
    pub epoch: usize,
    pub params: Vec<f64>,
    pub cost: f64,
}
