//! Wall-clock timeout for an optimization run.
//!
//! [`TimerStop`] starts its timer on the first `begin_optimization` or
//! `begin_epoch` hook and, at every `end_epoch`, raises the loop's
//! termination flag once the run has been going for at least the configured
//! timeout. It never clears the flag and never interrupts an epoch.
//!
//! One instance serves one run. Reusing it requires [`TimerStop::reset`];
//! concurrent runs each need their own instance.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::callback::OptimizationCallback;
use super::clock::{Clock, MonotonicClock};
use super::solvers::traits::Problem;
use crate::core::{Control, Error, Result};

/// What `end_epoch` does when no begin hook has armed the timer yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnarmedPolicy {
    /// Do nothing until a begin hook arms the timer.
    #[default]
    Ignore,
    /// Start the timer at that `end_epoch`. The arming call never fires.
    ArmOnEpochEnd,
}

/// Terminates an optimization after a fixed amount of elapsed time.
#[derive(Debug)]
pub struct TimerStop<C: Clock = MonotonicClock> {
    timeout: Duration,
    unarmed: UnarmedPolicy,
    clock: C,
    // Some once armed; never overwritten until reset.
    start: Option<Duration>,
    reported: bool,
}

impl TimerStop<MonotonicClock> {
    /// Timeout of `timeout_secs` seconds measured on the process clock.
    pub fn new(timeout_secs: f64) -> Result<Self> {
        Self::with_clock(timeout_secs, MonotonicClock::new())
    }
}

impl<C: Clock> TimerStop<C> {
    pub fn with_clock(timeout_secs: f64, clock: C) -> Result<Self> {
        Ok(Self {
            timeout: validate_timeout(timeout_secs)?,
            unarmed: UnarmedPolicy::default(),
            clock,
            start: None,
            reported: false,
        })
    }

    pub fn with_unarmed_policy(mut self, policy: UnarmedPolicy) -> Self {
        self.unarmed = policy;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn unarmed_policy(&self) -> UnarmedPolicy {
        self.unarmed
    }

    pub fn is_armed(&self) -> bool {
        self.start.is_some()
    }

    /// Time since the timer was armed, or `None` before that.
    pub fn elapsed(&self) -> Option<Duration> {
        self.start.map(|start| self.clock.elapsed_since(start))
    }

    /// True once the timeout has been reported for the current run.
    pub fn fired(&self) -> bool {
        self.reported
    }

    /// Forget the current run so the policy can observe a new one.
    pub fn reset(&mut self) {
        self.start = None;
        self.reported = false;
    }

    fn arm(&mut self) {
        if self.start.is_none() {
            let now = self.clock.now();
            debug!(
                timeout_secs = self.timeout.as_secs_f64(),
                "timer armed"
            );
            self.start = Some(now);
        }
    }

    fn check(&mut self, control: &mut Control, epoch: usize) {
        let Some(start) = self.start else {
            if self.unarmed == UnarmedPolicy::ArmOnEpochEnd {
                self.arm();
            }
            return;
        };

        let elapsed = self.clock.elapsed_since(start);
        if elapsed < self.timeout {
            return;
        }

        control.request_termination();
        if !self.reported {
            info!(
                epoch,
                elapsed_secs = elapsed.as_secs_f64(),
                timeout_secs = self.timeout.as_secs_f64(),
                "Timer timeout reached; terminate optimization."
            );
            self.reported = true;
        }
    }
}

impl<C: Clock> OptimizationCallback for TimerStop<C> {
    fn begin_optimization(&mut self, _control: &mut Control, _problem: &dyn Problem, _coordinates: &[f64]) {
        self.arm();
    }

    fn begin_epoch(
        &mut self,
        _control: &mut Control,
        _problem: &dyn Problem,
        _coordinates: &[f64],
        _epoch: usize,
        _objective: f64,
    ) {
        self.arm();
    }

    fn end_epoch(
        &mut self,
        control: &mut Control,
        _problem: &dyn Problem,
        _coordinates: &[f64],
        epoch: usize,
        _objective: f64,
    ) {
        self.check(control, epoch);
    }
}

/// Any positive timeout is accepted. Values below a nanosecond round up to
/// one, values beyond `Duration`'s range (including infinity) never fire.
fn validate_timeout(timeout_secs: f64) -> Result<Duration> {
    // Also rejects NaN.
    if !(timeout_secs > 0.0) {
        return Err(Error::invalid(format!(
            "timeout must be a positive number of seconds, got {timeout_secs}"
        )));
    }
    let timeout = Duration::try_from_secs_f64(timeout_secs).unwrap_or(Duration::MAX);
    Ok(timeout.max(Duration::from_nanos(1)))
}

/// Serializable form of a [`TimerStop`], as found in run configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimerStopConfig {
    pub timeout_secs: f64,
    #[serde(default)]
    pub unarmed: UnarmedPolicy,
}

impl TimerStopConfig {
    pub fn build(&self) -> Result<TimerStop> {
        self.build_with_clock(MonotonicClock::new())
    }

    pub fn build_with_clock<C: Clock>(&self, clock: C) -> Result<TimerStop<C>> {
        Ok(TimerStop::with_clock(self.timeout_secs, clock)?.with_unarmed_policy(self.unarmed))
    }
}
