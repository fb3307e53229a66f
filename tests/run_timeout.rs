//! Whole runs stopped by the timeout policy, timed on a simulated clock that
//! advances with every objective evaluation.

use std::time::Duration;

use epochstop::{
    CallbackSet, Clock, FnProblem, GradientDescent, ManualClock, Optimizer, ParticleOptimizer, Problem,
    Solver, StopReason, StoreBest, TimerStop,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("epochstop=debug")
        .with_test_writer()
        .try_init();
}

/// `f(x) = x` on an unbounded line: never converges, each evaluation costs
/// `per_eval` of simulated time.
fn endless_line(clock: &ManualClock, per_eval: Duration) -> FnProblem<impl Fn(&[f64]) -> f64 + Sync> {
    let tick = clock.clone();
    FnProblem::unbounded(vec![0.0], move |x: &[f64]| {
        tick.advance(per_eval);
        x[0]
    })
}

fn timed_sphere(clock: &ManualClock, per_eval: Duration) -> FnProblem<impl Fn(&[f64]) -> f64 + Sync> {
    let tick = clock.clone();
    FnProblem::new(vec![4.0, 4.0], vec![(-5.0, 5.0), (-5.0, 5.0)], move |x: &[f64]| {
        tick.advance(per_eval);
        x[0] * x[0] + x[1] * x[1]
    })
    .expect("valid problem")
}

#[test]
fn gradient_descent_stops_at_the_first_epoch_past_the_timeout() {
    init_tracing();
    let clock = ManualClock::new();
    let problem = endless_line(&clock, Duration::from_millis(100));
    let mut timer = TimerStop::with_clock(1.0, clock.clone()).unwrap();
    let mut store = StoreBest::new();

    // Initial evaluation, then 3 evaluations per epoch (two for the
    // gradient, one accepted line search step): epochs end at 0.4s, 0.7s
    // and 1.0s.
    let result = {
        let mut callbacks = CallbackSet::new().with(&mut timer).with(&mut store);
        GradientDescent::new(1000, 1e-9)
            .solve(&problem, &mut callbacks)
            .unwrap()
    };

    assert_eq!(result.reason, StopReason::Terminated);
    assert_eq!(result.epochs, 3);
    assert_eq!(result.cost_evals, 4);
    assert_eq!(result.grad_evals, 3);
    assert!(timer.fired());

    // Final coordinates are those of the last completed epoch.
    let last = store.history().last().unwrap();
    assert_eq!(last.epoch, 2);
    assert_eq!(last.params, result.params);
    assert_eq!(store.history().len(), result.epochs);
}

#[test]
fn pso_run_is_cut_short_by_the_timer() {
    init_tracing();
    let clock = ManualClock::new();
    let problem = timed_sphere(&clock, Duration::from_millis(10));
    let initial = problem.cost(problem.initial_params()).unwrap();
    clock.set(Duration::ZERO);

    let mut timer = TimerStop::with_clock(1.0, clock.clone()).unwrap();
    let mut solver = ParticleOptimizer::new(10_000, 1e-300)
        .with_population_size(20)
        .with_seed(3);

    // 0.01s initial evaluation plus 0.2s per epoch of 20 particles.
    let result = solver.solve(&problem, &mut timer).unwrap();

    assert_eq!(result.reason, StopReason::Terminated);
    assert_eq!(result.epochs, 5);
    assert_eq!(result.cost_evals, 101);
    assert!(result.cost <= initial);
}

#[test]
fn timer_that_never_fires_leaves_the_run_alone() {
    let clock = ManualClock::new();
    let problem = FnProblem::unbounded(vec![2.0], |x: &[f64]| (x[0] - 1.0).powi(2));
    let mut timer = TimerStop::with_clock(60.0, clock.clone()).unwrap();

    let result = GradientDescent::new(500, 1e-6).solve(&problem, &mut timer).unwrap();

    assert_eq!(result.reason, StopReason::Converged);
    assert!(timer.is_armed());
    assert!(!timer.fired());
}

#[test]
fn solver_rearms_nothing_between_epochs() {
    // The solver calls begin_epoch every epoch; the timer must still measure
    // from the start of the run.
    let clock = ManualClock::new();
    let problem = endless_line(&clock, Duration::from_millis(100));
    let mut timer = TimerStop::with_clock(0.35, clock.clone()).unwrap();

    let result = GradientDescent::new(1000, 1e-9).solve(&problem, &mut timer).unwrap();

    assert_eq!(result.reason, StopReason::Terminated);
    assert_eq!(result.epochs, 1);
    assert_eq!(timer.elapsed(), Some(Duration::from_millis(400)));
}

#[test]
fn reset_timer_can_observe_a_second_run() {
    let clock = ManualClock::new();
    let problem = endless_line(&clock, Duration::from_millis(100));
    let mut timer = TimerStop::with_clock(1.0, clock.clone()).unwrap();

    let first = GradientDescent::new(1000, 1e-9).solve(&problem, &mut timer).unwrap();
    assert_eq!(first.reason, StopReason::Terminated);

    timer.reset();
    let second = GradientDescent::new(1000, 1e-9).solve(&problem, &mut timer).unwrap();
    assert_eq!(second.reason, StopReason::Terminated);
    assert_eq!(second.epochs, first.epochs);
}

#[test]
fn configured_optimizer_applies_the_timeout() {
    init_tracing();
    let clock = ManualClock::new();
    let problem = endless_line(&clock, Duration::from_millis(100));
    let optimizer = Optimizer::from_json_str(
        r#"{
            "solver": "gradient",
            "precision": 1e-9,
            "timer": { "timeout_secs": 1.0 },
            "progress_every": 1
        }"#,
    )
    .unwrap();

    let mut store = StoreBest::new();
    let result = optimizer
        .optimize_with_clock(&problem, clock.clone(), &mut store)
        .unwrap();

    assert_eq!(result.reason, StopReason::Terminated);
    assert_eq!(result.epochs, 3);
    assert_eq!(store.history().len(), 3);
}

#[test]
fn configured_optimizer_rejects_a_zero_timeout_before_running() {
    let clock = ManualClock::new();
    let problem = endless_line(&clock, Duration::from_millis(100));
    let optimizer = Optimizer::from_json_str(r#"{"timer": {"timeout_secs": 0}}"#).unwrap();

    let err = optimizer
        .optimize_with_clock(&problem, clock.clone(), StoreBest::new())
        .unwrap_err();

    assert!(matches!(err, epochstop::Error::InvalidConfiguration(_)));
    assert_eq!(clock.now(), Duration::ZERO);
}

#[test]
fn optimizer_without_timer_is_never_terminated() {
    let problem = FnProblem::new(vec![0.5], vec![(-2.0, 2.0)], |x: &[f64]| (x[0] + 1.0).powi(2))
        .unwrap();
    let optimizer = Optimizer {
        max_epochs: 500,
        seed: Some(11),
        ..Optimizer::default()
    };

    let result = optimizer.optimize(&problem).unwrap();

    assert_ne!(result.reason, StopReason::Terminated);
    assert!(result.epochs >= 1);
    assert!(result.cost <= 2.25);
    assert!((-2.0..=2.0).contains(&result.params[0]));
}
