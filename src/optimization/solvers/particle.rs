use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::clamp_to_bounds;
use super::traits::{Problem, Solver};
use crate::core::{Control, Error, Result, SolverResult, StopReason};
use crate::optimization::callback::OptimizationCallback;

const MAX_STAGNATION: u32 = 5;

/// Particle Swarm Optimization for noisy, non-convex problems.
///
/// One epoch moves and re-evaluates the whole swarm. Particles are evaluated
/// in parallel; callbacks only ever see the global best.
pub struct ParticleOptimizer {
    max_epochs: usize,
    precision: f64,
    population_size: usize,
    inertia: f64,   // w - velocity inertia weight
    cognitive: f64, // c1 - personal best influence
    social: f64,    // c2 - global best influence
    target_cost: Option<f64>,
    seed: Option<u64>,
}

impl ParticleOptimizer {
    /// `precision` is the smallest improvement of the global best that
    /// counts as progress.
    pub fn new(max_epochs: usize, precision: f64) -> Self {
        Self {
            max_epochs,
            precision,
            population_size: 20,
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            target_cost: None,
            seed: None,
        }
    }

    /// Configure swarm size (default: 20)
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Configure PSO parameters (defaults: w=0.7, c1=1.5, c2=1.5)
    pub fn with_pso_params(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Stop as converged once the best cost is at or below `target`.
    pub fn with_target_cost(mut self, target: f64) -> Self {
        self.target_cost = Some(target);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self, bounds: &[(f64, f64)]) -> Result<()> {
        if self.max_epochs == 0 {
            return Err(Error::invalid("max_epochs must be at least 1"));
        }
        if self.population_size < 2 {
            return Err(Error::invalid(format!(
                "swarm needs at least 2 particles, got {}",
                self.population_size
            )));
        }
        for (i, &(min, max)) in bounds.iter().enumerate() {
            if !min.is_finite() || !max.is_finite() {
                return Err(Error::invalid(format!(
                    "PSO needs finite bounds, parameter {i} is unbounded"
                )));
            }
            if min > max {
                return Err(Error::invalid(format!(
                    "parameter {i}: invalid bounds ({min}, {max})"
                )));
            }
            // Sampling and velocity limits work on the width.
            if !(max - min).is_finite() {
                return Err(Error::invalid(format!(
                    "parameter {i}: bounds ({min}, {max}) are too wide to sample"
                )));
            }
        }
        Ok(())
    }

    /// First particle is the provided initial guess, the rest are uniform
    /// within bounds.
    fn initialize_particles(&self, rng: &mut StdRng, bounds: &[(f64, f64)], initial: &[f64]) -> Vec<Vec<f64>> {
        let mut particles = Vec::with_capacity(self.population_size);
        particles.push(initial.to_vec());

        for _ in 1..self.population_size {
            particles.push(bounds.iter().map(|&(min, max)| rng.gen_range(min..=max)).collect());
        }

        particles
    }

    /// Velocities start at a small fraction of each parameter's range.
    fn initialize_velocities(&self, rng: &mut StdRng, bounds: &[(f64, f64)]) -> Vec<Vec<f64>> {
        (0..self.population_size)
            .map(|_| {
                bounds
                    .iter()
                    .map(|&(min, max)| {
                        let range = max - min;
                        rng.gen_range(-range * 0.1..=range * 0.1)
                    })
                    .collect()
            })
            .collect()
    }

    fn run(
        &self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
        control: &mut Control,
        best: &mut Vec<f64>,
    ) -> Result<SolverResult> {
        let bounds = problem.bounds();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut particles = self.initialize_particles(&mut rng, bounds, best);
        let mut velocities = self.initialize_velocities(&mut rng, bounds);
        let mut personal_best_positions = particles.clone();
        let mut personal_best_costs = vec![f64::INFINITY; self.population_size];

        let mut best_cost = problem.cost(best)?;
        let mut cost_evals = 1;
        callback.evaluate(control, problem, best, best_cost);

        let finish = |reason, cost, epochs, params: &[f64], cost_evals| SolverResult {
            reason,
            cost,
            epochs,
            params: params.to_vec(),
            cost_evals,
            grad_evals: 0,
        };

        if control.terminate_requested() {
            return Ok(finish(StopReason::Terminated, best_cost, 0, best.as_slice(), cost_evals));
        }

        let mut stagnation_counter = 0;

        for epoch in 0..self.max_epochs {
            callback.begin_epoch(control, problem, best, epoch, best_cost);
            if control.terminate_requested() {
                return Ok(finish(StopReason::Terminated, best_cost, epoch, best.as_slice(), cost_evals));
            }

            if epoch > 0 {
                self.move_swarm(&mut rng, &mut particles, &mut velocities, &personal_best_positions, best, bounds);
                callback.step_taken(control, problem, best);
            }

            // Evaluate all particles
            let costs = particles
                .par_iter()
                .map(|p| problem.cost(p))
                .collect::<Result<Vec<f64>>>()?;
            cost_evals += costs.len();

            let prev_best_cost = best_cost;
            for (p, &cost) in costs.iter().enumerate() {
                if cost < personal_best_costs[p] {
                    personal_best_costs[p] = cost;
                    personal_best_positions[p].copy_from_slice(&particles[p]);
                }
                if cost < best_cost {
                    best_cost = cost;
                    best.copy_from_slice(&particles[p]);
                }
            }
            callback.evaluate(control, problem, best, best_cost);

            callback.end_epoch(control, problem, best, epoch, best_cost);
            if control.terminate_requested() {
                return Ok(finish(StopReason::Terminated, best_cost, epoch + 1, best.as_slice(), cost_evals));
            }

            if self.target_cost.is_some_and(|target| best_cost <= target) {
                return Ok(finish(StopReason::Converged, best_cost, epoch + 1, best.as_slice(), cost_evals));
            }

            if prev_best_cost - best_cost < self.precision {
                stagnation_counter += 1;
                if stagnation_counter >= MAX_STAGNATION {
                    return Ok(finish(StopReason::Stagnated, best_cost, epoch + 1, best.as_slice(), cost_evals));
                }
            } else {
                stagnation_counter = 0;
            }
        }

        Ok(finish(
            StopReason::MaxEpochs,
            best_cost,
            self.max_epochs,
            best.as_slice(),
            cost_evals,
        ))
    }

    /// Velocity and position update for every particle.
    fn move_swarm(
        &self,
        rng: &mut StdRng,
        particles: &mut [Vec<f64>],
        velocities: &mut [Vec<f64>],
        personal_best_positions: &[Vec<f64>],
        global_best: &[f64],
        bounds: &[(f64, f64)],
    ) {
        for ((particle, velocity), personal_best) in particles
            .iter_mut()
            .zip(velocities.iter_mut())
            .zip(personal_best_positions)
        {
            for i in 0..particle.len() {
                let r1 = rng.gen_range(0.0..1.0);
                let r2 = rng.gen_range(0.0..1.0);

                velocity[i] = self.inertia * velocity[i]
                    + self.cognitive * r1 * (personal_best[i] - particle[i])
                    + self.social * r2 * (global_best[i] - particle[i]);

                // Clamp velocity to fraction of search space
                let (min, max) = bounds[i];
                let v_max = (max - min) * 0.2;
                velocity[i] = velocity[i].clamp(-v_max, v_max);

                particle[i] += velocity[i];
            }

            clamp_to_bounds(particle, bounds);
        }
    }
}

impl Solver for ParticleOptimizer {
    fn name(&self) -> &str {
        "PSO"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult> {
        self.validate(problem.bounds())?;

        let mut control = Control::new();
        let mut best = problem.initial_params().to_vec();
        clamp_to_bounds(&mut best, problem.bounds());

        callback.begin_optimization(&mut control, problem, &best);
        let outcome = self.run(problem, callback, &mut control, &mut best);
        callback.end_optimization(&mut control, problem, &best);

        outcome
    }
}
