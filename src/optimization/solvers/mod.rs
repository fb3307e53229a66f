mod gradient_descent;
mod particle;
pub mod traits;

pub use gradient_descent::GradientDescent;
pub use particle::ParticleOptimizer;
pub use traits::{Problem, Solver};

#[inline]
pub(crate) fn clamp_to_bounds(params: &mut [f64], bounds: &[(f64, f64)]) {
    for (x, &(min, max)) in params.iter_mut().zip(bounds) {
        *x = x.clamp(min, max);
    }
}

/// Pick a solver from the shape of the problem.
///
/// Unbounded problems can only use gradient descent. Bounded ones with up
/// to 8 parameters get a swarm sized to the dimension; larger ones fall back
/// to gradient descent, which scales better with the dimension.
pub fn select_solver(
    bounds: &[(f64, f64)],
    max_epochs: usize,
    precision: f64,
    seed: Option<u64>,
) -> (Box<dyn Solver>, String) {
    let num_params = bounds.len();
    let bounded = bounds
        .iter()
        .all(|&(min, max)| min.is_finite() && max.is_finite());

    match (num_params, bounded) {
        (n, true) if n <= 8 => {
            // Scale population: 10-30 particles
            let pop_size = (10 + n * 3).min(30);
            let mut pso = ParticleOptimizer::new(max_epochs, precision).with_population_size(pop_size);
            if let Some(seed) = seed {
                pso = pso.with_seed(seed);
            }
            (
                Box::new(pso),
                format!("Auto: {n} bounded params → PSO (pop={pop_size})"),
            )
        }
        (n, true) => (
            Box::new(GradientDescent::new(max_epochs, precision)),
            format!("Auto: large problem ({n} params) → gradient descent"),
        ),
        (n, false) => (
            Box::new(GradientDescent::new(max_epochs, precision)),
            format!("Auto: unbounded problem ({n} params) → gradient descent"),
        ),
    }
}
