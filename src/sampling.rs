//! # Sampling
//! Goal-biased candidate generation over the grid's coordinate ranges.
//!
use crate::common::Point;
use crate::occupancy_grid::OccupancyGrid;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

pub trait Sampler {
    fn sample(&mut self, grid: &OccupancyGrid, goal: &Point) -> Point;
}

/// Returns the goal with probability `goal_bias`, otherwise a point drawn
/// uniformly over `[0, rows - 1] x [0, cols - 1]`.
#[derive(Debug, Clone)]
pub struct GoalBiasedSampler<R: Rng = ChaChaRng> {
    goal_bias: f64,
    rng: R,
}

impl GoalBiasedSampler<ChaChaRng> {
    /// Seeded from `seed` when given, from OS entropy otherwise.
    pub fn from_seed(goal_bias: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaChaRng::seed_from_u64(s),
            None => ChaChaRng::from_entropy(),
        };
        Self::new(goal_bias, rng)
    }
}

impl<R: Rng> GoalBiasedSampler<R> {
    pub fn new(goal_bias: f64, rng: R) -> Self {
        Self {
            goal_bias: goal_bias.clamp(0.0, 1.0),
            rng,
        }
    }

    pub fn goal_bias(&self) -> f64 {
        self.goal_bias
    }
}

impl<R: Rng> Sampler for GoalBiasedSampler<R> {
    fn sample(&mut self, grid: &OccupancyGrid, goal: &Point) -> Point {
        if self.rng.gen_bool(self.goal_bias) {
            return *goal;
        }
        let row = self.rng.gen_range(0.0..=grid.max_row());
        let col = self.rng.gen_range(0.0..=grid.max_col());
        Point::new(row, col)
    }
}

/// Replays a fixed list of points, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedSampler {
    points: Vec<Point>,
    next: usize,
}

impl ScriptedSampler {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points, next: 0 }
    }
}

impl Sampler for ScriptedSampler {
    fn sample(&mut self, grid: &OccupancyGrid, goal: &Point) -> Point {
        if self.points.is_empty() {
            return *goal;
        }
        let p = self.points[self.next % self.points.len()];
        self.next += 1;
        grid.clamp(&p)
    }
}
