//! # Steering
//! Bounds a candidate extension of the tree to a maximum edge length.
//!
use crate::common::{distance, Point};
use crate::occupancy_grid::OccupancyGrid;

pub trait Steering {
    /// Point to extend the tree with when growing from `from` toward `toward`.
    fn steer(&self, from: &Point, toward: &Point, grid: &OccupancyGrid) -> Point;
}

/// Straight-line extension capped at `step_size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLineSteering {
    pub step_size: f64,
}

impl StraightLineSteering {
    pub fn new(step_size: f64) -> Self {
        Self { step_size }
    }
}

impl Steering for StraightLineSteering {
    fn steer(&self, from: &Point, toward: &Point, grid: &OccupancyGrid) -> Point {
        let dist = distance(from, toward);
        if dist == 0.0 {
            return grid.clamp(from);
        }
        if dist <= self.step_size {
            return grid.clamp(toward);
        }
        let p_new = from + (toward - from) * (self.step_size / dist);
        grid.clamp(&p_new)
    }
}
