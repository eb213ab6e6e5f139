//! # Collision
//! Segment validation against the occupancy grid.
//!
use crate::common::Point;
use crate::occupancy_grid::OccupancyGrid;

pub const DEFAULT_RESOLUTION: usize = 41;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionChecker {
    resolution: usize,
}

impl Default for CollisionChecker {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl CollisionChecker {
    /// `resolution` is the number of points tested along a segment, both
    /// endpoints included. Values below 2 are raised to 2.
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution: resolution.max(2),
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// True if every sampled cell on the straight segment `p1`-`p2` is free.
    pub fn is_edge_free(&self, p1: &Point, p2: &Point, grid: &OccupancyGrid) -> bool {
        if p1 == p2 {
            return grid.is_free(p1);
        }
        // Walk from the lexicographically smaller endpoint so that both
        // directions sample bit-identical points.
        let (a, b) = if (p1[0], p1[1]) <= (p2[0], p2[1]) {
            (p1, p2)
        } else {
            (p2, p1)
        };
        let delta = b - a;
        let n = (self.resolution - 1) as f64;
        (0..self.resolution).all(|i| {
            let p = if i == self.resolution - 1 {
                *b
            } else {
                a + delta * (i as f64 / n)
            };
            grid.is_free(&p)
        })
    }
}
