//! # Grid RRT*
//! Implements Rapidly-exploring Random Trees (RRT) and their asymptotically
//! optimal variant (RRT*) over a 2-D occupancy grid.
//!
//! ## Usage
//! The one-shot entry points [`run_rrt`] and [`run_rrt_star`] use the default
//! tunables from [`RRTParams`]. For seeded runs, custom radii or a scripted
//! sampler, build an [`RRT`] or [`RRTStar`] directly and drive it with
//! `grow_towards_goal` or `step`.
//!
//! Points are `(row, column)` pairs in grid space.

pub mod collision;
pub mod common;
pub mod error;
pub mod occupancy_grid;
pub mod params;
pub mod rewire;
pub mod rrt;
pub mod rrt_star;
pub mod sampling;
pub mod steering;
pub mod tree;

pub use collision::CollisionChecker;
pub use common::{distance, GoalNode, NodeId, PlannerState, PlanningResult, Point, RRTNode};
pub use error::{RRTError, Result};
pub use occupancy_grid::OccupancyGrid;
pub use params::{RRTParams, RewireStrictness};
pub use rrt::RRT;
pub use rrt_star::RRTStar;
pub use sampling::{GoalBiasedSampler, Sampler, ScriptedSampler};
pub use steering::{Steering, StraightLineSteering};
pub use tree::{NodeRecord, RRTTree};

/// Feasibility search from `start` to `goal` with at most `budget` samples.
pub fn run_rrt(grid: OccupancyGrid, start: Point, goal: Point, budget: u64) -> Result<PlanningResult> {
    let params = RRTParams::rrt().with_max_iter(budget);
    RRT::new(params, grid, start, goal)?.grow_towards_goal()
}

/// Cost-aware search from `start` to `goal` with at most `budget` samples,
/// rewiring within `neighbor_radius` of every new node.
pub fn run_rrt_star(
    grid: OccupancyGrid,
    start: Point,
    goal: Point,
    budget: u64,
    neighbor_radius: f64,
) -> Result<PlanningResult> {
    let params = RRTParams::rrt_star()
        .with_max_iter(budget)
        .with_neighbor_radius(neighbor_radius);
    RRTStar::new(params, grid, start, goal)?.grow_towards_goal()
}
