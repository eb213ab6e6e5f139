//! # RRT*
//! Contains main RRT* functionality: nearest-node extension followed by
//! parent selection and rewiring within `neighbor_radius`.
//!
//! By default the search stops at the first goal capture. With
//! `continue_after_goal` it uses the whole budget and relinks the goal
//! whenever a cheaper capture appears.
use crate::collision::CollisionChecker;
use crate::common::{distance, GoalNode, NodeId, PlannerState, PlanningResult, Point};
use crate::error::Result;
use crate::occupancy_grid::OccupancyGrid;
use crate::params::RRTParams;
use crate::rewire::Rewirer;
use crate::sampling::{GoalBiasedSampler, Sampler};
use crate::steering::{Steering, StraightLineSteering};
use crate::tree::RRTTree;

pub struct RRTStar<S: Sampler = GoalBiasedSampler> {
    params: RRTParams,
    grid: OccupancyGrid,
    start: Point,
    goal: GoalNode,
    tree: RRTTree,
    sampler: S,
    steering: StraightLineSteering,
    checker: CollisionChecker,
    rewirer: Rewirer,
    state: PlannerState,
    num_iter: u64,
    num_rewires: usize,
}

impl RRTStar<GoalBiasedSampler> {
    pub fn new(params: RRTParams, grid: OccupancyGrid, start: Point, goal: Point) -> Result<Self> {
        let sampler = GoalBiasedSampler::from_seed(params.goal_bias, params.seed);
        Self::with_sampler(params, grid, start, goal, sampler)
    }
}

impl<S: Sampler> RRTStar<S> {
    pub fn with_sampler(
        params: RRTParams,
        grid: OccupancyGrid,
        start: Point,
        goal: Point,
        sampler: S,
    ) -> Result<Self> {
        params.validate()?;
        grid.check_inside("start", &start)?;
        grid.check_inside("goal", &goal)?;
        if !grid.is_free(&start) {
            log::warn!("RRT* start ({}, {}) lies in an obstacle cell", start[0], start[1]);
        }
        log::info!("RRTStar initialized with params: {:?}", params);
        let checker = CollisionChecker::new(params.collision_resolution);
        let mut rrt = Self {
            params,
            grid,
            start,
            goal: GoalNode::new(goal),
            tree: RRTTree::new(start),
            sampler,
            steering: StraightLineSteering::new(params.step_size),
            checker,
            rewirer: Rewirer::new(checker, params.rewire_strictness),
            state: PlannerState::Initialized,
            num_iter: 0,
            num_rewires: 0,
        };
        rrt.reset();
        Ok(rrt)
    }

    pub fn reset(&mut self) {
        self.tree.reset(self.start);
        self.goal.parent = None;
        self.num_iter = 0;
        self.num_rewires = 0;
        self.state = PlannerState::Initialized;
        if self.start == self.goal.position {
            self.goal.parent = Some(NodeId::ROOT);
            self.state = PlannerState::Succeeded;
        }
    }

    pub fn params(&self) -> &RRTParams {
        &self.params
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn found(&self) -> bool {
        self.goal.is_linked()
    }

    pub fn tree(&self) -> &RRTTree {
        &self.tree
    }

    pub fn goal(&self) -> &GoalNode {
        &self.goal
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn iterations(&self) -> u64 {
        self.num_iter
    }

    /// Total number of neighbors re-parented under a new node this run.
    pub fn num_rewires(&self) -> usize {
        self.num_rewires
    }

    /// Current goal cost, `None` until the goal is linked.
    pub fn c_best(&self) -> Result<Option<f64>> {
        self.goal.cost(&self.tree)
    }

    pub fn grow_towards_goal(&mut self) -> Result<PlanningResult> {
        self.reset();
        while !self.state.is_terminal() {
            self.step()?;
        }
        let result = self.result()?;
        if result.found {
            log::info!(
                "RRT* found a path after {} iterations | nodes: {} | rewires: {} | length: {:.2}",
                result.iterations,
                result.node_count,
                self.num_rewires,
                result.path_length
            );
        } else {
            log::info!(
                "RRT* found no path within {} iterations | nodes: {}",
                result.iterations,
                result.node_count
            );
        }
        Ok(result)
    }

    pub fn step(&mut self) -> Result<PlannerState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        if self.num_iter >= self.params.max_iter {
            return Ok(self.finish());
        }
        self.state = PlannerState::Growing;
        self.num_iter += 1;

        let z_rand = self.sampler.sample(&self.grid, &self.goal.position);
        let z_nearest = self.tree.nearest(&z_rand);
        let p_nearest = self.tree.position(z_nearest)?;
        let x_new = self.steering.steer(&p_nearest, &z_rand, &self.grid);

        if distance(&x_new, &p_nearest) <= self.params.min_node_dist {
            log::trace!("Dropped sample too close to {}", z_nearest);
        } else if !self.checker.is_edge_free(&p_nearest, &x_new, &self.grid) {
            log::trace!("Dropped sample ({:.2}, {:.2}): edge in collision", x_new[0], x_new[1]);
        } else {
            let z_new = self.tree.insert(x_new, z_nearest)?;
            let z_near = self.tree.neighbors_within(z_new, self.params.neighbor_radius)?;
            let outcome = self.rewirer.rewire(&mut self.tree, &self.grid, z_new, &z_near)?;
            self.num_rewires += outcome.rewired.len();
            if self.attempt_goal_insertion(z_new)? && !self.params.continue_after_goal {
                self.state = PlannerState::Succeeded;
                return Ok(self.state);
            }
        }

        if self.num_iter >= self.params.max_iter {
            return Ok(self.finish());
        }
        Ok(self.state)
    }

    fn finish(&mut self) -> PlannerState {
        self.state = if self.goal.is_linked() {
            PlannerState::Succeeded
        } else {
            PlannerState::Exhausted
        };
        self.state
    }

    /// Link the goal through `z` when `z` captures it and, if the goal is
    /// already linked, the new route is strictly cheaper.
    fn attempt_goal_insertion(&mut self, z: NodeId) -> Result<bool> {
        let node = self.tree.get(z)?;
        let d = distance(&node.position, &self.goal.position);
        let captured = d == 0.0
            || (d <= self.params.goal_radius
                && self
                    .checker
                    .is_edge_free(&node.position, &self.goal.position, &self.grid));
        if !captured {
            return Ok(false);
        }
        let cost = node.cost + d;
        if let Some(c_best) = self.c_best()? {
            if cost >= c_best {
                log::trace!("Goal capture through {} not cheaper | cost: {:.3} | c_best: {:.3}", z, cost, c_best);
                return Ok(false);
            }
        }
        self.goal.parent = Some(z);
        log::debug!("Goal linked to {} | cost: {:.3}", z, cost);
        Ok(true)
    }

    pub fn result(&self) -> Result<PlanningResult> {
        PlanningResult::from_goal(&self.tree, &self.goal, self.num_iter)
    }

    pub fn path(&self) -> Result<Vec<Point>> {
        self.goal.path(&self.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RewireStrictness;
    use crate::sampling::ScriptedSampler;
    use approx::assert_relative_eq;

    fn params(max_iter: u64) -> RRTParams {
        RRTParams::rrt_star().with_max_iter(max_iter).with_seed(3)
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = OccupancyGrid::new(10, 10).unwrap();
        let p = Point::new(2.0, 7.0);
        let mut rrt = RRTStar::new(params(100), grid, p, p).unwrap();
        let result = rrt.grow_towards_goal().unwrap();
        assert!(result.found);
        assert_eq!(result.path_length, 0.0);
        assert_eq!(result.node_count, 1);
    }

    #[test]
    fn test_new_node_takes_cheapest_parent() {
        let grid = OccupancyGrid::new(40, 40).unwrap();
        // Grow a dog-leg, then a sample whose nearest node is the far end
        // of the dog-leg but which is cheaper to reach from the root.
        let sampler = ScriptedSampler::new(vec![
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 3.0),
        ]);
        let mut p = params(3);
        p.neighbor_radius = 12.0;
        p.goal_radius = 0.0;
        let mut rrt = RRTStar::with_sampler(p, grid, Point::new(0.0, 0.0), Point::new(39.0, 39.0), sampler).unwrap();
        rrt.step().unwrap();
        rrt.step().unwrap();
        assert_eq!(rrt.tree().parent(NodeId::new(2)).unwrap(), Some(NodeId::new(1)));
        rrt.step().unwrap();
        assert_eq!(rrt.tree().parent(NodeId::new(3)).unwrap(), Some(NodeId::ROOT));
        assert_relative_eq!(rrt.tree().cost(NodeId::new(3)).unwrap(), 109f64.sqrt());
        assert!(rrt.tree().max_cost_error() < 1e-9);
        assert_eq!(rrt.state(), PlannerState::Exhausted);
    }

    #[test]
    fn test_stops_at_first_capture_by_default() {
        let grid = OccupancyGrid::new(30, 30).unwrap();
        let mut rrt = RRTStar::new(params(2000), grid, Point::new(0.0, 0.0), Point::new(29.0, 29.0)).unwrap();
        let result = rrt.grow_towards_goal().unwrap();
        assert!(result.found);
        assert!(result.iterations < 2000);
        assert_relative_eq!(result.path_length, result.segment_length(), epsilon = 1e-9);
    }

    #[test]
    fn test_continue_after_goal_uses_full_budget() {
        let grid = OccupancyGrid::new(30, 30).unwrap();
        let mut p = params(1500);
        p.continue_after_goal = true;
        let mut rrt = RRTStar::new(p, grid, Point::new(0.0, 0.0), Point::new(29.0, 29.0)).unwrap();
        let result = rrt.grow_towards_goal().unwrap();
        assert!(result.found);
        assert_eq!(result.iterations, 1500);
        assert_eq!(rrt.state(), PlannerState::Succeeded);
        let straight = distance(&Point::new(0.0, 0.0), &Point::new(29.0, 29.0));
        assert!(result.path_length >= straight - 1e-9);
        assert!(result.path_length < straight * 1.3, "length = {}", result.path_length);
        assert_relative_eq!(result.path_length, result.segment_length(), epsilon = 1e-9);
        assert!(rrt.tree().max_cost_error() < 1e-9);
    }

    #[test]
    fn test_local_strictness_still_forms_a_tree() {
        let grid = OccupancyGrid::new(30, 30).unwrap();
        let mut p = params(800);
        p.rewire_strictness = RewireStrictness::Local;
        p.continue_after_goal = true;
        let mut rrt = RRTStar::new(p, grid, Point::new(0.0, 0.0), Point::new(29.0, 29.0)).unwrap();
        rrt.grow_towards_goal().unwrap();
        for node in rrt.tree().nodes() {
            assert!(rrt.tree().is_ancestor(NodeId::ROOT, node.id).unwrap());
        }
    }
}
