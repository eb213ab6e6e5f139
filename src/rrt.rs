//! # RRT
//! Feasibility-only Rapidly-exploring Random Tree. Stops growing at the first
//! goal capture.
//!
use crate::collision::CollisionChecker;
use crate::common::{distance, GoalNode, NodeId, PlannerState, PlanningResult, Point};
use crate::error::Result;
use crate::occupancy_grid::OccupancyGrid;
use crate::params::RRTParams;
use crate::sampling::{GoalBiasedSampler, Sampler};
use crate::steering::{Steering, StraightLineSteering};
use crate::tree::RRTTree;

pub struct RRT<S: Sampler = GoalBiasedSampler> {
    params: RRTParams,
    grid: OccupancyGrid,
    start: Point,
    goal: GoalNode,
    tree: RRTTree,
    sampler: S,
    steering: StraightLineSteering,
    checker: CollisionChecker,
    state: PlannerState,
    num_iter: u64,
}

impl RRT<GoalBiasedSampler> {
    pub fn new(params: RRTParams, grid: OccupancyGrid, start: Point, goal: Point) -> Result<Self> {
        let sampler = GoalBiasedSampler::from_seed(params.goal_bias, params.seed);
        Self::with_sampler(params, grid, start, goal, sampler)
    }
}

impl<S: Sampler> RRT<S> {
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
            log::warn!("RRT start ({}, {}) lies in an obstacle cell", start[0], start[1]);
        }
        log::info!("RRT initialized with params: {:?}", params);
        let mut rrt = Self {
            params,
            grid,
            start,
            goal: GoalNode::new(goal),
            tree: RRTTree::new(start),
            sampler,
            steering: StraightLineSteering::new(params.step_size),
            checker: CollisionChecker::new(params.collision_resolution),
            state: PlannerState::Initialized,
            num_iter: 0,
        };
        rrt.reset();
        Ok(rrt)
    }

    /// Clear the tree and re-seed it with the start node. A start that
    /// coincides with the goal is an immediate success.
    pub fn reset(&mut self) {
        self.tree.reset(self.start);
        self.goal.parent = None;
        self.num_iter = 0;
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
        self.state == PlannerState::Succeeded
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

    /// Run a fresh search over the full sampling budget.
    pub fn grow_towards_goal(&mut self) -> Result<PlanningResult> {
        self.reset();
        while !self.state.is_terminal() {
            self.step()?;
        }
        let result = self.result()?;
        if result.found {
            log::info!(
                "RRT found a path after {} iterations | nodes: {} | length: {:.2}",
                result.iterations,
                result.node_count,
                result.path_length
            );
        } else {
            log::info!(
                "RRT found no path within {} iterations | nodes: {}",
                result.iterations,
                result.node_count
            );
        }
        Ok(result)
    }

    /// One sample-extend-check iteration.
    pub fn step(&mut self) -> Result<PlannerState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        if self.num_iter >= self.params.max_iter {
            self.state = PlannerState::Exhausted;
            return Ok(self.state);
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
            if self.attempt_goal_insertion(z_new)? {
                self.state = PlannerState::Succeeded;
                return Ok(self.state);
            }
        }

        if self.num_iter >= self.params.max_iter {
            self.state = PlannerState::Exhausted;
        }
        Ok(self.state)
    }

    /// Link the goal to `z` if `z` sits on the goal, or lies within the goal
    /// radius with a free edge to it.
    fn attempt_goal_insertion(&mut self, z: NodeId) -> Result<bool> {
        let p = self.tree.position(z)?;
        let d = distance(&p, &self.goal.position);
        let reached = d == 0.0
            || (d <= self.params.goal_radius
                && self.checker.is_edge_free(&p, &self.goal.position, &self.grid));
        if reached {
            self.goal.parent = Some(z);
            log::debug!(
                "Goal linked to {} | cost: {:.3}",
                z,
                self.tree.cost(z)? + d
            );
        }
        Ok(reached)
    }

    pub fn result(&self) -> Result<PlanningResult> {
        PlanningResult::from_goal(&self.tree, &self.goal, self.num_iter)
    }

    /// Start-to-goal positions, empty if the goal is not linked.
    pub fn path(&self) -> Result<Vec<Point>> {
        self.goal.path(&self.tree)
    }
}
