//! # Rewire
//! RRT* parent selection and neighborhood rewiring around a freshly inserted node.
//!
//! Every re-parenting strictly lowers the cost of the moved node, and a node is
//! never moved below one of its own descendants, so the parent relation stays a
//! tree rooted at the start.
use crate::collision::CollisionChecker;
use crate::common::{distance, NodeId};
use crate::error::Result;
use crate::occupancy_grid::OccupancyGrid;
use crate::params::RewireStrictness;
use crate::tree::RRTTree;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewireOutcome {
    /// Set when the new node was moved off its nearest-node parent.
    pub new_parent: Option<NodeId>,
    /// Neighbors that now hang below the new node.
    pub rewired: Vec<NodeId>,
    /// Descendant costs recomputed under [`RewireStrictness::Propagate`].
    pub propagated: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Rewirer {
    pub checker: CollisionChecker,
    pub strictness: RewireStrictness,
}

impl Rewirer {
    pub fn new(checker: CollisionChecker, strictness: RewireStrictness) -> Self {
        Self {
            checker,
            strictness,
        }
    }

    pub fn rewire(
        &self,
        tree: &mut RRTTree,
        grid: &OccupancyGrid,
        z_new: NodeId,
        z_near: &[NodeId],
    ) -> Result<RewireOutcome> {
        let mut outcome = RewireOutcome::default();
        if let Some(parent) = self.choose_parent(tree, grid, z_new, z_near)? {
            tree.reparent(z_new, parent)?;
            outcome.new_parent = Some(parent);
            outcome.propagated += self.after_reparent(tree, z_new)?;
        }
        let (rewired, propagated) = self.rewire_neighbors(tree, grid, z_new, z_near)?;
        outcome.rewired = rewired;
        outcome.propagated += propagated;
        Ok(outcome)
    }

    /// Cheapest collision-free neighbor to hang `z_new` from, if it beats the
    /// current parent. The current parent is a candidate like any other.
    pub fn choose_parent(
        &self,
        tree: &RRTTree,
        grid: &OccupancyGrid,
        z_new: NodeId,
        z_near: &[NodeId],
    ) -> Result<Option<NodeId>> {
        let new_node = tree.get(z_new)?;
        let mut best_cost = new_node.cost;
        let mut best_parent = None;
        for &candidate in z_near {
            if candidate == z_new || tree.is_ancestor(z_new, candidate)? {
                continue;
            }
            let c = tree.get(candidate)?;
            let cost = c.cost + distance(&new_node.position, &c.position);
            if cost < best_cost
                && self
                    .checker
                    .is_edge_free(&c.position, &new_node.position, grid)
            {
                best_cost = cost;
                best_parent = Some(candidate);
            }
        }
        if best_parent.is_some() && best_parent == new_node.parent {
            return Ok(None);
        }
        Ok(best_parent)
    }

    /// Re-parent every neighbor that becomes cheaper when reached through
    /// `z_new`. Returns the rewired neighbors and the number of descendant
    /// costs recomputed.
    pub fn rewire_neighbors(
        &self,
        tree: &mut RRTTree,
        grid: &OccupancyGrid,
        z_new: NodeId,
        z_near: &[NodeId],
    ) -> Result<(Vec<NodeId>, usize)> {
        let z_new_parent = tree.parent(z_new)?;
        let mut rewired = vec![];
        let mut propagated = 0;
        for &z_near_id in z_near {
            if z_near_id == z_new || Some(z_near_id) == z_new_parent {
                continue;
            }
            let new_node = tree.get(z_new)?;
            let near_node = tree.get(z_near_id)?;
            let cost = new_node.cost + distance(&new_node.position, &near_node.position);
            if cost >= near_node.cost
                || !self
                    .checker
                    .is_edge_free(&new_node.position, &near_node.position, grid)
            {
                continue;
            }
            if tree.is_ancestor(z_near_id, z_new)? {
                log::trace!("Skipping rewire of ancestor {} under {}", z_near_id, z_new);
                continue;
            }
            log::trace!(
                "Rewiring {} under {} | cost {:.3} -> {:.3}",
                z_near_id,
                z_new,
                tree.cost(z_near_id)?,
                cost
            );
            tree.reparent(z_near_id, z_new)?;
            propagated += self.after_reparent(tree, z_near_id)?;
            rewired.push(z_near_id);
        }
        Ok((rewired, propagated))
    }

    fn after_reparent(&self, tree: &mut RRTTree, id: NodeId) -> Result<usize> {
        match self.strictness {
            RewireStrictness::Local => Ok(0),
            RewireStrictness::Propagate => tree.propagate_cost(id),
        }
    }
}
