//! # Common
//! Node, identifier and result types shared by the RRT and RRT* planners.
//!
use crate::error::Result;
use crate::tree::RRTTree;
use nalgebra::Vector2;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Planar position in grid space, `[row, column]`.
pub type Point = Vector2<f64>;

/// Euclidean distance between two positions.
pub fn distance(a: &Point, b: &Point) -> f64 {
    (a - b).norm()
}

/// Stable index of a node in the tree arena. The start node is always `#0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RRTNode {
    pub id: NodeId,
    pub position: Point,
    pub parent: Option<NodeId>,
    pub cost: f64,
    pub children: Vec<NodeId>,
}

impl RRTNode {
    pub fn new(id: NodeId, position: Point, parent: Option<NodeId>, cost: f64) -> Self {
        Self {
            id,
            position,
            parent,
            cost,
            children: Vec::new(),
        }
    }

    pub fn point(&self) -> [f64; 2] {
        [self.position[0], self.position[1]]
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Entry of the spatial index. Positions never move once inserted, so the
/// index only ever grows alongside the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexedPoint {
    pub id: NodeId,
    pub point: [f64; 2],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let x = self.point[0] - point[0];
        let y = self.point[1] - point[1];
        x * x + y * y
    }
}

/// Lifecycle of a single planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannerState {
    Initialized,
    Growing,
    Succeeded,
    Exhausted,
}

impl PlannerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlannerState::Succeeded | PlannerState::Exhausted)
    }
}

/// The goal is kept outside the arena and only linked to a tree node on success.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalNode {
    pub position: Point,
    pub parent: Option<NodeId>,
}

impl GoalNode {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            parent: None,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.parent.is_some()
    }

    /// Cost through the linked tree node, `None` while unlinked.
    pub fn cost(&self, tree: &RRTTree) -> Result<Option<f64>> {
        let Some(parent) = self.parent else {
            return Ok(None);
        };
        let p = tree.get(parent)?;
        Ok(Some(p.cost + distance(&p.position, &self.position)))
    }

    /// Start-to-goal positions reconstructed from the goal's parent chain.
    /// Empty while unlinked.
    pub fn path(&self, tree: &RRTTree) -> Result<Vec<Point>> {
        let Some(parent) = self.parent else {
            return Ok(vec![]);
        };
        let mut path = tree.path_to(parent)?;
        if path.last() != Some(&self.position) {
            path.push(self.position);
        }
        Ok(path)
    }
}

/// Outcome of a planning run, derived from the goal's parent chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningResult {
    pub found: bool,
    pub node_count: usize,
    pub path_length: f64,
    pub path: Vec<[f64; 2]>,
    pub iterations: u64,
}

impl PlanningResult {
    /// `path_length` is zero when no path was found; check `found` first.
    pub fn not_found(node_count: usize, iterations: u64) -> Self {
        Self {
            found: false,
            node_count,
            path_length: 0.0,
            path: vec![],
            iterations,
        }
    }

    pub fn from_goal(tree: &RRTTree, goal: &GoalNode, iterations: u64) -> Result<Self> {
        let Some(path_length) = goal.cost(tree)? else {
            return Ok(Self::not_found(tree.len(), iterations));
        };
        Ok(Self {
            found: true,
            node_count: tree.len(),
            path_length,
            path: goal.path(tree)?.iter().map(|p| [p[0], p[1]]).collect(),
            iterations,
        })
    }

    /// Sum of the straight segments between consecutive path points.
    pub fn segment_length(&self) -> f64 {
        self.path
            .iter()
            .zip(self.path.iter().skip(1))
            .map(|(p1, p2)| distance(&Point::from(*p1), &Point::from(*p2)))
            .sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstar::RTree;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_relative_eq!(distance(&a, &b), 5.0);
        assert_relative_eq!(distance(&b, &a), 5.0);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn test_indexed_point() {
        let p = IndexedPoint {
            id: NodeId::ROOT,
            point: [0.0, 0.0],
        };
        assert_eq!(p.distance_2(&[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_rtree() {
        let mut tree = RTree::new();
        tree.insert(IndexedPoint {
            id: NodeId::new(0),
            point: [0.0, 0.0],
        });
        tree.insert(IndexedPoint {
            id: NodeId::new(1),
            point: [50.0, 50.0],
        });

        let nearest = tree.nearest_neighbor(&[1.0, 0.0]).unwrap();
        assert_eq!(nearest.id, NodeId::new(0));
    }

    #[test]
    fn test_segment_length() {
        let result = PlanningResult {
            found: true,
            node_count: 3,
            path_length: 7.0,
            path: vec![[0.0, 0.0], [3.0, 4.0], [3.0, 6.0]],
            iterations: 10,
        };
        assert_relative_eq!(result.segment_length(), 7.0);
        let json = result.to_json().unwrap();
        let back: PlanningResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_goal_path_and_cost() {
        let mut tree = RRTTree::new(Point::new(0.0, 0.0));
        let a = tree.insert(Point::new(3.0, 4.0), NodeId::ROOT).unwrap();
        let mut goal = GoalNode::new(Point::new(4.0, 4.0));
        assert_eq!(goal.cost(&tree).unwrap(), None);
        assert!(goal.path(&tree).unwrap().is_empty());
        let unlinked = PlanningResult::from_goal(&tree, &goal, 3).unwrap();
        assert!(!unlinked.found);
        assert_eq!(unlinked.node_count, 2);

        goal.parent = Some(a);
        assert_relative_eq!(goal.cost(&tree).unwrap().unwrap(), 6.0);
        assert_eq!(
            goal.path(&tree).unwrap(),
            vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0), Point::new(4.0, 4.0)]
        );
        let result = PlanningResult::from_goal(&tree, &goal, 3).unwrap();
        assert!(result.found);
        assert_relative_eq!(result.path_length, result.segment_length());
    }

    #[test]
    fn test_goal_coincident_with_node() {
        let mut tree = RRTTree::new(Point::new(0.0, 0.0));
        let a = tree.insert(Point::new(3.0, 4.0), NodeId::ROOT).unwrap();
        let mut goal = GoalNode::new(Point::new(3.0, 4.0));
        goal.parent = Some(a);
        assert_eq!(goal.path(&tree).unwrap().len(), 2);
        assert_relative_eq!(goal.cost(&tree).unwrap().unwrap(), 5.0);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PlannerState::Initialized.is_terminal());
        assert!(!PlannerState::Growing.is_terminal());
        assert!(PlannerState::Succeeded.is_terminal());
        assert!(PlannerState::Exhausted.is_terminal());
    }
}
