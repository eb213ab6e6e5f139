//! # RRT tree
//! Arena of nodes in insertion order, with parent/child links stored as
//! [`NodeId`] indices and an `rstar` index for nearest and radius queries.
//!
//! Node positions never change after insertion; only parents and costs are
//! rewritten, so the spatial index is append-only.
use crate::common::{distance, IndexedPoint, NodeId, Point, RRTNode};
use crate::error::{RRTError, Result};
use rstar::RTree;
use serde::{Deserialize, Serialize};

/// Flat, serializable view of one node for external consumers (plotting etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: usize,
    pub parent_id: Option<usize>,
    pub position: [f64; 2],
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct RRTTree {
    nodes: Vec<RRTNode>,
    rtree: RTree<IndexedPoint>,
}

impl RRTTree {
    /// A tree holding only the root at `start`.
    pub fn new(start: Point) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            rtree: RTree::new(),
        };
        tree.reset(start);
        tree
    }

    /// Drop every node and re-seed with the root at `start`.
    pub fn reset(&mut self, start: Point) {
        self.nodes.clear();
        self.rtree = RTree::new();
        let root = RRTNode::new(NodeId::ROOT, start, None, 0.0);
        self.rtree.insert(IndexedPoint {
            id: NodeId::ROOT,
            point: root.point(),
        });
        self.nodes.push(root);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &RRTNode {
        &self.nodes[0]
    }

    pub fn get(&self, id: NodeId) -> Result<&RRTNode> {
        self.nodes.get(id.index()).ok_or(RRTError::UnknownNode(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RRTNode> {
        self.nodes.iter()
    }

    pub fn position(&self, id: NodeId) -> Result<Point> {
        Ok(self.get(id)?.position)
    }

    pub fn cost(&self, id: NodeId) -> Result<f64> {
        Ok(self.get(id)?.cost)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(id)?.parent)
    }

    /// Append a node at `position` under `parent`, with
    /// `cost = parent.cost + distance(position, parent)`.
    pub fn insert(&mut self, position: Point, parent: NodeId) -> Result<NodeId> {
        let parent_node = self.get(parent)?;
        let cost = parent_node.cost + distance(&position, &parent_node.position);
        let id = NodeId::new(self.nodes.len());
        let node = RRTNode::new(id, position, Some(parent), cost);
        self.rtree.insert(IndexedPoint {
            id,
            point: node.point(),
        });
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    /// Nearest node to `point`; ties go to the earliest inserted node.
    pub fn nearest(&self, point: &Point) -> NodeId {
        let query = [point[0], point[1]];
        let mut candidates = self.rtree.nearest_neighbor_iter_with_distance_2(&query);
        let Some((first, best_d2)) = candidates.next() else {
            return NodeId::ROOT;
        };
        let mut best = first.id;
        for (candidate, d2) in candidates {
            if d2 > best_d2 {
                break;
            }
            best = best.min(candidate.id);
        }
        best
    }

    /// Every node other than `id` within `radius` (inclusive) of `id`, in
    /// insertion order.
    pub fn neighbors_within(&self, id: NodeId, radius: f64) -> Result<Vec<NodeId>> {
        let p = self.get(id)?.point();
        let mut neighbors = self
            .rtree
            .locate_within_distance(p, radius * radius)
            .map(|ip| ip.id)
            .filter(|n| *n != id)
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        Ok(neighbors)
    }

    /// True if `ancestor` lies on the parent chain of `id` (or is `id`).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> Result<bool> {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return Ok(true);
            }
            current = self.get(c)?.parent;
        }
        Ok(false)
    }

    /// Move `id` under `new_parent` and set its cost from the new edge.
    /// Descendant costs are left untouched; see [`RRTTree::propagate_cost`].
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<()> {
        let parent_node = self.get(new_parent)?;
        let new_cost = parent_node.cost + distance(&self.get(id)?.position, &parent_node.position);
        if self.is_ancestor(id, new_parent)? {
            return Err(RRTError::Cycle {
                node: id,
                parent: new_parent,
            });
        }
        if let Some(old_parent) = self.nodes[id.index()].parent {
            self.nodes[old_parent.index()].children.retain(|c| *c != id);
        }
        let node = &mut self.nodes[id.index()];
        node.parent = Some(new_parent);
        node.cost = new_cost;
        self.nodes[new_parent.index()].children.push(id);
        Ok(())
    }

    /// Recompute the cost of every descendant of `id` from its parent edge.
    /// Returns the number of nodes updated.
    pub fn propagate_cost(&mut self, id: NodeId) -> Result<usize> {
        self.get(id)?;
        let mut updated = 0;
        let mut stack = self.nodes[id.index()].children.clone();
        while let Some(child) = stack.pop() {
            let (parent_cost, parent_pos) = match self.nodes[child.index()].parent {
                Some(p) => (self.nodes[p.index()].cost, self.nodes[p.index()].position),
                None => continue,
            };
            let node = &mut self.nodes[child.index()];
            node.cost = parent_cost + distance(&node.position, &parent_pos);
            stack.extend(node.children.iter().copied());
            updated += 1;
        }
        Ok(updated)
    }

    /// Positions from the root to `id`, walking the parent chain backwards.
    pub fn path_to(&self, id: NodeId) -> Result<Vec<Point>> {
        let mut path = vec![];
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.get(c)?;
            path.push(node.position);
            current = node.parent;
            if path.len() > self.nodes.len() {
                return Err(RRTError::Cycle { node: id, parent: c });
            }
        }
        path.reverse();
        Ok(path)
    }

    pub fn records(&self) -> Vec<NodeRecord> {
        self.nodes
            .iter()
            .map(|n| NodeRecord {
                id: n.id.index(),
                parent_id: n.parent.map(|p| p.index()),
                position: n.point(),
                cost: n.cost,
            })
            .collect()
    }

    /// Largest violation of `cost(n) == cost(parent(n)) + distance(n, parent(n))`.
    pub fn max_cost_error(&self) -> f64 {
        self.nodes
            .iter()
            .filter_map(|n| {
                let p = &self.nodes[n.parent?.index()];
                Some((n.cost - (p.cost + distance(&n.position, &p.position))).abs())
            })
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_tree() -> RRTTree {
        // 0 -> 1 -> 2 -> 3 along the row axis.
        let mut tree = RRTTree::new(Point::new(0.0, 0.0));
        let n1 = tree.insert(Point::new(1.0, 0.0), NodeId::ROOT).unwrap();
        let n2 = tree.insert(Point::new(2.0, 0.0), n1).unwrap();
        tree.insert(Point::new(3.0, 0.0), n2).unwrap();
        tree
    }

    #[test]
    fn test_insert_sets_cost() {
        let mut tree = RRTTree::new(Point::new(0.0, 0.0));
        let n1 = tree.insert(Point::new(3.0, 4.0), NodeId::ROOT).unwrap();
        let n2 = tree.insert(Point::new(3.0, 6.0), n1).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root().cost, 0.0);
        assert!(tree.root().is_root());
        assert_relative_eq!(tree.cost(n1).unwrap(), 5.0);
        assert_relative_eq!(tree.cost(n2).unwrap(), 7.0);
        assert_eq!(tree.parent(n2).unwrap(), Some(n1));
        assert_eq!(tree.get(NodeId::ROOT).unwrap().children, vec![n1]);
        assert!(tree.insert(Point::new(1.0, 1.0), NodeId::new(9)).is_err());
    }

    #[test]
    fn test_reset() {
        let mut tree = line_tree();
        tree.reset(Point::new(5.0, 5.0));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().position, Point::new(5.0, 5.0));
        assert_eq!(tree.nearest(&Point::new(1.0, 0.0)), NodeId::ROOT);
    }

    #[test]
    fn test_nearest_breaks_ties_by_insertion_order() {
        let mut tree = RRTTree::new(Point::new(0.0, 0.0));
        let a = tree.insert(Point::new(2.0, 2.0), NodeId::ROOT).unwrap();
        tree.insert(Point::new(2.0, 4.0), NodeId::ROOT).unwrap();
        // Equidistant from both non-root nodes.
        assert_eq!(tree.nearest(&Point::new(2.0, 3.0)), a);
        // Equidistant from all three: root wins.
        let mut tree = RRTTree::new(Point::new(0.0, 0.0));
        tree.insert(Point::new(0.0, 2.0), NodeId::ROOT).unwrap();
        assert_eq!(tree.nearest(&Point::new(0.0, 1.0)), NodeId::ROOT);
    }

    #[test]
    fn test_neighbors_within() {
        let tree = line_tree();
        let n1 = NodeId::new(1);
        assert_eq!(
            tree.neighbors_within(n1, 1.0).unwrap(),
            vec![NodeId::new(0), NodeId::new(2)]
        );
        assert_eq!(
            tree.neighbors_within(n1, 2.0).unwrap(),
            vec![NodeId::new(0), NodeId::new(2), NodeId::new(3)]
        );
        assert!(tree.neighbors_within(n1, 0.5).unwrap().is_empty());
        // Unmodified tree, same answer.
        assert_eq!(
            tree.neighbors_within(n1, 2.0).unwrap(),
            tree.neighbors_within(n1, 2.0).unwrap()
        );
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut tree = line_tree();
        let err = tree.reparent(NodeId::new(1), NodeId::new(3)).unwrap_err();
        assert!(matches!(err, RRTError::Cycle { .. }));
        assert!(tree.reparent(NodeId::new(2), NodeId::new(2)).is_err());
        assert_eq!(tree.parent(NodeId::new(1)).unwrap(), Some(NodeId::ROOT));
    }

    #[test]
    fn test_reparent_and_propagate() {
        let mut tree = line_tree();
        // Move node 2 directly under the root; its subtree keeps stale cost
        // until propagated.
        tree.reparent(NodeId::new(2), NodeId::ROOT).unwrap();
        assert_relative_eq!(tree.cost(NodeId::new(2)).unwrap(), 2.0);
        assert!(tree.get(NodeId::new(1)).unwrap().children.is_empty());
        assert_eq!(
            tree.get(NodeId::ROOT).unwrap().children,
            vec![NodeId::new(1), NodeId::new(2)]
        );
        assert_eq!(tree.propagate_cost(NodeId::new(2)).unwrap(), 1);
        assert_relative_eq!(tree.cost(NodeId::new(3)).unwrap(), 3.0);
        assert!(tree.max_cost_error() < 1e-12);
    }

    #[test]
    fn test_stale_costs_are_detected() {
        let mut tree = RRTTree::new(Point::new(0.0, 0.0));
        let far = tree.insert(Point::new(0.0, 10.0), NodeId::ROOT).unwrap();
        let a = tree.insert(Point::new(5.0, 10.0), far).unwrap();
        let b = tree.insert(Point::new(6.0, 10.0), a).unwrap();
        tree.reparent(a, NodeId::ROOT).unwrap();
        assert_relative_eq!(tree.cost(b).unwrap(), 16.0);
        assert!(tree.max_cost_error() > 1.0);
        tree.propagate_cost(a).unwrap();
        assert!(tree.max_cost_error() < 1e-12);
    }

    #[test]
    fn test_path_to() {
        let tree = line_tree();
        let path = tree.path_to(NodeId::new(3)).unwrap();
        assert_eq!(
            path,
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(3.0, 0.0)
            ]
        );
        assert_eq!(tree.path_to(NodeId::ROOT).unwrap(), vec![Point::new(0.0, 0.0)]);
        assert!(tree.is_ancestor(NodeId::ROOT, NodeId::new(3)).unwrap());
        assert!(!tree.is_ancestor(NodeId::new(3), NodeId::new(1)).unwrap());
    }

    #[test]
    fn test_records() {
        let tree = line_tree();
        let records = tree.records();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].parent_id, None);
        assert_eq!(records[3].parent_id, Some(2));
        assert_eq!(records[3].position, [3.0, 0.0]);
        let json = serde_json::to_string(&records).unwrap();
        assert!(json.contains("\"parent_id\":2"));
    }
}
