//! Custom error for the RRT library.
//!
//! Planning failures are not errors: an exhausted budget is reported through
//! [`crate::PlanningResult::found`]. These variants cover misconfiguration and
//! misuse of the tree store.

use crate::common::{NodeId, Point};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RRTError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("{which} position ({}, {}) lies outside the {rows}x{cols} grid", .position[0], .position[1])]
    OutOfBounds {
        which: &'static str,
        position: Point,
        rows: usize,
        cols: usize,
    },

    #[error("occupancy grid must have at least one row and one column")]
    EmptyGrid,

    #[error("occupancy grid row {row} has {found} cells, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("node {0} does not exist in the tree")]
    UnknownNode(NodeId),

    #[error("re-parenting node {node} under {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RRTError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        RRTError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RRTError>;
