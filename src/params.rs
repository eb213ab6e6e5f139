//! # Parameters
//! Tunables for the RRT and RRT* planners, loadable from TOML/JSON/YAML files
//! through the `config` crate or from a `serde_json::Value`.
//!
use crate::collision::DEFAULT_RESOLUTION;
use crate::error::{RRTError, Result};
use config::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How far a cost improvement found while rewiring travels down the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewireStrictness {
    /// Only the rewired node is updated; its descendants keep stale costs
    /// until a later rewire revisits them.
    Local,
    /// Every descendant of a rewired node has its cost recomputed.
    #[default]
    Propagate,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RRTParams {
    /// Sampling budget, i.e. iterations attempted, not nodes inserted.
    pub max_iter: u64,
    pub goal_bias: f64,
    /// Maximum edge length; samples farther than this from their nearest node
    /// are steered back onto it.
    pub step_size: f64,
    pub goal_radius: f64,
    /// Neighborhood radius for RRT* parent selection and rewiring.
    pub neighbor_radius: f64,
    pub collision_resolution: usize,
    pub min_node_dist: f64,
    pub rewire_strictness: RewireStrictness,
    /// RRT* only: keep sampling after the goal is first linked.
    pub continue_after_goal: bool,
    pub seed: Option<u64>,
}

impl Default for RRTParams {
    fn default() -> Self {
        Self::rrt()
    }
}

impl RRTParams {
    pub fn rrt() -> Self {
        Self {
            max_iter: 1000,
            goal_bias: 0.05,
            step_size: 12.0,
            goal_radius: 2.0,
            neighbor_radius: 20.0,
            collision_resolution: DEFAULT_RESOLUTION,
            min_node_dist: 0.0,
            rewire_strictness: RewireStrictness::Propagate,
            continue_after_goal: false,
            seed: None,
        }
    }

    pub fn rrt_star() -> Self {
        Self {
            step_size: 16.0,
            ..Self::rrt()
        }
    }

    pub fn with_max_iter(mut self, max_iter: u64) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_neighbor_radius(mut self, neighbor_radius: f64) -> Self {
        self.neighbor_radius = neighbor_radius;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.goal_bias) {
            return Err(RRTError::invalid(
                "goal_bias",
                format!("{} is not a probability in [0, 1]", self.goal_bias),
            ));
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(RRTError::invalid(
                "step_size",
                format!("{} must be positive and finite", self.step_size),
            ));
        }
        for (name, value) in [
            ("goal_radius", self.goal_radius),
            ("neighbor_radius", self.neighbor_radius),
            ("min_node_dist", self.min_node_dist),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RRTError::invalid(
                    name,
                    format!("{} must be non-negative and finite", value),
                ));
            }
        }
        if self.collision_resolution < 2 {
            return Err(RRTError::invalid(
                "collision_resolution",
                format!(
                    "{} points cannot cover both segment endpoints",
                    self.collision_resolution
                ),
            ));
        }
        Ok(())
    }

    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        let cfg: RRTParams = serde_json::from_value(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(filename: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(config::File::with_name(filename))
            .build()?
            .try_deserialize::<RRTParams>()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_file(&self, filename: impl AsRef<Path>) -> Result<()> {
        log::debug!("Writing parameters to {}", filename.as_ref().display());
        serde_json::to_writer_pretty(std::fs::File::create(filename)?, &self)?;
        Ok(())
    }
}
