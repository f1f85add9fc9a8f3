//! Solver and network configuration
//!
//! Both configuration structs deserialize from JSON with every field
//! optional; missing fields take their defaults.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::FlowError;

/// What a solve does when the network already carries flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvePolicy {
    /// Augment on top of the existing flow and report only the added amount
    #[default]
    Continue,
    /// Zero every arc's flow first and report the full value
    Reset,
    /// Fail with [`FlowError::AlreadySolved`]
    Reject,
}

impl ResolvePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolvePolicy::Continue => "continue",
            ResolvePolicy::Reset => "reset",
            ResolvePolicy::Reject => "reject",
        }
    }
}

impl FromStr for ResolvePolicy {
    type Err = FlowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "continue" => Ok(ResolvePolicy::Continue),
            "reset" => Ok(ResolvePolicy::Reset),
            "reject" => Ok(ResolvePolicy::Reject),
            other => Err(FlowError::InvalidParameter {
                name: "resolve_policy".to_string(),
                reason: format!("expected continue, reset or reject, got {}", other),
            }),
        }
    }
}

/// What `add_arc` does with a second arc between the same ordered pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateArcPolicy {
    /// Sum the capacities and keep the accumulated flow
    #[default]
    Merge,
    /// Fail with [`FlowError::DuplicateArc`]
    Reject,
}

/// Solver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub resolve_policy: ResolvePolicy,
    /// Skip arcs already known to be dead within a phase
    pub current_arc: bool,
    /// Run the invariant checker after every solve
    pub verify_invariants: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            resolve_policy: ResolvePolicy::default(),
            current_arc: true,
            verify_invariants: false,
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, FlowError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Network construction configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub duplicate_arcs: DuplicateArcPolicy,
}

impl NetworkConfig {
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(json)?)
    }
}
