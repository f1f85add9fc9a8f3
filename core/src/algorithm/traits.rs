//! Core trait definitions for the flow engine
//!
//! Establishes the node identifier bound, the error taxonomy shared by every
//! module, and the parameterised [`Algorithm`] interface that solvers expose.

use std::fmt::Debug;
use std::hash::Hash;

use crate::data_structures::arc::{Capacity, Flow};
use crate::validation::correctness::InvariantViolation;

/// Opaque node identifier accepted by [`FlowNetwork`](crate::FlowNetwork).
///
/// Any copyable, hashable, comparable value qualifies; no ordering is assumed.
pub trait NodeId: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> NodeId for T {}

/// Comprehensive error types for network construction and solving
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Invalid augmentation of arc {arc}: {amount} exceeds remaining capacity {remaining}")]
    InvalidAugmentation {
        arc: usize,
        amount: Flow,
        remaining: Capacity,
    },

    #[error("Network has no source")]
    NoSource,

    #[error("Network has no sink")]
    NoSink,

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Unknown arc: {0}")]
    UnknownArc(usize),

    #[error("Arc {0} has no residual twin")]
    UnpairedArc(usize),

    #[error("Negative capacity {capacity} on arc {tail} -> {head}")]
    NegativeCapacity {
        tail: String,
        head: String,
        capacity: Flow,
    },

    #[error("Duplicate arc {tail} -> {head}")]
    DuplicateArc { tail: String, head: String },

    #[error("Source and sink are the same node: {0}")]
    SourceIsSink(String),

    #[error("Network already carries flow from a previous solve")]
    AlreadySolved,

    #[error("Augmenting path consists solely of unbounded arcs")]
    UnboundedFlow,

    #[error("Flow value exceeds the representable range")]
    FlowOverflow,

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    InvariantViolation(#[from] InvariantViolation),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Main algorithm trait with string-typed parameters
pub trait Algorithm: Debug {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category (e.g. max_flow)
    fn category(&self) -> &'static str;

    /// Returns the algorithm's description with complexity bounds
    fn description(&self) -> String;

    /// Sets algorithm parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), FlowError>;

    /// Gets algorithm parameter value
    fn get_parameter(&self, name: &str) -> Option<String>;
}
