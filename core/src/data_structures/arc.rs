//! Capacitated arc representation with residual pairing
//!
//! Arcs are stored in forward/residual pairs inside a single arena owned by
//! [`FlowNetwork`](super::flow_network::FlowNetwork). A twin is referenced by
//! its arena index, never by pointer, so the network has no cyclic ownership
//! and twin lookup stays O(1).

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Flow value type; residual arcs carry the negated forward flow
pub type Flow = i64;

/// Arena position of a node inside a flow network
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Arena position of an arc inside a flow network
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ArcIndex(pub usize);

impl ArcIndex {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Arc capacity: a finite amount or the unbounded sentinel.
///
/// The derived ordering places `Unbounded` above every finite value, which
/// lets bottleneck computations use plain `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Capacity {
    /// Finite non-negative capacity
    Finite(Flow),
    /// No upper bound on flow
    Unbounded,
}

impl Capacity {
    pub const ZERO: Capacity = Capacity::Finite(0);

    #[inline]
    pub fn is_unbounded(self) -> bool {
        matches!(self, Capacity::Unbounded)
    }

    /// Finite amount, or `None` for the unbounded sentinel
    #[inline]
    pub fn finite(self) -> Option<Flow> {
        match self {
            Capacity::Finite(amount) => Some(amount),
            Capacity::Unbounded => None,
        }
    }

    /// Capacity left after `flow` units have been used
    #[inline]
    pub fn minus(self, flow: Flow) -> Capacity {
        match self {
            Capacity::Finite(amount) => Capacity::Finite(amount.saturating_sub(flow)),
            Capacity::Unbounded => Capacity::Unbounded,
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::ZERO
    }
}

impl Add for Capacity {
    type Output = Capacity;

    fn add(self, other: Capacity) -> Capacity {
        match (self, other) {
            (Capacity::Finite(a), Capacity::Finite(b)) => Capacity::Finite(a.saturating_add(b)),
            _ => Capacity::Unbounded,
        }
    }
}

impl From<i64> for Capacity {
    fn from(amount: i64) -> Self {
        Capacity::Finite(amount)
    }
}

impl From<i32> for Capacity {
    fn from(amount: i32) -> Self {
        Capacity::Finite(Flow::from(amount))
    }
}

impl From<u32> for Capacity {
    fn from(amount: u32) -> Self {
        Capacity::Finite(Flow::from(amount))
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Finite(amount) => write!(f, "{}", amount),
            Capacity::Unbounded => write!(f, "inf"),
        }
    }
}

/// Directed capacitated arc with residual tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowArc {
    /// Tail vertex
    tail: NodeIndex,
    /// Head vertex
    head: NodeIndex,
    /// Nominal capacity
    capacity: Capacity,
    /// Current flow; negative on residual arcs
    flow: Flow,
    /// Paired reverse arc in the arena
    twin: Option<ArcIndex>,
    /// Set for the reverse half of a pair
    residual: bool,
    /// Set for super-source/super-sink connectors
    synthetic: bool,
}

impl FlowArc {
    /// Create an unpaired forward arc with zero flow.
    ///
    /// The arc must be paired with [`FlowArc::paired_with`] before flow can
    /// be pushed through it.
    pub fn new(tail: NodeIndex, head: NodeIndex, capacity: Capacity) -> Self {
        Self {
            tail,
            head,
            capacity,
            flow: 0,
            twin: None,
            residual: false,
            synthetic: false,
        }
    }

    /// Create the zero-capacity reverse half for `forward`
    pub fn residual_of(forward: &FlowArc, forward_index: ArcIndex) -> Self {
        Self {
            tail: forward.head,
            head: forward.tail,
            capacity: Capacity::ZERO,
            flow: -forward.flow,
            twin: Some(forward_index),
            residual: true,
            synthetic: forward.synthetic,
        }
    }

    pub fn paired_with(mut self, twin: ArcIndex) -> Self {
        self.twin = Some(twin);
        self
    }

    pub(crate) fn mark_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    #[inline]
    pub fn tail(&self) -> NodeIndex {
        self.tail
    }

    #[inline]
    pub fn head(&self) -> NodeIndex {
        self.head
    }

    #[inline]
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    #[inline]
    pub fn flow(&self) -> Flow {
        self.flow
    }

    #[inline]
    pub fn twin(&self) -> Option<ArcIndex> {
        self.twin
    }

    #[inline]
    pub fn is_residual(&self) -> bool {
        self.residual
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Forward capacity still available: `capacity - flow`
    #[inline]
    pub fn remaining(&self) -> Capacity {
        self.capacity.minus(self.flow)
    }

    /// Never true for unbounded arcs
    #[inline]
    pub fn is_full(&self) -> bool {
        self.remaining() == Capacity::ZERO
    }

    pub(crate) fn set_capacity(&mut self, capacity: Capacity) {
        self.capacity = capacity;
    }

    pub(crate) fn set_flow(&mut self, flow: Flow) {
        self.flow = flow;
    }

    /// Cap capacity at the current flow so nothing more can pass
    pub(crate) fn close(&mut self) {
        self.capacity = Capacity::Finite(self.flow.max(0));
    }

    pub(crate) fn clear_flow(&mut self) {
        self.flow = 0;
    }
}
