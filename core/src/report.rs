//! Read-only flow reporting
//!
//! Lists the caller's arcs with their final flow, skipping residual twins,
//! super-terminal connectors and arcs declared with zero capacity.

use std::fmt;

use serde::Serialize;

use crate::algorithm::traits::{FlowError, NodeId};
use crate::data_structures::arc::{Capacity, Flow};
use crate::data_structures::flow_network::FlowNetwork;

/// One reported arc
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArcFlow<N> {
    pub tail: N,
    pub head: N,
    pub flow: Flow,
    pub capacity: Capacity,
}

impl<N: NodeId> FlowNetwork<N> {
    /// Non-residual, non-synthetic arcs with non-zero capacity, in insertion
    /// order
    pub fn arc_flows(&self) -> impl Iterator<Item = ArcFlow<N>> + '_ {
        self.arcs()
            .map(|(_, arc)| arc)
            .filter(|arc| !arc.is_residual() && !arc.is_synthetic() && arc.capacity() != Capacity::ZERO)
            .filter_map(move |arc| {
                Some(ArcFlow {
                    tail: self.id_of(arc.tail())?,
                    head: self.id_of(arc.head())?,
                    flow: arc.flow(),
                    capacity: arc.capacity(),
                })
            })
    }
}

/// Snapshot of a network's flow assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReport<N> {
    pub arcs: Vec<ArcFlow<N>>,
    /// Net flow leaving the sources
    pub total: Flow,
}

impl<N: NodeId> FlowReport<N> {
    pub fn from_network(network: &FlowNetwork<N>) -> Self {
        Self {
            arcs: network.arc_flows().collect(),
            total: network.flow_value(),
        }
    }
}

impl<N: NodeId + Serialize> FlowReport<N> {
    pub fn to_json_pretty(&self) -> Result<String, FlowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<N: NodeId> fmt::Display for FlowReport<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for arc in &self.arcs {
            writeln!(f, "{:?} -> {:?}: {}/{}", arc.tail, arc.head, arc.flow, arc.capacity)?;
        }
        write!(f, "total flow: {}", self.total)
    }
}
