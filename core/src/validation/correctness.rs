//! Flow correctness verification
//!
//! Checks the structural invariants every network maintains (twin pairing,
//! capacity respect, residual symmetry) and flow conservation at interior
//! nodes. Also answers whether an augmenting path remains, which after a
//! solve certifies optimality.

use std::collections::VecDeque;

use thiserror::Error;

use crate::algorithm::traits::NodeId;
use crate::data_structures::arc::{ArcIndex, Capacity, Flow, NodeIndex};
use crate::data_structures::flow_network::FlowNetwork;

/// Invariant violations detected in a flow network
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Arc {arc} has no residual twin")]
    UnpairedArc { arc: usize },

    #[error("Arc {arc} and its twin {twin} do not point back at each other")]
    TwinMismatch { arc: usize, twin: usize },

    #[error("Arc {arc} references node {node} outside the network")]
    DanglingNode { arc: usize, node: usize },

    #[error("Arc {arc} carries flow {flow} outside capacity {capacity}")]
    CapacityViolated {
        arc: usize,
        flow: Flow,
        capacity: Capacity,
    },

    #[error("Arc {arc} carries flow {flow} but its twin carries {twin_flow}")]
    AsymmetricResidual {
        arc: usize,
        flow: Flow,
        twin_flow: Flow,
    },

    #[error("Node {node} receives {inflow} but emits {outflow}")]
    ConservationBroken {
        node: usize,
        inflow: Flow,
        outflow: Flow,
    },
}

/// Verify twin pairing, capacity respect and residual symmetry on every arc
pub fn check_structure<N: NodeId>(network: &FlowNetwork<N>) -> Result<(), InvariantViolation> {
    let slots = network.node_slots();

    for (ArcIndex(position), arc) in network.arcs() {
        for node in [arc.tail(), arc.head()] {
            if node.0 >= slots {
                return Err(InvariantViolation::DanglingNode { arc: position, node: node.0 });
            }
        }

        let twin_index = arc
            .twin()
            .ok_or(InvariantViolation::UnpairedArc { arc: position })?;
        let twin = network
            .arc(twin_index)
            .ok_or(InvariantViolation::UnpairedArc { arc: position })?;
        if twin.twin() != Some(ArcIndex(position)) || twin.tail() != arc.head() || twin.head() != arc.tail() {
            return Err(InvariantViolation::TwinMismatch { arc: position, twin: twin_index.0 });
        }

        if arc.flow() != -twin.flow() {
            return Err(InvariantViolation::AsymmetricResidual {
                arc: position,
                flow: arc.flow(),
                twin_flow: twin.flow(),
            });
        }

        if !arc.is_residual() {
            let within = arc.flow() >= 0 && Capacity::Finite(arc.flow()) <= arc.capacity();
            if !within {
                return Err(InvariantViolation::CapacityViolated {
                    arc: position,
                    flow: arc.flow(),
                    capacity: arc.capacity(),
                });
            }
        }
    }

    Ok(())
}

/// Verify that every node outside `exempt` has equal inflow and outflow.
///
/// Synthetic connector arcs count, so real sources fed by a super-source
/// balance as long as only the super terminals are exempt.
pub fn check_conservation<N: NodeId>(
    network: &FlowNetwork<N>,
    exempt: &[NodeIndex],
) -> Result<(), InvariantViolation> {
    let slots = network.node_slots();
    let mut inflow = vec![0 as Flow; slots];
    let mut outflow = vec![0 as Flow; slots];

    for (_, arc) in network.arcs().filter(|(_, arc)| !arc.is_residual()) {
        outflow[arc.tail().0] = outflow[arc.tail().0].saturating_add(arc.flow());
        inflow[arc.head().0] = inflow[arc.head().0].saturating_add(arc.flow());
    }

    for node in (0..slots).map(NodeIndex) {
        if exempt.contains(&node) {
            continue;
        }
        if inflow[node.0] != outflow[node.0] {
            return Err(InvariantViolation::ConservationBroken {
                node: node.0,
                inflow: inflow[node.0],
                outflow: outflow[node.0],
            });
        }
    }

    Ok(())
}

/// Structural invariants plus conservation at every node that is neither a
/// source, a sink nor a super terminal
pub fn check_invariants<N: NodeId>(network: &FlowNetwork<N>) -> Result<(), InvariantViolation> {
    check_structure(network)?;

    let mut exempt = network.source_indices();
    exempt.extend(network.sink_indices());
    if let Some((super_source, super_sink)) = network.super_terminals() {
        exempt.push(super_source);
        exempt.push(super_sink);
    }
    check_conservation(network, &exempt)
}

/// Whether `to` is reachable from `from` along arcs with remaining capacity
pub fn has_augmenting_path<N: NodeId>(network: &FlowNetwork<N>, from: NodeIndex, to: NodeIndex) -> bool {
    let slots = network.node_slots();
    if from.0 >= slots || to.0 >= slots {
        return false;
    }

    let mut visited = vec![false; slots];
    let mut queue = VecDeque::new();
    visited[from.0] = true;
    queue.push_back(from);

    while let Some(node) = queue.pop_front() {
        if node == to {
            return true;
        }
        for &index in network.out_arcs(node) {
            let arc = network.arc_at(index);
            if arc.remaining() > Capacity::ZERO && !visited[arc.head().0] {
                visited[arc.head().0] = true;
                queue.push_back(arc.head());
            }
        }
    }

    false
}
