//! Minimum cut extraction from a solved network
//!
//! After a maximum flow has been computed, the nodes still reachable from
//! the sources through arcs with remaining capacity form the source side of
//! a minimum cut. The saturated arcs leaving that side are the cut arcs, and
//! their capacities sum to the flow value.

use std::collections::VecDeque;

use serde::Serialize;

use crate::algorithm::traits::{FlowError, NodeId};
use crate::data_structures::arc::{Capacity, NodeIndex};
use crate::data_structures::flow_network::FlowNetwork;

/// Source/sink partition and the arcs crossing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinCut<N> {
    pub source_side: Vec<N>,
    pub sink_side: Vec<N>,
    /// Caller arcs from the source side to the sink side
    pub cut_arcs: Vec<(N, N)>,
    pub capacity: Capacity,
}

/// Minimum cut seeded from every current source (and the super-source when
/// one exists)
pub fn min_cut<N: NodeId>(network: &FlowNetwork<N>) -> Result<MinCut<N>, FlowError> {
    let mut seeds = network.source_indices();
    if seeds.is_empty() {
        return Err(FlowError::NoSource);
    }
    if let Some((super_source, _)) = network.super_terminals() {
        seeds.push(super_source);
    }
    Ok(partition(network, &seeds))
}

/// Minimum cut seeded from a single node, for solves run between explicit
/// terminals
pub fn min_cut_from<N: NodeId>(network: &FlowNetwork<N>, source: N) -> Result<MinCut<N>, FlowError> {
    let seed = network
        .index_of(&source)
        .ok_or_else(|| FlowError::UnknownNode(format!("{:?}", source)))?;
    Ok(partition(network, &[seed]))
}

fn partition<N: NodeId>(network: &FlowNetwork<N>, seeds: &[NodeIndex]) -> MinCut<N> {
    let mut reachable = vec![false; network.node_slots()];
    let mut queue: VecDeque<NodeIndex> = seeds.iter().copied().collect();
    for seed in seeds {
        reachable[seed.0] = true;
    }

    while let Some(node) = queue.pop_front() {
        for &index in network.out_arcs(node) {
            let arc = network.arc_at(index);
            if arc.remaining() > Capacity::ZERO && !reachable[arc.head().0] {
                reachable[arc.head().0] = true;
                queue.push_back(arc.head());
            }
        }
    }

    let mut source_side = Vec::new();
    let mut sink_side = Vec::new();
    for (position, &on_source_side) in reachable.iter().enumerate() {
        if let Some(id) = network.id_of(NodeIndex(position)) {
            if on_source_side {
                source_side.push(id);
            } else {
                sink_side.push(id);
            }
        }
    }

    let mut cut_arcs = Vec::new();
    let mut capacity = Capacity::ZERO;
    for (_, arc) in network.arcs() {
        if arc.is_residual() || arc.is_synthetic() {
            continue;
        }
        if reachable[arc.tail().0] && !reachable[arc.head().0] {
            if let (Some(tail), Some(head)) = (network.id_of(arc.tail()), network.id_of(arc.head())) {
                cut_arcs.push((tail, head));
                capacity = capacity + arc.capacity();
            }
        }
    }

    MinCut {
        source_side,
        sink_side,
        cut_arcs,
        capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::graph::max_flow::{max_flow, MaxFlowSolver};

    #[test]
    fn test_cut_capacity_matches_flow() {
        let mut network = FlowNetwork::new();
        network
            .add_arcs(vec![(0, 1, 3), (0, 2, 2), (1, 2, 1), (1, 3, 1), (2, 3, 4)])
            .unwrap();
        let value = max_flow(&mut network).unwrap();
        let cut = min_cut(&network).unwrap();

        assert_eq!(value, 4);
        assert_eq!(cut.capacity, Capacity::Finite(value));
        assert_eq!(cut.source_side, vec![0, 1]);
        assert_eq!(cut.sink_side, vec![2, 3]);
        assert_eq!(cut.cut_arcs, vec![(0, 2), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_cut_across_super_terminals() {
        let mut network = FlowNetwork::new();
        network
            .add_arcs(vec![(0, 2, 4), (1, 2, 4), (2, 3, 5), (2, 4, 1)])
            .unwrap();
        let value = max_flow(&mut network).unwrap();
        let cut = min_cut(&network).unwrap();

        assert_eq!(value, 6);
        assert_eq!(cut.capacity, Capacity::Finite(6));
        assert_eq!(cut.sink_side, vec![3, 4]);
    }

    #[test]
    fn test_cut_from_explicit_source() {
        let mut network = FlowNetwork::new();
        network.add_arcs(vec![("a", "b", 2), ("b", "c", 1)]).unwrap();
        MaxFlowSolver::default()
            .max_flow_between(&mut network, "a", "c")
            .unwrap();

        let cut = min_cut_from(&network, "a").unwrap();
        assert_eq!(cut.cut_arcs, vec![("b", "c")]);
        assert_eq!(cut.capacity, Capacity::Finite(1));
        assert!(min_cut_from(&network, "z").is_err());
    }

    #[test]
    fn test_cut_requires_source() {
        let network: FlowNetwork<u8> = FlowNetwork::new();
        assert!(matches!(min_cut(&network), Err(FlowError::NoSource)));
    }
}
