//! Maximum flow via Dinic's blocking-flow algorithm
//!
//! Each phase builds a level graph by breadth-first search from the source
//! and then saturates it with repeated single-path depth-first augmentations
//! until no admissible path remains. Phases repeat until the sink becomes
//! unreachable in the residual graph.
//!
//! Networks with several sources or sinks are solved between a synthetic
//! super-source and super-sink joined to the real terminals by unbounded
//! connector arcs.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::VecDeque;

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{Algorithm, FlowError, NodeId};
use crate::config::{ResolvePolicy, SolverConfig};
use crate::data_structures::arc::{ArcIndex, Capacity, Flow, NodeIndex};
use crate::data_structures::flow_network::FlowNetwork;
use crate::validation::correctness::{check_conservation, check_structure};

/// BFS distance from the source; `None` when unreachable
type Level = Option<usize>;

/// Flow algorithm performance metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetrics {
    /// Level graphs built that reached the sink
    pub phases: usize,
    /// Single-path augmentations performed
    pub augmenting_paths: usize,
    /// Arcs examined during depth-first search
    pub arc_scans: usize,
}

/// Maximum flow result with solver metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxFlowResult {
    /// Flow added by this solve
    pub value: Flow,
    pub metrics: FlowMetrics,
}

/// Dinic maximum flow solver
#[derive(Debug, Clone, Default)]
pub struct MaxFlowSolver {
    config: SolverConfig,
    metrics: FlowMetrics,
}

impl MaxFlowSolver {
    /// Create new maximum flow solver with the given configuration
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            metrics: FlowMetrics::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Metrics of the most recent solve
    pub fn metrics(&self) -> &FlowMetrics {
        &self.metrics
    }

    /// Maximum flow between the network's sources and sinks.
    ///
    /// With exactly one source and one sink the solve runs between them
    /// directly; otherwise both roles are aggregated behind super terminals.
    pub fn max_flow<N: NodeId>(&mut self, network: &mut FlowNetwork<N>) -> Result<Flow, FlowError> {
        self.solve(network).map(|result| result.value)
    }

    /// Maximum flow from `source` to `sink`, ignoring role classification
    pub fn max_flow_between<N: NodeId>(
        &mut self,
        network: &mut FlowNetwork<N>,
        source: N,
        sink: N,
    ) -> Result<Flow, FlowError> {
        self.solve_between(network, source, sink)
            .map(|result| result.value)
    }

    pub fn solve<N: NodeId>(&mut self, network: &mut FlowNetwork<N>) -> Result<MaxFlowResult, FlowError> {
        let sources = network.source_indices();
        if sources.is_empty() {
            return Err(FlowError::NoSource);
        }
        let sinks = network.sink_indices();
        if sinks.is_empty() {
            return Err(FlowError::NoSink);
        }

        self.apply_resolve_policy(network)?;

        let (source, sink) = if sources.len() == 1 && sinks.len() == 1 {
            network.close_super_terminals();
            (sources[0], sinks[0])
        } else {
            debug!(
                "Aggregating {} sources and {} sinks",
                sources.len(),
                sinks.len()
            );
            network.sync_super_terminals()
        };

        self.run(network, source, sink)
    }

    pub fn solve_between<N: NodeId>(
        &mut self,
        network: &mut FlowNetwork<N>,
        source: N,
        sink: N,
    ) -> Result<MaxFlowResult, FlowError> {
        let source_index = network
            .index_of(&source)
            .ok_or_else(|| FlowError::UnknownNode(format!("{:?}", source)))?;
        let sink_index = network
            .index_of(&sink)
            .ok_or_else(|| FlowError::UnknownNode(format!("{:?}", sink)))?;

        self.apply_resolve_policy(network)?;
        network.close_super_terminals();
        self.run(network, source_index, sink_index)
    }

    fn apply_resolve_policy<N: NodeId>(&self, network: &mut FlowNetwork<N>) -> Result<(), FlowError> {
        if !network.has_flow() {
            return Ok(());
        }
        match self.config.resolve_policy {
            ResolvePolicy::Continue => Ok(()),
            ResolvePolicy::Reset => {
                warn!("Resetting flow left over from a previous solve");
                network.reset_flows();
                Ok(())
            }
            ResolvePolicy::Reject => Err(FlowError::AlreadySolved),
        }
    }

    fn run<N: NodeId>(
        &mut self,
        network: &mut FlowNetwork<N>,
        source: NodeIndex,
        sink: NodeIndex,
    ) -> Result<MaxFlowResult, FlowError> {
        if source == sink {
            let name = network
                .id_of(source)
                .map_or_else(|| "super terminal".to_string(), |id| format!("{:?}", id));
            return Err(FlowError::SourceIsSink(name));
        }

        self.metrics = FlowMetrics::default();
        let slots = network.node_slots();
        let mut levels: Vec<Level> = vec![None; slots];
        let mut total: Flow = 0;

        while self.assign_levels(network, source, sink, &mut levels) {
            self.metrics.phases += 1;

            let mut cursor = vec![0usize; slots];
            let mut phase_flow: Flow = 0;
            while let Some(pushed) = self.augment_once(network, source, sink, &levels, &mut cursor)? {
                phase_flow = phase_flow
                    .checked_add(pushed)
                    .ok_or(FlowError::FlowOverflow)?;
            }

            debug!(
                "Phase {}: sink at level {:?}, pushed {}",
                self.metrics.phases, levels[sink.0], phase_flow
            );
            total = total
                .checked_add(phase_flow)
                .ok_or(FlowError::FlowOverflow)?;
        }

        info!(
            "Maximum flow {} after {} phases and {} augmenting paths",
            total, self.metrics.phases, self.metrics.augmenting_paths
        );

        if self.config.verify_invariants {
            let mut exempt = vec![source, sink];
            if let Some((super_source, super_sink)) = network.super_terminals() {
                exempt.push(super_source);
                exempt.push(super_sink);
            }
            check_structure(network)?;
            check_conservation(network, &exempt)?;
        }

        Ok(MaxFlowResult {
            value: total,
            metrics: self.metrics.clone(),
        })
    }

    /// Breadth-first level assignment over arcs with remaining capacity.
    /// Returns whether the sink received a level.
    fn assign_levels<N: NodeId>(
        &self,
        network: &FlowNetwork<N>,
        source: NodeIndex,
        sink: NodeIndex,
        levels: &mut [Level],
    ) -> bool {
        levels.fill(None);
        levels[source.0] = Some(0);

        let mut queue = VecDeque::new();
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            let next = levels[node.0].map(|level| level + 1);
            for &index in network.out_arcs(node) {
                let arc = network.arc_at(index);
                if arc.remaining() > Capacity::ZERO && levels[arc.head().0].is_none() {
                    levels[arc.head().0] = next;
                    queue.push_back(arc.head());
                }
            }
        }

        levels[sink.0].is_some()
    }

    /// Find one admissible source-to-sink path and saturate its bottleneck
    fn augment_once<N: NodeId>(
        &mut self,
        network: &mut FlowNetwork<N>,
        source: NodeIndex,
        sink: NodeIndex,
        levels: &[Level],
        cursor: &mut [usize],
    ) -> Result<Option<Flow>, FlowError> {
        let mut path = Vec::new();
        if !self.find_path(network, source, sink, levels, cursor, &mut path) {
            return Ok(None);
        }

        let bottleneck = path
            .iter()
            .map(|&index| network.arc_at(index).remaining())
            .min()
            .unwrap_or(Capacity::Unbounded);
        let amount = bottleneck.finite().ok_or(FlowError::UnboundedFlow)?;

        for &index in &path {
            network.augment(index, amount)?;
        }

        self.metrics.augmenting_paths += 1;
        trace!("Augmented {} along a path of {} arcs", amount, path.len());
        Ok(Some(amount))
    }

    /// Depth-first search restricted to the level graph, driven by an
    /// explicit stack of `(node, scan position)` frames.
    ///
    /// Arcs are taken only when they have remaining capacity and advance
    /// exactly one level. With the current-arc pointer enabled, arcs that
    /// failed earlier in the phase are not scanned again.
    fn find_path<N: NodeId>(
        &mut self,
        network: &FlowNetwork<N>,
        source: NodeIndex,
        sink: NodeIndex,
        levels: &[Level],
        cursor: &mut [usize],
        path: &mut Vec<ArcIndex>,
    ) -> bool {
        let current_arc = self.config.current_arc;
        let start = |node: NodeIndex, cursor: &[usize]| if current_arc { cursor[node.0] } else { 0 };

        let mut stack = vec![(source, start(source, cursor))];

        while let Some(&(node, position)) = stack.last() {
            if node == sink {
                return true;
            }

            let arcs = network.out_arcs(node);
            if position >= arcs.len() {
                // dead end: drop the arc that led here and advance the parent
                stack.pop();
                path.pop();
                if let Some((parent, parent_position)) = stack.last_mut() {
                    *parent_position += 1;
                    cursor[parent.0] = *parent_position;
                }
                continue;
            }

            self.metrics.arc_scans += 1;
            let index = arcs[position];
            let arc = network.arc_at(index);
            let head = arc.head();
            let admissible = !arc.is_full()
                && matches!(
                    (levels[node.0], levels[head.0]),
                    (Some(level), Some(next)) if next == level + 1
                );

            if admissible {
                path.push(index);
                stack.push((head, start(head, cursor)));
            } else if let Some((_, top_position)) = stack.last_mut() {
                *top_position += 1;
                cursor[node.0] = *top_position;
            }
        }

        false
    }
}

impl Algorithm for MaxFlowSolver {
    fn name(&self) -> &'static str {
        "Dinic"
    }

    fn category(&self) -> &'static str {
        "max_flow"
    }

    fn description(&self) -> String {
        "Dinic's algorithm: BFS level graphs saturated by repeated DFS augmentations, \
         O(V^2 E) for integer capacities, with super-source/super-sink aggregation \
         for multi-terminal networks."
            .to_string()
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), FlowError> {
        let parse_bool = |value: &str| {
            value.parse::<bool>().map_err(|_| FlowError::InvalidParameter {
                name: name.to_string(),
                reason: "must be true or false".to_string(),
            })
        };

        match name {
            "resolve_policy" => {
                self.config.resolve_policy = value.parse()?;
                Ok(())
            }
            "current_arc" => {
                self.config.current_arc = parse_bool(value)?;
                Ok(())
            }
            "verify_invariants" => {
                self.config.verify_invariants = parse_bool(value)?;
                Ok(())
            }
            _ => Err(FlowError::InvalidParameter {
                name: name.to_string(),
                reason: "unknown parameter".to_string(),
            }),
        }
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "resolve_policy" => Some(self.config.resolve_policy.as_str().to_string()),
            "current_arc" => Some(self.config.current_arc.to_string()),
            "verify_invariants" => Some(self.config.verify_invariants.to_string()),
            _ => None,
        }
    }
}

/// Maximum flow with the default solver configuration
pub fn max_flow<N: NodeId>(network: &mut FlowNetwork<N>) -> Result<Flow, FlowError> {
    MaxFlowSolver::default().max_flow(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::correctness::{check_invariants, has_augmenting_path};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn verifying_solver() -> MaxFlowSolver {
        MaxFlowSolver::new(SolverConfig {
            verify_invariants: true,
            ..SolverConfig::default()
        })
    }

    fn single_terminal_network() -> FlowNetwork<i32> {
        let mut network = FlowNetwork::new();
        network
            .add_arcs(vec![
                (0, 1, 3),
                (0, 2, 7),
                (2, 1, 5),
                (1, 3, 3),
                (1, 4, 4),
                (2, 4, 3),
                (3, 4, 3),
                (3, 5, 2),
                (4, 5, 6),
            ])
            .unwrap();
        network
    }

    fn multi_terminal_network() -> FlowNetwork<i32> {
        let mut network = FlowNetwork::new();
        network
            .add_arcs(vec![
                (0, 3, 3),
                (1, 3, 2),
                (2, 4, 4),
                (3, 4, 3),
                (3, 5, 2),
                (4, 5, 3),
                (5, 6, 3),
                (5, 7, 2),
            ])
            .unwrap();
        network
    }

    #[test]
    fn test_single_source_single_sink() {
        init_logger();
        let mut network = single_terminal_network();
        assert_eq!(network.sources(), vec![0]);
        assert_eq!(network.sinks(), vec![5]);

        let mut solver = verifying_solver();
        assert_eq!(solver.max_flow(&mut network).unwrap(), 8);
        assert_eq!(network.flow_value(), 8);
        assert!(network.super_terminals().is_none());
        assert_eq!(check_invariants(&network), Ok(()));
    }

    #[test]
    fn test_two_node_network_and_resolve() {
        init_logger();
        let mut network = FlowNetwork::new();
        network.add_arc(0, 1, 10).unwrap();

        assert_eq!(max_flow(&mut network).unwrap(), 10);
        // continuing on a saturated network adds nothing
        assert_eq!(max_flow(&mut network).unwrap(), 0);
        assert_eq!(network.flow_value(), 10);
    }

    #[test]
    fn test_resolve_policies() {
        let mut network = FlowNetwork::new();
        network.add_arc(0, 1, 10).unwrap();
        max_flow(&mut network).unwrap();

        let mut reset = MaxFlowSolver::new(SolverConfig {
            resolve_policy: ResolvePolicy::Reset,
            ..SolverConfig::default()
        });
        assert_eq!(reset.max_flow(&mut network).unwrap(), 10);

        let mut reject = MaxFlowSolver::new(SolverConfig {
            resolve_policy: ResolvePolicy::Reject,
            ..SolverConfig::default()
        });
        assert!(matches!(
            reject.max_flow(&mut network),
            Err(FlowError::AlreadySolved)
        ));
        assert_eq!(network.flow_value(), 10);

        network.reset_flows();
        assert_eq!(reject.max_flow(&mut network).unwrap(), 10);
    }

    #[test]
    fn test_multi_source_multi_sink() {
        init_logger();
        let mut network = multi_terminal_network();
        assert_eq!(network.sources(), vec![0, 1, 2]);
        assert_eq!(network.sinks(), vec![6, 7]);

        let mut solver = verifying_solver();
        assert_eq!(solver.max_flow(&mut network).unwrap(), 5);
        assert_eq!(network.flow_value(), 5);
        assert!(network.super_terminals().is_some());
        assert_eq!(check_invariants(&network), Ok(()));

        // roles are unaffected by the synthetic terminals
        assert_eq!(network.sources(), vec![0, 1, 2]);
        assert_eq!(network.sinks(), vec![6, 7]);
        assert_eq!(network.node_count(), 8);
    }

    #[test]
    fn test_unreachable_sink_yields_zero() {
        let mut network = FlowNetwork::new();
        network.add_arcs(vec![(0, 1, 4), (2, 3, 4)]).unwrap();
        network.declare_source(0);
        network.declare_sink(3);

        assert_eq!(max_flow(&mut network).unwrap(), 0);
        assert!(!network.has_flow());

        let mut solver = MaxFlowSolver::default();
        assert_eq!(solver.max_flow_between(&mut network, 0, 3).unwrap(), 0);
        assert_eq!(solver.metrics().phases, 0);
    }

    #[test]
    fn test_zero_capacity_arc() {
        let mut network = FlowNetwork::new();
        network.add_arc(0, 1, 0).unwrap();
        assert!(network.is_source(&0));
        assert!(network.is_sink(&1));
        assert_eq!(max_flow(&mut network).unwrap(), 0);
    }

    #[test]
    fn test_missing_terminals() {
        let mut empty: FlowNetwork<u32> = FlowNetwork::new();
        assert!(matches!(max_flow(&mut empty), Err(FlowError::NoSource)));

        let mut cycle = FlowNetwork::new();
        cycle.add_arcs(vec![(0, 1, 1), (1, 0, 1)]).unwrap();
        assert!(matches!(max_flow(&mut cycle), Err(FlowError::NoSource)));

        cycle.declare_source(0);
        assert!(matches!(max_flow(&mut cycle), Err(FlowError::NoSink)));
    }

    #[test]
    fn test_explicit_terminals() {
        let mut network = single_terminal_network();
        let mut solver = MaxFlowSolver::default();

        assert_eq!(solver.max_flow_between(&mut network, 2, 4).unwrap(), 8);
        assert!(matches!(
            solver.max_flow_between(&mut network, 2, 99),
            Err(FlowError::UnknownNode(_))
        ));
        assert!(matches!(
            solver.max_flow_between(&mut network, 3, 3),
            Err(FlowError::SourceIsSink(_))
        ));
    }

    #[test]
    fn test_no_augmenting_path_remains() {
        let mut network = single_terminal_network();
        max_flow(&mut network).unwrap();

        let source = network.index_of(&0).unwrap();
        let sink = network.index_of(&5).unwrap();
        assert!(!has_augmenting_path(&network, source, sink));
    }

    #[test]
    fn test_residual_arcs_reroute_flow() {
        // phase one routes 0-1-2-3; phase two must cancel 1->2 via 4-2-1-5
        let mut network = FlowNetwork::new();
        network
            .add_arcs(vec![
                (0, 1, 1),
                (1, 2, 1),
                (2, 3, 1),
                (0, 4, 1),
                (4, 2, 1),
                (1, 5, 1),
                (5, 3, 1),
            ])
            .unwrap();

        let mut solver = verifying_solver();
        assert_eq!(solver.max_flow(&mut network).unwrap(), 2);
        assert_eq!(solver.metrics().phases, 2);
        assert_eq!(network.find_arc(&1, &2).unwrap().flow(), 0);
        assert_eq!(network.find_arc(&1, &5).unwrap().flow(), 1);
    }

    #[test]
    fn test_current_arc_does_not_change_result() {
        let mut with_pointer = single_terminal_network();
        let mut without_pointer = single_terminal_network();

        let mut fast = MaxFlowSolver::default();
        let mut plain = MaxFlowSolver::new(SolverConfig {
            current_arc: false,
            ..SolverConfig::default()
        });

        assert_eq!(fast.max_flow(&mut with_pointer).unwrap(), 8);
        assert_eq!(plain.max_flow(&mut without_pointer).unwrap(), 8);
        assert_eq!(fast.metrics().augmenting_paths, plain.metrics().augmenting_paths);
        assert!(fast.metrics().arc_scans <= plain.metrics().arc_scans);

        let flows = |network: &FlowNetwork<i32>| -> Vec<Flow> {
            network.arcs().map(|(_, arc)| arc.flow()).collect()
        };
        assert_eq!(flows(&with_pointer), flows(&without_pointer));
    }

    #[test]
    fn test_deterministic_total() {
        let mut first = multi_terminal_network();
        let mut second = multi_terminal_network();
        assert_eq!(max_flow(&mut first).unwrap(), max_flow(&mut second).unwrap());
    }

    #[test]
    fn test_unbounded_arcs() {
        let mut network = FlowNetwork::new();
        network
            .add_arcs(vec![
                (0, 1, Capacity::Unbounded),
                (1, 2, Capacity::Finite(6)),
                (2, 3, Capacity::Unbounded),
            ])
            .unwrap();
        assert_eq!(max_flow(&mut network).unwrap(), 6);

        let mut open = FlowNetwork::new();
        open.add_arc(0, 1, Capacity::Unbounded).unwrap();
        assert!(matches!(max_flow(&mut open), Err(FlowError::UnboundedFlow)));
    }

    #[test]
    fn test_connectors_closed_for_single_terminal_resolve() {
        init_logger();
        let mut network = FlowNetwork::new();
        network.add_arcs(vec![(0, 2, 1), (1, 2, 1)]).unwrap();
        assert_eq!(max_flow(&mut network).unwrap(), 2);
        let (super_source, _) = network.super_terminals().unwrap();

        network.add_arcs(vec![(1, 3, 5), (3, 2, 5)]).unwrap();
        network.declare_source(0);
        network.declare_sink(2);

        // 0 -> 2 is saturated; node 1 must not start emitting new flow
        let mut solver = verifying_solver();
        assert_eq!(solver.max_flow(&mut network).unwrap(), 0);
        assert_eq!(network.flow_value(), 1);
        assert_eq!(network.find_arc(&1, &3).unwrap().flow(), 0);

        let connector_flows: Vec<Flow> = network
            .out_arcs(super_source)
            .iter()
            .map(|&arc| network.arc_at(arc).flow())
            .collect();
        assert_eq!(connector_flows, vec![1, 1]);
    }

    #[test]
    fn test_explicit_terminals_ignore_old_connectors() {
        let mut network = FlowNetwork::new();
        network.add_arcs(vec![(0, 2, 1), (1, 2, 1), (1, 3, 4)]).unwrap();
        network.declare_source(0);
        network.declare_source(1);
        network.declare_sink(2);
        assert_eq!(max_flow(&mut network).unwrap(), 2);

        // 0 may only reach 3 by borrowing the super-source's feed into 1
        let mut solver = verifying_solver();
        assert_eq!(solver.max_flow_between(&mut network, 0, 3).unwrap(), 0);
        assert_eq!(network.find_arc(&1, &3).unwrap().flow(), 0);
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let mut network = FlowNetwork::new();
        network
            .add_arcs(vec![
                (0, 1, i64::MAX),
                (0, 2, i64::MAX),
                (1, 3, i64::MAX),
                (2, 3, i64::MAX),
            ])
            .unwrap();

        assert!(matches!(
            max_flow(&mut network),
            Err(FlowError::FlowOverflow)
        ));
        assert_eq!(check_structure(&network), Ok(()));
        assert_eq!(network.flow_value(), i64::MAX);
    }

    #[test]
    fn test_long_chain_does_not_exhaust_stack() {
        const LENGTH: u32 = 200_000;
        let mut network = FlowNetwork::new();
        network
            .add_arcs((0..LENGTH).map(|node| (node, node + 1, 3)))
            .unwrap();

        let mut solver = MaxFlowSolver::default();
        assert_eq!(solver.max_flow(&mut network).unwrap(), 3);
        assert_eq!(solver.metrics().augmenting_paths, 1);
    }

    #[test]
    fn test_parameters() {
        let mut solver = MaxFlowSolver::default();
        assert_eq!(solver.name(), "Dinic");
        assert_eq!(solver.category(), "max_flow");

        assert!(solver.set_parameter("resolve_policy", "reset").is_ok());
        assert_eq!(solver.get_parameter("resolve_policy"), Some("reset".to_string()));
        assert!(solver.set_parameter("current_arc", "false").is_ok());
        assert_eq!(solver.get_parameter("current_arc"), Some("false".to_string()));
        assert!(!solver.config().current_arc);

        assert!(solver.set_parameter("verify_invariants", "sometimes").is_err());
        assert!(solver.set_parameter("resolve_policy", "undo").is_err());
        assert!(solver.set_parameter("global_relabel_frequency", "5").is_err());
        assert_eq!(solver.get_parameter("unknown"), None);
    }
}
