//! Flow network with arena-allocated nodes and paired residual arcs
//!
//! Nodes are created lazily the first time an identifier is mentioned and
//! are addressed internally by [`NodeIndex`]. Every call to
//! [`FlowNetwork::add_arc`] produces a forward arc at an even arena position
//! and its zero-capacity residual twin right after it.
//!
//! Source and sink roles are derived from arc structure, independent of
//! insertion order: a node is a source when it has outgoing arcs and no
//! incoming ones, and a sink in the symmetric case. Explicit declarations
//! replace inference for the role they declare.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::algorithm::traits::{FlowError, NodeId};
use crate::config::{DuplicateArcPolicy, NetworkConfig};
use crate::data_structures::arc::{ArcIndex, Capacity, Flow, FlowArc, NodeIndex};

/// What an arena slot stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLabel<N> {
    /// Caller-supplied node
    Real(N),
    /// Synthetic node feeding every source
    SuperSource,
    /// Synthetic node drained by every sink
    SuperSink,
}

#[derive(Debug, Clone)]
struct NodeEntry<N> {
    label: NodeLabel<N>,
    /// Outgoing arcs, residual twins included, in insertion order
    arcs: Vec<ArcIndex>,
    /// Non-residual, non-synthetic arcs entering this node
    in_degree: usize,
    /// Non-residual, non-synthetic arcs leaving this node
    out_degree: usize,
}

impl<N> NodeEntry<N> {
    fn new(label: NodeLabel<N>) -> Self {
        Self {
            label,
            arcs: Vec::new(),
            in_degree: 0,
            out_degree: 0,
        }
    }
}

/// Directed capacitated network owning all nodes and arcs
#[derive(Debug, Clone)]
pub struct FlowNetwork<N> {
    config: NetworkConfig,
    nodes: Vec<NodeEntry<N>>,
    index: HashMap<N, NodeIndex>,
    arcs: Vec<FlowArc>,
    /// Forward arc per ordered node pair
    forward: HashMap<(NodeIndex, NodeIndex), ArcIndex>,
    declared_sources: HashSet<NodeIndex>,
    declared_sinks: HashSet<NodeIndex>,
    super_terminals: Option<(NodeIndex, NodeIndex)>,
}

impl<N: NodeId> Default for FlowNetwork<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeId> FlowNetwork<N> {
    /// Create an empty network with the default configuration
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            arcs: Vec::new(),
            forward: HashMap::new(),
            declared_sources: HashSet::new(),
            declared_sinks: HashSet::new(),
            super_terminals: None,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Add an arc `tail -> head` together with its residual twin.
    ///
    /// A second arc between the same ordered pair is merged or rejected
    /// according to [`NetworkConfig::duplicate_arcs`]; merging sums the
    /// capacities and keeps the flow already carried.
    pub fn add_arc(
        &mut self,
        tail: N,
        head: N,
        capacity: impl Into<Capacity>,
    ) -> Result<ArcIndex, FlowError> {
        let capacity = capacity.into();
        if let Capacity::Finite(amount) = capacity {
            if amount < 0 {
                return Err(FlowError::NegativeCapacity {
                    tail: format!("{:?}", tail),
                    head: format!("{:?}", head),
                    capacity: amount,
                });
            }
        }

        let tail_index = self.ensure_node(tail);
        let head_index = self.ensure_node(head);

        if let Some(&existing) = self.forward.get(&(tail_index, head_index)) {
            return match self.config.duplicate_arcs {
                DuplicateArcPolicy::Merge => {
                    let arc = &mut self.arcs[existing.0];
                    let merged = arc.capacity() + capacity;
                    arc.set_capacity(merged);
                    debug!("Merged duplicate arc {:?} -> {:?}, capacity now {}", tail, head, merged);
                    Ok(existing)
                }
                DuplicateArcPolicy::Reject => Err(FlowError::DuplicateArc {
                    tail: format!("{:?}", tail),
                    head: format!("{:?}", head),
                }),
            };
        }

        let index = self.push_pair(tail_index, head_index, capacity, false);
        self.nodes[tail_index.0].out_degree += 1;
        self.nodes[head_index.0].in_degree += 1;
        Ok(index)
    }

    /// Add every `(tail, head, capacity)` triple in order
    pub fn add_arcs<I, C>(&mut self, arcs: I) -> Result<(), FlowError>
    where
        I: IntoIterator<Item = (N, N, C)>,
        C: Into<Capacity>,
    {
        for (tail, head, capacity) in arcs {
            self.add_arc(tail, head, capacity)?;
        }
        Ok(())
    }

    /// Declare `id` a source. Once any source is declared, inference no
    /// longer applies to the source role.
    pub fn declare_source(&mut self, id: N) {
        let node = self.ensure_node(id);
        self.declared_sources.insert(node);
    }

    /// Declare `id` a sink. Once any sink is declared, inference no longer
    /// applies to the sink role.
    pub fn declare_sink(&mut self, id: N) {
        let node = self.ensure_node(id);
        self.declared_sinks.insert(node);
    }

    /// O(1) lookup
    pub fn is_source(&self, id: &N) -> bool {
        self.index
            .get(id)
            .map_or(false, |&node| self.is_source_index(node))
    }

    /// O(1) lookup
    pub fn is_sink(&self, id: &N) -> bool {
        self.index
            .get(id)
            .map_or(false, |&node| self.is_sink_index(node))
    }

    /// Current sources in node creation order
    pub fn sources(&self) -> Vec<N> {
        self.source_indices()
            .into_iter()
            .filter_map(|node| self.id_of(node))
            .collect()
    }

    /// Current sinks in node creation order
    pub fn sinks(&self) -> Vec<N> {
        self.sink_indices()
            .into_iter()
            .filter_map(|node| self.id_of(node))
            .collect()
    }

    /// Caller-supplied node identifiers in creation order
    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.nodes.iter().filter_map(|entry| match entry.label {
            NodeLabel::Real(id) => Some(id),
            _ => None,
        })
    }

    pub fn contains(&self, id: &N) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &N) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Caller identifier of an arena node; `None` for super terminals
    pub fn id_of(&self, node: NodeIndex) -> Option<N> {
        match self.nodes.get(node.0)?.label {
            NodeLabel::Real(id) => Some(id),
            _ => None,
        }
    }

    pub fn label(&self, node: NodeIndex) -> Option<NodeLabel<N>> {
        self.nodes.get(node.0).map(|entry| entry.label)
    }

    /// Outgoing arcs of `id`, residual arcs included, in insertion order.
    /// Empty for unknown identifiers.
    pub fn neighbors(&self, id: &N) -> impl Iterator<Item = (ArcIndex, &FlowArc)> + '_ {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |node| self.nodes[node.0].arcs.iter())
            .map(move |&arc| (arc, &self.arcs[arc.0]))
    }

    pub fn arc(&self, index: ArcIndex) -> Option<&FlowArc> {
        self.arcs.get(index.0)
    }

    /// Forward arc between two caller nodes
    pub fn find_arc(&self, tail: &N, head: &N) -> Option<&FlowArc> {
        let tail = self.index.get(tail)?;
        let head = self.index.get(head)?;
        self.forward
            .get(&(*tail, *head))
            .map(|index| &self.arcs[index.0])
    }

    pub fn remaining(&self, index: ArcIndex) -> Option<Capacity> {
        self.arcs.get(index.0).map(FlowArc::remaining)
    }

    /// Every arc in arena order, residual and synthetic arcs included
    pub fn arcs(&self) -> impl Iterator<Item = (ArcIndex, &FlowArc)> + '_ {
        self.arcs
            .iter()
            .enumerate()
            .map(|(position, arc)| (ArcIndex(position), arc))
    }

    /// Push `amount` units through arc `index`, adjusting its twin in the
    /// same step. Nothing is modified when the precondition fails.
    pub fn augment(&mut self, index: ArcIndex, amount: Flow) -> Result<(), FlowError> {
        let arc = self.arcs.get(index.0).ok_or(FlowError::UnknownArc(index.0))?;
        let twin = arc.twin().ok_or(FlowError::UnpairedArc(index.0))?;
        let remaining = arc.remaining();

        if amount < 0 || Capacity::Finite(amount) > remaining {
            return Err(FlowError::InvalidAugmentation {
                arc: index.0,
                amount,
                remaining,
            });
        }

        let flow = arc
            .flow()
            .checked_add(amount)
            .ok_or(FlowError::FlowOverflow)?;
        let twin_flow = self.arcs[twin.0]
            .flow()
            .checked_sub(amount)
            .ok_or(FlowError::FlowOverflow)?;

        self.arcs[index.0].set_flow(flow);
        self.arcs[twin.0].set_flow(twin_flow);
        Ok(())
    }

    /// Zero the flow on every arc
    pub fn reset_flows(&mut self) {
        for arc in &mut self.arcs {
            arc.clear_flow();
        }
    }

    pub fn has_flow(&self) -> bool {
        self.arcs.iter().any(|arc| arc.flow() != 0)
    }

    /// Number of caller-supplied nodes
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Number of caller-supplied arcs, residual twins excluded
    pub fn arc_count(&self) -> usize {
        self.forward.len() - self.synthetic_arc_count()
    }

    /// Flow leaving `node` minus flow entering it, synthetic arcs excluded
    pub fn net_outflow(&self, node: NodeIndex) -> Flow {
        self.nodes.get(node.0).map_or(0, |entry| {
            entry
                .arcs
                .iter()
                .map(|arc| &self.arcs[arc.0])
                .filter(|arc| !arc.is_synthetic())
                .map(FlowArc::flow)
                .fold(0, Flow::saturating_add)
        })
    }

    /// Total net flow leaving the current sources
    pub fn flow_value(&self) -> Flow {
        self.source_indices()
            .into_iter()
            .map(|node| self.net_outflow(node))
            .fold(0, Flow::saturating_add)
    }

    pub fn super_terminals(&self) -> Option<(NodeIndex, NodeIndex)> {
        self.super_terminals
    }

    pub(crate) fn node_slots(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn out_arcs(&self, node: NodeIndex) -> &[ArcIndex] {
        &self.nodes[node.0].arcs
    }

    pub(crate) fn arc_at(&self, index: ArcIndex) -> &FlowArc {
        &self.arcs[index.0]
    }

    pub(crate) fn is_source_index(&self, node: NodeIndex) -> bool {
        let entry = &self.nodes[node.0];
        if !matches!(entry.label, NodeLabel::Real(_)) {
            return false;
        }
        if self.declared_sources.is_empty() {
            entry.out_degree > 0 && entry.in_degree == 0
        } else {
            self.declared_sources.contains(&node)
        }
    }

    pub(crate) fn is_sink_index(&self, node: NodeIndex) -> bool {
        let entry = &self.nodes[node.0];
        if !matches!(entry.label, NodeLabel::Real(_)) {
            return false;
        }
        if self.declared_sinks.is_empty() {
            entry.in_degree > 0 && entry.out_degree == 0
        } else {
            self.declared_sinks.contains(&node)
        }
    }

    pub(crate) fn source_indices(&self) -> Vec<NodeIndex> {
        (0..self.nodes.len())
            .map(NodeIndex)
            .filter(|&node| self.is_source_index(node))
            .collect()
    }

    pub(crate) fn sink_indices(&self) -> Vec<NodeIndex> {
        (0..self.nodes.len())
            .map(NodeIndex)
            .filter(|&node| self.is_sink_index(node))
            .collect()
    }

    /// Create the super-source and super-sink on first use and bring their
    /// connectors in line with the current roles.
    ///
    /// Connectors are never removed. A connector whose endpoint lost its role
    /// is closed by capping its capacity at the flow it already carries, and
    /// reopened to unbounded if the role comes back.
    pub(crate) fn sync_super_terminals(&mut self) -> (NodeIndex, NodeIndex) {
        let (super_source, super_sink) = match self.super_terminals {
            Some(pair) => pair,
            None => {
                let pair = (
                    self.push_node(NodeLabel::SuperSource),
                    self.push_node(NodeLabel::SuperSink),
                );
                warn!("Introducing super-source and super-sink to aggregate terminals");
                self.super_terminals = Some(pair);
                pair
            }
        };

        for source in self.source_indices() {
            if !self.forward.contains_key(&(super_source, source)) {
                self.push_pair(super_source, source, Capacity::Unbounded, true);
            }
        }
        for sink in self.sink_indices() {
            if !self.forward.contains_key(&(sink, super_sink)) {
                self.push_pair(sink, super_sink, Capacity::Unbounded, true);
            }
        }

        let connectors: Vec<(ArcIndex, bool)> = self
            .forward
            .iter()
            .filter_map(|(&(tail, head), &arc)| {
                if tail == super_source {
                    Some((arc, self.is_source_index(head)))
                } else if head == super_sink {
                    Some((arc, self.is_sink_index(tail)))
                } else {
                    None
                }
            })
            .collect();

        for (connector, active) in connectors {
            let arc = &mut self.arcs[connector.0];
            if active {
                arc.set_capacity(Capacity::Unbounded);
            } else {
                arc.close();
            }
        }

        (super_source, super_sink)
    }

    /// Cap every super-terminal connector at the flow it carries, so a solve
    /// between real terminals cannot route new flow through them.
    pub(crate) fn close_super_terminals(&mut self) {
        if self.super_terminals.is_none() {
            return;
        }
        for arc in self.arcs.iter_mut() {
            if arc.is_synthetic() && !arc.is_residual() {
                arc.close();
            }
        }
    }

    fn ensure_node(&mut self, id: N) -> NodeIndex {
        if let Some(&node) = self.index.get(&id) {
            return node;
        }
        let node = self.push_node(NodeLabel::Real(id));
        self.index.insert(id, node);
        node
    }

    fn push_node(&mut self, label: NodeLabel<N>) -> NodeIndex {
        let node = NodeIndex(self.nodes.len());
        self.nodes.push(NodeEntry::new(label));
        node
    }

    fn push_pair(
        &mut self,
        tail: NodeIndex,
        head: NodeIndex,
        capacity: Capacity,
        synthetic: bool,
    ) -> ArcIndex {
        let forward_index = ArcIndex(self.arcs.len());
        let residual_index = ArcIndex(forward_index.0 + 1);

        let mut forward = FlowArc::new(tail, head, capacity).paired_with(residual_index);
        if synthetic {
            forward = forward.mark_synthetic();
        }
        let residual = FlowArc::residual_of(&forward, forward_index);

        self.nodes[tail.0].arcs.push(forward_index);
        self.nodes[head.0].arcs.push(residual_index);
        self.arcs.push(forward);
        self.arcs.push(residual);
        self.forward.insert((tail, head), forward_index);
        forward_index
    }

    fn synthetic_arc_count(&self) -> usize {
        self.forward
            .values()
            .filter(|arc| self.arcs[arc.0].is_synthetic())
            .count()
    }
}
