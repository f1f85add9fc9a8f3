//! FLOWNET core: maximum flow over directed capacitated networks
//!
//! Build a [`FlowNetwork`] with [`FlowNetwork::add_arc`], then run
//! [`max_flow`] (or a configured [`MaxFlowSolver`]). The solver writes the
//! final flow assignment into the network's arcs and returns the flow value.
//!
//! ```
//! use flownet_core::{max_flow, FlowNetwork};
//!
//! let mut network = FlowNetwork::new();
//! network.add_arcs(vec![(0, 1, 3), (1, 2, 2), (0, 2, 1)]).unwrap();
//! assert_eq!(max_flow(&mut network).unwrap(), 3);
//! ```

pub mod algorithm;
pub mod config;
pub mod data_structures;
pub mod report;
pub mod validation;

pub use crate::algorithm::graph::{max_flow, min_cut, min_cut_from, FlowMetrics, MaxFlowResult, MaxFlowSolver, MinCut};
pub use crate::algorithm::traits::{Algorithm, FlowError, NodeId};
pub use crate::config::{DuplicateArcPolicy, NetworkConfig, ResolvePolicy, SolverConfig};
pub use crate::data_structures::arc::{ArcIndex, Capacity, Flow, FlowArc, NodeIndex};
pub use crate::data_structures::flow_network::{FlowNetwork, NodeLabel};
pub use crate::report::{ArcFlow, FlowReport};
pub use crate::validation::correctness::InvariantViolation;
